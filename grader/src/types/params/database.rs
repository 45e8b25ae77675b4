use crate::cli::database::mongodb::MongoDBCliArgs;
use crate::GraderError;

/// Validated MongoDB parameters
#[derive(Debug, Clone)]
pub struct DatabaseArgs {
    pub connection_uri: String,
    pub database_name: String,
}

impl TryFrom<MongoDBCliArgs> for DatabaseArgs {
    type Error = GraderError;
    fn try_from(args: MongoDBCliArgs) -> Result<Self, Self::Error> {
        let connection_uri = args
            .mongodb_connection_url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| GraderError::ConfigError("MongoDB connection url is required".to_string()))?;
        let database_name = args
            .mongodb_database_name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| GraderError::ConfigError("MongoDB database name is required".to_string()))?;
        Ok(Self { connection_uri, database_name })
    }
}
