use clap::Args;

/// Parameters used to config MongoDB.
#[derive(Debug, Clone, Args)]
pub struct MongoDBCliArgs {
    /// The connection string to the MongoDB server.
    #[arg(env = "QUIZ_GRADER_MONGODB_CONNECTION_URL", long, default_value = "mongodb://localhost:27017")]
    pub mongodb_connection_url: Option<String>,

    /// The name of the database holding quizzes and grading results.
    #[arg(env = "QUIZ_GRADER_DATABASE_NAME", long, default_value = "quiz")]
    pub mongodb_database_name: Option<String>,
}
