use crate::cli::provider::aws::AWSConfigCliArgs;
use crate::{GraderError, GraderResult};
use aws_config::{Region, SdkConfig};
use url::Url;

#[derive(Debug, Clone)]
pub struct AWSCredentials {
    pub region: Option<String>,
    pub endpoint_url: Option<Url>,
}

impl AWSCredentials {
    /// Loads the AWS configuration from the environment chain, applying the
    /// region and endpoint overrides when given.
    ///
    /// Fails when no region can be resolved. Credentials are resolved lazily by the
    /// SDK, so bad credentials surface at the queue health check during startup.
    pub async fn get_aws_config(&self) -> GraderResult<SdkConfig> {
        let mut loader = aws_config::from_env();
        if let Some(region) = &self.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint_url) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint_url.as_str());
        }
        let config = loader.load().await;

        if config.region().is_none() {
            return Err(GraderError::ConfigError(
                "No AWS region configured (QUIZ_GRADER_AWS_REGION or AWS_REGION)".to_string(),
            ));
        }
        Ok(config)
    }
}

impl From<AWSConfigCliArgs> for AWSCredentials {
    fn from(args: AWSConfigCliArgs) -> Self {
        Self { region: args.aws_region, endpoint_url: args.aws_endpoint_url }
    }
}
