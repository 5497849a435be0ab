use crate::DynamoOpts;
use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region};

// Build a DynamoDB client from the ambient AWS configuration plus CLI overrides
pub async fn connect_to_dynamodb(opts: &DynamoOpts) -> aws_sdk_dynamodb::Client {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .retry_config(RetryConfig::standard().with_max_attempts(opts.max_attempts));

    if let Some(region) = &opts.region {
        loader = loader.region(Region::new(region.clone()));
    }
    if let Some(endpoint_url) = &opts.endpoint_url {
        tracing::info!("Using DynamoDB endpoint {}", endpoint_url);
        loader = loader.endpoint_url(endpoint_url);
    }

    let sdk_config = loader.load().await;
    aws_sdk_dynamodb::Client::new(&sdk_config)
}
