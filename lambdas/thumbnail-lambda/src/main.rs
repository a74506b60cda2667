use aws_config::Region;
use aws_sdk_s3::Client as S3Client;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use std::sync::Arc;
use thumbnail_shared::{CloudFrontEvent, CloudFrontResponse, EdgeHandler, HandlerConfig, S3ObjectStore};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .without_time()
        .init();

    let config = HandlerConfig::from_env();

    // Initialize the S3 client once at startup
    let sdk_config = aws_config::from_env()
        .region(Region::new(config.region.clone()))
        .load()
        .await;
    let store = S3ObjectStore::new(S3Client::new(&sdk_config), config.bucket.clone());

    tracing::info!("Thumbnail handler reading from bucket {}", store.bucket());

    let handler = EdgeHandler::new(store, config);

    run(service_fn(move |event: LambdaEvent<CloudFrontEvent>| {
        let handler = Arc::clone(&handler);
        async move { function_handler(event, handler).await }
    }))
    .await
}

async fn function_handler(
    event: LambdaEvent<CloudFrontEvent>,
    handler: Arc<EdgeHandler<S3ObjectStore>>,
) -> Result<CloudFrontResponse, Error> {
    tracing::debug!("Origin response received, request id {}", event.context.request_id);

    Ok(handler.handle_event(event.payload).await?)
}
