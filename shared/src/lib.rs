pub mod config;
pub mod edge;
pub mod error;
pub mod handler;
pub mod image_processing;
pub mod params;
pub mod store;

pub use config::HandlerConfig;
pub use edge::{CloudFrontEvent, CloudFrontResponse};
pub use handler::EdgeHandler;
pub use store::{ObjectStore, S3ObjectStore};
