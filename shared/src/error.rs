use thiserror::Error;

/// Why the object behind a request could not be read from storage.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("object {0} not found")]
    NotFound(String),

    #[error("access to object {0} denied")]
    AccessDenied(String),

    #[error("object key {0} is not valid after percent-decoding")]
    InvalidKey(String),

    #[error("storage request for {key} failed: {message}")]
    Storage { key: String, message: String },

    #[error("failed to read body of {key}: {message}")]
    BodyRead { key: String, message: String },
}

/// A transform parameter that is present but not an integer.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("query parameter {key}={value:?} is not an integer")]
pub struct ParameterError {
    pub key: &'static str,
    pub value: String,
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("could not read image header: {0}")]
    Read(#[from] std::io::Error),

    #[error("image format could not be determined")]
    UnknownFormat,

    #[error("bounding box {width}x{height} has a non-positive side")]
    InvalidBounds { width: i64, height: i64 },
}

/// The guard that sent an invocation down the passthrough path.
#[derive(Debug, Error)]
pub enum Passthrough {
    #[error("upstream status {0:?} is not 200")]
    UpstreamStatus(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("content type {0:?} is not a supported image type")]
    UnsupportedType(String),

    #[error(transparent)]
    Parameter(#[from] ParameterError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("transformed image is {size} bytes, over the {limit} byte limit")]
    SizeExceeded { size: usize, limit: usize },
}

/// The invocation envelope itself is unusable. The only error returned to the runtime.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("event carried no CloudFront records")]
    NoRecords,
}
