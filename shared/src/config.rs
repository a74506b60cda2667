use std::env;

/// Compiled-in bucket. Lambda@Edge replicas run without environment variables,
/// so the defaults below are what production actually uses.
const DEFAULT_BUCKET: &str = "taxijjang-sample-s3";
const DEFAULT_REGION: &str = "ap-northeast-2";

const BUCKET_ENV: &str = "IMAGE_BUCKET";
const REGION_ENV: &str = "IMAGE_BUCKET_REGION";

/// Largest transformed payload (before base64) that may replace the origin body.
pub const MAX_RESULT_BYTES: usize = 1024 * 1024;

/// Content types the handler will attempt to transform. Compared verbatim.
pub const SUPPORTED_CONTENT_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/jpg"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerConfig {
    pub bucket: String,
    pub region: String,
    pub max_result_bytes: usize,
    pub supported_content_types: Vec<String>,
}

impl HandlerConfig {
    /// Read overrides from the environment, keeping the compiled-in defaults otherwise.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Self {
            bucket: non_empty(BUCKET_ENV).unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            region: non_empty(REGION_ENV).unwrap_or_else(|| DEFAULT_REGION.to_string()),
            ..Self::default()
        }
    }

    pub fn is_supported_type(&self, content_type: &str) -> bool {
        self.supported_content_types.iter().any(|t| t == content_type)
    }
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            bucket: DEFAULT_BUCKET.to_string(),
            region: DEFAULT_REGION.to_string(),
            max_result_bytes: MAX_RESULT_BYTES,
            supported_content_types: SUPPORTED_CONTENT_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }
}
