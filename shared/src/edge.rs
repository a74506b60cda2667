//! Lambda@Edge origin-response envelope.
//!
//! Only the fields the handler reads or writes are typed. Everything else
//! CloudFront sends is kept in `extra` and serialized back unchanged, so a
//! passthrough returns exactly what came in.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CloudFrontEvent {
    #[serde(rename = "Records")]
    pub records: Vec<CloudFrontRecord>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CloudFrontRecord {
    pub cf: CloudFrontPayload,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CloudFrontPayload {
    pub request: CloudFrontRequest,
    pub response: CloudFrontResponse,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CloudFrontRequest {
    pub uri: String,
    #[serde(default)]
    pub querystring: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Header values keyed by lowercase header name, as CloudFront sends them.
pub type Headers = BTreeMap<String, Vec<HeaderEntry>>;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct HeaderEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub value: String,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BodyEncoding {
    Text,
    Base64,
}

/// Response status exactly as CloudFront sent it.
///
/// The wire format uses a string, but a bare number is tolerated and written
/// back as a number.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Status {
    Text(String),
    Number(Number),
}

impl Status {
    pub fn code(&self) -> Option<u16> {
        match self {
            Status::Text(text) => text.trim().parse().ok(),
            Status::Number(number) => number.as_u64().and_then(|n| u16::try_from(n).ok()),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Text(text) => f.write_str(text),
            Status::Number(number) => write!(f, "{}", number),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CloudFrontResponse {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Headers>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_encoding: Option<BodyEncoding>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CloudFrontResponse {
    /// Numeric status, if the status field holds one.
    pub fn status_code(&self) -> Option<u16> {
        self.status.code()
    }
}
