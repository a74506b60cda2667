use crate::error::ParameterError;
use url::form_urlencoded;

const DEFAULT_WIDTH: i64 = 1080;
const DEFAULT_HEIGHT: i64 = 1080;
const DEFAULT_QUALITY: i64 = 80;

/// Bounding box and encode quality requested through `w`, `h` and `q`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformSpec {
    pub width: i64,
    pub height: i64,
    pub quality: i64,
}

impl Default for TransformSpec {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            quality: DEFAULT_QUALITY,
        }
    }
}

impl TransformSpec {
    /// Extract a spec from a raw query string.
    ///
    /// The whole string is lowercased first so `W=200` and `w=200` are the same
    /// parameter. Only the first non-empty value of a key counts. Values are not
    /// range checked here.
    pub fn from_query(query: &str) -> Result<Self, ParameterError> {
        let query = query.to_lowercase();

        let mut width = None;
        let mut height = None;
        let mut quality = None;

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            if value.is_empty() {
                continue;
            }
            let slot = match &*key {
                "w" => &mut width,
                "h" => &mut height,
                "q" => &mut quality,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }

        Ok(Self {
            width: parse_int("w", width, DEFAULT_WIDTH)?,
            height: parse_int("h", height, DEFAULT_HEIGHT)?,
            quality: parse_int("q", quality, DEFAULT_QUALITY)?,
        })
    }
}

fn parse_int(key: &'static str, raw: Option<String>, default: i64) -> Result<i64, ParameterError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<i64>()
            .map_err(|_| ParameterError { key, value }),
    }
}
