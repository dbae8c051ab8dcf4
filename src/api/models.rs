use std::fmt;

use serde::{Deserialize, Serialize};

/// Envelope of a `wall.get` reply. Exactly one of the fields is normally set.
#[derive(Debug, Clone, Deserialize)]
pub struct WallGetResponse {
    #[serde(default)]
    pub response: Option<WallItems>,
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WallItems {
    /// Total number of posts on the wall, as reported by the API.
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub items: Vec<RawPost>,
}

/// Error object returned in place of `response`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub error_code: i64,
    #[serde(default)]
    pub error_msg: String,
}

/// One wall item exactly as the API sends it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPost {
    pub id: PostId,
    pub date: i64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub attachments: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub likes: Option<OptionalCount>,
    pub comments: Count,
    #[serde(default)]
    pub reposts: Option<OptionalCount>,
}

/// Counter object whose `count` must be present.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Count {
    pub count: u64,
}

/// Counter object whose `count` defaults to zero.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct OptionalCount {
    #[serde(default)]
    pub count: u64,
}

/// Post identifier. The API sends integers, but strings are accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PostId {
    Int(i64),
    Text(String),
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for PostId {
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

impl From<&str> for PostId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_string())
    }
}
