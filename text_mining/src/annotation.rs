//! Request and response model of a wikifier-style annotation service
//!
//! Only the data model lives here: callers send the request with their own
//! HTTP client, then parse and rank the JSON they get back.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Endpoint of the public wikifier service
pub const DEFAULT_ENDPOINT: &str = "http://www.wikifier.org/annotate-article";

/// Parameters of an annotation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRequest {
    #[serde(rename = "userKey")]
    pub user_key: String,
    pub lang: String,
    pub text: String,
}

impl AnnotationRequest {
    pub fn new(
        user_key: impl Into<String>,
        lang: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            user_key: user_key.into(),
            lang: lang.into(),
            text: text.into(),
        }
    }

    /// Query parameters in the order the service documents them
    pub fn query_pairs(&self) -> [(&'static str, &str); 3] {
        [
            ("userKey", self.user_key.as_str()),
            ("lang", self.lang.as_str()),
            ("text", self.text.as_str()),
        ]
    }
}

/// One annotation; fields the model does not name are kept in `extra`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "pageRank", default)]
    pub page_rank: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response body of the annotation service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationResponse {
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnnotationResponse {
    /// Parse a JSON response body
    pub fn parse(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    /// Order annotations by descending page rank
    pub fn sort_by_relevance(&mut self) {
        self.annotations
            .sort_by(|a, b| b.page_rank.total_cmp(&a.page_rank));
    }

    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
