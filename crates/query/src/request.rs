use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::query::Query;

/// Search half of a streaming request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct QueryPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_text_search: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_search: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub indexes: Vec<String>,
    pub limit: usize,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub fields: Vec<String>,
}

impl QueryPayload {
    /// Route a composed query into its wire slot: semantic text goes to
    /// `semantic_search`, everything else to `full_text_search`.
    pub fn from_query(query: &Query, indexes: Vec<String>, limit: usize, fields: Vec<String>) -> Self {
        Self {
            full_text_search: query.full_text_value(),
            semantic_search: query.semantic_text().map(str::to_string),
            indexes,
            limit,
            fields,
        }
    }
}

/// Generation parameters forwarded to the answer service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: "default".to_string(),
            max_tokens: None,
            temperature: None,
        }
    }
}

/// Body for `POST {base_url}/{resource}` on the streaming answer endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRequest {
    pub query: QueryPayload,
    pub summarizer: GeneratorConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

/// One line of a non-streaming `POST {base_url}/query` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: QueryPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_query: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusion_query: Option<Value>,
}

/// Encode search requests as newline-delimited JSON, one request per line.
pub fn to_ndjson(requests: &[SearchRequest]) -> Result<String> {
    let mut body = String::new();
    for request in requests {
        body.push_str(&serde_json::to_string(request)?);
        body.push('\n');
    }
    Ok(body)
}
