use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
}

/// A vector to be written into the collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub id: u64,
    pub payload: Map<String, Value>,
    pub vector: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScoredPoint {
    pub id: u64,
    pub score: f32,
    #[serde(default)]
    pub payload: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    pub vector: Vec<f32>,
    pub limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    pub with_payload: bool,
}

/// Conjunction of exact-match conditions on payload keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Filter {
    pub must: Vec<FieldCondition>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldCondition {
    pub key: String,
    #[serde(rename = "match")]
    pub matches: MatchValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchValue {
    pub value: Value,
}

impl Filter {
    pub fn must_match<K, V, I>(conditions: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            must: conditions
                .into_iter()
                .map(|(key, value)| FieldCondition {
                    key: key.into(),
                    matches: MatchValue {
                        value: value.into(),
                    },
                })
                .collect(),
        }
    }
}

/// A retrieved page as it is placed into the prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextbookPage {
    pub page_number: i64,
    pub word_count: usize,
    pub text: String,
}

/// One OCR'd page of the source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageText {
    pub page_number: u64,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct ExtractedPages {
    pub files: usize,
    pub skipped: usize,
    pub pages: Vec<PageText>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub files: usize,
    pub pages: usize,
    pub points: usize,
    pub skipped: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}
