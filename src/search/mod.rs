//! Stack Exchange search: request and result models, the remote search
//! service, and the cache-backed proxy that wraps it.
//!
//! Both [`StackExchange`] and [`CachedStackExchange`] implement [`Searchable`],
//! so callers pick one at startup and hold it as `Box<dyn Searchable>`.

pub mod cached;
pub mod request;
pub mod service;

pub use cached::CachedStackExchange;
pub use request::{BuildError, SearchRequest, SearchRequestBuilder, SortMethod};
pub use service::StackExchange;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Default Stack Exchange API root (version 2.3)
pub const DEFAULT_BASE_URL: &str = "https://api.stackexchange.com/2.3";

/// Errors surfaced by a search
#[derive(Debug, Error)]
pub enum SearchError {
    /// The API reported an error, or the HTTP layer failed
    #[error("Request failed to url: {url}\nResponse error message: {message}")]
    StackRequest { url: String, message: String },

    /// The search succeeded but matched nothing
    #[error("No search results found.")]
    ZeroSearchResults,

    /// A response item lacked a required field or had the wrong shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl SearchError {
    pub(crate) fn request(url: impl Into<String>, message: impl std::fmt::Display) -> Self {
        SearchError::StackRequest {
            url: url.into(),
            message: message.to_string(),
        }
    }
}

/// Anything that can answer a [`SearchRequest`] with paired results
#[async_trait]
pub trait Searchable: Send + Sync {
    /// Runs the search and returns question/answer pairs in relevance order
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>, SearchError>;

    /// API root the search endpoint hangs off, used to derive cache keys
    fn base_url(&self) -> &str {
        DEFAULT_BASE_URL
    }
}

#[async_trait]
impl<T: Searchable + ?Sized> Searchable for Box<T> {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>, SearchError> {
        (**self).search(request).await
    }

    fn base_url(&self) -> &str {
        (**self).base_url()
    }
}

/// A question returned by `/search/advanced`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Raw HTML body
    pub body: String,
    /// Net vote count, may be negative
    pub score: i64,
    /// Creation time in epoch seconds
    pub creation_date: i64,
    pub question_id: u64,
    pub title: String,
    /// Canonical URL of the question page
    pub link: String,
    /// Identifier of the accepted answer, if the asker accepted one
    #[serde(default)]
    pub accepted_answer_id: Option<u64>,
}

/// An answer returned by `/answers/{ids}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Raw HTML body
    pub body: String,
    pub score: i64,
    /// Creation time in epoch seconds
    pub creation_date: i64,
    pub answer_id: u64,
    pub is_accepted: bool,
}

impl Question {
    /// Maps one raw `items` entry, failing on any missing required field
    pub fn from_item(item: &Value) -> Result<Self, SearchError> {
        Question::deserialize(item)
            .map_err(|e| SearchError::MalformedResponse(format!("question item: {}", e)))
    }
}

impl Answer {
    /// Maps one raw `items` entry, failing on any missing required field
    pub fn from_item(item: &Value) -> Result<Self, SearchError> {
        Answer::deserialize(item)
            .map_err(|e| SearchError::MalformedResponse(format!("answer item: {}", e)))
    }
}

/// A question paired with its accepted answer
///
/// Serializes to `{"question": {...}, "answer": {...}}` with the flat field
/// mappings of each side. This is also the form stored in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub question: Question,
    pub answer: Answer,
}

impl SearchResult {
    pub fn new(question: Question, answer: Answer) -> Self {
        Self { question, answer }
    }

    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "question": self.question,
            "answer": self.answer,
        })
    }

    pub fn from_json(json: &Value) -> Result<Self, SearchError> {
        SearchResult::deserialize(json)
            .map_err(|e| SearchError::MalformedResponse(format!("search result: {}", e)))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn question(id: u64, accepted_answer_id: Option<u64>) -> Question {
        Question {
            body: format!("<p>Question body {}</p>", id),
            score: 10,
            creation_date: 1_280_129_043,
            question_id: id,
            title: format!("Question {}", id),
            link: format!("https://stackoverflow.com/questions/{}", id),
            accepted_answer_id,
        }
    }

    pub fn answer(id: u64) -> Answer {
        Answer {
            body: format!("<p>Answer body {}</p>", id),
            score: 5,
            creation_date: 1_280_129_566,
            answer_id: id,
            is_accepted: true,
        }
    }

    pub fn result(id: u64) -> SearchResult {
        SearchResult::new(question(id, Some(id)), answer(id))
    }
}
