//! Request and response bodies exchanged with the answer service

use super::types::{Answer, Source};
use crate::network::ClientError;
use serde::{Deserialize, Serialize};

/// Outbound request body: `{"query": "..."}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }
}

/// Body of a 2xx response.
///
/// Both fields are optional on the wire so that a body missing one of them
/// is reported as a malformed response rather than a decode failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    pub answer: Option<String>,
    pub results: Option<Vec<Source>>,
}

impl SearchResponse {
    /// Convert into an [`Answer`], keeping the sources in received order
    pub fn into_answer(self) -> Result<Answer, ClientError> {
        let answer = self
            .answer
            .ok_or_else(|| ClientError::MalformedResponse("missing field `answer`".to_string()))?;
        let sources = self
            .results
            .ok_or_else(|| ClientError::MalformedResponse("missing field `results`".to_string()))?;

        Ok(Answer { answer, sources })
    }
}

/// Body of a non-2xx response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorResponse {
    pub error: Option<String>,
}
