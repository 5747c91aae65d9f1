//! Answer and source type definitions

use serde::{Deserialize, Serialize};
use url::Url;

/// A single supporting source returned alongside an answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Rank assigned by the service, unique within one response
    pub position: u32,
    /// Title of the page
    pub title: String,
    /// Link to the page
    pub link: String,
    /// Text excerpt the answer was built from
    pub snippet: String,
    /// Publication date as reported by the service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl Source {
    /// Create a new source without a date
    pub fn new(
        position: u32,
        title: impl Into<String>,
        link: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            position,
            title: title.into(),
            link: link.into(),
            snippet: snippet.into(),
            date: None,
        }
    }

    /// Attach a publication date
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Host part of the link, if the link is a valid URL
    pub fn hostname(&self) -> Option<String> {
        Url::parse(&self.link)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
    }
}

/// A successful answer: generated text plus the sources behind it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Generated answer text
    pub answer: String,
    /// Sources in the order the service returned them
    pub sources: Vec<Source>,
}

impl Answer {
    pub fn new(answer: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            answer: answer.into(),
            sources,
        }
    }
}
