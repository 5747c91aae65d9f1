//! Submission lifecycle state

use crate::models::{Answer, Source};
use serde::Serialize;

/// The single authoritative description of where the current query is
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionState {
    #[default]
    Idle,
    Pending {
        query: String,
    },
    Succeeded {
        answer: String,
        sources: Vec<Source>,
    },
    Failed {
        message: String,
    },
}

impl SubmissionState {
    pub fn is_pending(&self) -> bool {
        matches!(self, SubmissionState::Pending { .. })
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, SubmissionState::Idle)
    }

    pub(crate) fn succeeded(answer: Answer) -> Self {
        SubmissionState::Succeeded {
            answer: answer.answer,
            sources: answer.sources,
        }
    }
}

/// Read-only view handed to the rendering layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Presentation {
    pub answer: Option<String>,
    pub sources: Vec<Source>,
    pub error: Option<String>,
    pub is_loading: bool,
    /// Query currently in flight
    pub query: Option<String>,
}

impl From<&SubmissionState> for Presentation {
    fn from(state: &SubmissionState) -> Self {
        match state {
            SubmissionState::Idle => Self::default(),
            SubmissionState::Pending { query } => Self {
                is_loading: true,
                query: Some(query.clone()),
                ..Default::default()
            },
            SubmissionState::Succeeded { answer, sources } => Self {
                answer: Some(answer.clone()),
                sources: sources.clone(),
                ..Default::default()
            },
            SubmissionState::Failed { message } => Self {
                error: Some(message.clone()),
                ..Default::default()
            },
        }
    }
}
