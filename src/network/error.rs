//! Errors reported by the search client

use thiserror::Error;

/// Message shown when the service could not be reached
pub const TRANSPORT_MESSAGE: &str = "Failed to fetch data";

/// Message shown when the service answered with an unexpected body
pub const MALFORMED_MESSAGE: &str = "Received an unexpected response from the search service";

/// Failure of a single `execute` call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Connectivity problem: unreachable host, timeout, reset connection
    #[error("transport error: {0}")]
    Transport(String),
    /// The service rejected or failed the query
    #[error("service error: {0}")]
    Service(String),
    /// A success response that does not match the expected schema
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ClientError {
    /// Text to present to the user for this error
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Transport(_) => TRANSPORT_MESSAGE.to_string(),
            ClientError::Service(message) => message.clone(),
            ClientError::MalformedResponse(_) => MALFORMED_MESSAGE.to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}
