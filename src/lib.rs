//! answer-desk: ask a remote answer service a question, get back an answer
//! and the ranked sources it was built from.
//!
//! The [`QueryController`] owns the lifecycle of each question; the
//! [`HttpSearchClient`] is the transport to the service.

pub mod config;
pub mod controller;
pub mod models;
pub mod network;
pub mod render;

pub use config::Settings;
pub use controller::{Presentation, QueryController, SubmissionState};
pub use models::{Answer, Source};
pub use network::{ClientError, HttpSearchClient, SearchService};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
