//! Data models
//!
//! Answer and source types, plus the JSON bodies sent to and received from
//! the answer service.

mod types;
mod wire;

pub use types::{Answer, Source};
pub use wire::{ErrorResponse, SearchRequest, SearchResponse};
