//! HTTP networking module
//!
//! Provides the client that forwards queries to the answer service.

mod client;
mod error;

pub use client::{HttpSearchClient, SearchService};
pub use error::{ClientError, MALFORMED_MESSAGE, TRANSPORT_MESSAGE};
