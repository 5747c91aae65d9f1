//! Query lifecycle
//!
//! [`QueryController`] owns the [`SubmissionState`]: it guards submissions,
//! dispatches them to a [`crate::network::SearchService`] and commits only the
//! outcome of the most recent one.

mod query;
mod state;

pub use query::{QueryController, Ticket};
pub use state::{Presentation, SubmissionState};
