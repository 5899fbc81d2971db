//! Reddit data-source client.
//!
//! Resolves a submission URL to its comment forest over Reddit's OAuth
//! API and flattens the forest into plain comment bodies, capped at the
//! pipeline's batch limit.

mod client;
mod submission;

pub use client::{RedditClient, RedditConfig, RedditError};
pub use submission::Submission;
