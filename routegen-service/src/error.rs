//! Errors surfaced by the generator engine.

use routegen_core::{BuildError, FetchError};
use thiserror::Error;

/// Everything that can go wrong while running the routing generator.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// The topology could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// The topology could not be translated.
    #[error("failed to build routing table: {0}")]
    Build(#[from] BuildError),
    /// The fetch-and-build task died before returning.
    #[error("topology refresh task failed: {0}")]
    Interrupted(String),
    /// The configuration is unreadable or invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// `start` was called outside a tokio runtime.
    #[error("the routing generator must be started from within a tokio runtime")]
    NoRuntime,
    /// The generator has been shut down.
    #[error("the routing generator has been shut down")]
    Stopped,
}
