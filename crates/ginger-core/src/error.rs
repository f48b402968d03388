//! Core error types for ginger-core.
//!
//! The store itself has no recoverable failure modes: construction either
//! succeeds or trips an invariant assertion. Errors here cover lookups made
//! against a materialized view.

use thiserror::Error;

/// Core errors produced by the ginger-core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A value has no vertex in the graph being traversed.
    #[error("value not found in graph: '{value}'")]
    ValueNotFound { value: String },
}
