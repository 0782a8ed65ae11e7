//! Core domain errors.

use thiserror::Error;

/// Core domain errors for stdfetch.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Task not found.
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// Invalid state transition.
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    /// Progress moved backwards within the download phase.
    #[error("Progress regression: {from}% -> {to}%")]
    ProgressRegression { from: u8, to: u8 },
}

/// Why a task ended in the `error` state.
///
/// Every variant is terminal. The worker turns it into the `message` of the
/// final status record; nothing is ever thrown back through the queue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    /// The catalog has no document for the requested identifier.
    #[error("Standard not found")]
    NotFound,

    /// Network, HTTP or parse failure talking to the catalog.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Every page fetch failed, or the catalog listed no pages.
    #[error("No page images were downloaded")]
    NoContent,

    /// The PDF could not be assembled from the fetched pages.
    #[error("Failed to assemble document: {0}")]
    Assembly(String),

    /// Anything else, including a panic inside the pipeline.
    #[error("{0}")]
    Unhandled(String),
}
