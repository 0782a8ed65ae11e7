//! stdfetch Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/HTTP
//! - Filesystem
//! - Runtime specifics
//!
//! Everything here describes a download task and the pages it is built from.

pub mod error;
pub mod ids;
pub mod page;
pub mod status;
pub mod task;

// Re-export commonly used types
pub use error::{CoreError, TaskError};
pub use ids::TaskId;
pub use page::PageRef;
pub use status::TaskStatus;
pub use task::{artifact_filename, percent_encode, Artifact, TaskRecord};
