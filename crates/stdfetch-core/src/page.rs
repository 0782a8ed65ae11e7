//! Page image references.

use serde::{Deserialize, Serialize};

/// One fetchable page image belonging to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRef {
    /// 1-based ordinal; determines assembly order.
    pub index: usize,

    /// Resolved, directly fetchable address.
    pub location: String,
}

impl PageRef {
    /// Create a new PageRef.
    pub fn new(index: usize, location: impl Into<String>) -> Self {
        Self {
            index,
            location: location.into(),
        }
    }

    /// Local filename for this page. Zero padding makes lexicographic order
    /// equal page order.
    pub fn file_name(&self) -> String {
        format!("{:05}.png", self.index)
    }
}
