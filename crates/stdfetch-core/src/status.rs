//! Status enum and state machine for download Tasks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a download Task.
///
/// ```text
/// pending -> downloading -> converting -> completed
///                 |              |
///                 +--> error <---+
/// ```
/// Any non-terminal status may also move straight to `error`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Task accepted and queued, not yet picked up by the worker.
    #[default]
    Pending,
    /// Worker is resolving the catalog entry and fetching page images.
    Downloading,
    /// Page images fetched; the PDF is being assembled.
    Converting,
    /// Artifact is ready for retrieval.
    Completed,
    /// Task failed; see the record's message.
    Error,
}

impl TaskStatus {
    /// Returns true if the task is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    /// Returns true if the task is still active (not terminal).
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Position in the pipeline's partial order.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Downloading => 1,
            Self::Converting => 2,
            Self::Completed | Self::Error => 3,
        }
    }

    /// Whether moving from `self` to `next` is a legal transition.
    ///
    /// `downloading -> downloading` is allowed for progress updates.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Pending, Downloading)
                | (Downloading, Downloading)
                | (Downloading, Converting)
                | (Converting, Completed)
                | (Pending | Downloading | Converting, Error)
        )
    }

    /// Lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Downloading => "downloading",
            Self::Converting => "converting",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }

    /// All statuses, in pipeline order.
    pub const ALL: [TaskStatus; 5] = [
        Self::Pending,
        Self::Downloading,
        Self::Converting,
        Self::Completed,
        Self::Error,
    ];
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
