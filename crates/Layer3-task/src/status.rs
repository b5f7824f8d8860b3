//! Task status state machine

use serde::{Deserialize, Serialize};

/// Possible states of a task
///
/// `Pending` is the sole initial state. `Completed`, `Failed` and
/// `Cancelled` are terminal; nothing transitions out of them except
/// deletion. The transitions themselves are enforced by the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Created, not yet run
    Pending,

    /// Remote execution in flight
    Running,

    /// Remote run succeeded
    Completed,

    /// Remote run failed or could not be started
    Failed,

    /// Cancelled locally before reaching a terminal state
    Cancelled,
}

impl TaskStatus {
    /// Check if this is a terminal state (cannot transition further)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }

    /// Check if the task can still move (pending or running)
    pub fn is_active(&self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::Running)
    }

    /// Get display name for the status
    pub fn display_name(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::Running => "Running",
            TaskStatus::Completed => "Completed",
            TaskStatus::Failed => "Failed",
            TaskStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
