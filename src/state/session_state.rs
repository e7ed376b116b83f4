use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a crawl session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Crawling (or ranking) is in progress
    Running,

    /// The final report was produced
    Completed,

    /// The session was cancelled before completion
    Cancelled,

    /// The session hit an internal failure
    Failed,
}

impl SessionStatus {
    /// Returns true once the session can no longer change
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
