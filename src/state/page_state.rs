/// Page fetch status definitions
///
/// Every node in the crawl graph carries one of these.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the fetch status of a page node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    /// Page has been discovered as a link target but not fetched yet
    Pending,

    /// Page was fetched and parsed as HTML
    Fetched,

    /// Fetch failed (timeout, connection error, non-2xx, non-HTML, too large)
    Failed,
}

impl FetchStatus {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Returns true if this represents a successful fetch
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Fetched)
    }

    /// Returns the wire representation of this status
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetched => "fetched",
            Self::Failed => "failed",
        }
    }

    /// Parses a status from its wire representation
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "fetched" => Some(Self::Fetched),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        assert!(!FetchStatus::Pending.is_terminal());
        assert!(FetchStatus::Fetched.is_terminal());
        assert!(FetchStatus::Failed.is_terminal());
    }

    #[test]
    fn test_is_success() {
        assert!(FetchStatus::Fetched.is_success());
        assert!(!FetchStatus::Pending.is_success());
        assert!(!FetchStatus::Failed.is_success());
    }

    #[test]
    fn test_wire_names_match_serde() {
        for status in [FetchStatus::Pending, FetchStatus::Fetched, FetchStatus::Failed] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(FetchStatus::from_str_opt(status.as_str()), Some(status));
        }
        assert_eq!(FetchStatus::from_str_opt("bogus"), None);
    }
}
