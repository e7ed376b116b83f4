//! Issue detection module
//!
//! Classifies every node of a ranked graph. Each check runs independently, so
//! a page may be an orphan, a dead end and low-authority at the same time.

mod detector;

pub use detector::{detect, IssueKind, IssueReport, IssueSet, LowAuthorityPolicy};
