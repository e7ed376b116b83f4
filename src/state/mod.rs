//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `FetchStatus`: Tracks the fetch outcome of an individual page node
//! - `SessionStatus`: Tracks the lifecycle of a crawl session

mod page_state;
mod session_state;

// Re-export main types
pub use page_state::FetchStatus;
pub use session_state::SessionStatus;
