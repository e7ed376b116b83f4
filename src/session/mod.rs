//! Crawl sessions
//!
//! A session is one crawl of one site, started from a [`CrawlRequest`]. It
//! streams [`CrawlEvent`]s to a single consumer, keeps a pollable
//! [`SessionSnapshot`], and ends with exactly one terminal event.

pub(crate) mod channel;
mod events;
mod manager;
mod request;
pub(crate) mod snapshot;

pub use channel::EventStream;
pub use events::CrawlEvent;
pub use manager::SessionManager;
pub use request::{CrawlRequest, CrawlSettings};
pub use snapshot::SessionSnapshot;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier handed out when a session starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}
