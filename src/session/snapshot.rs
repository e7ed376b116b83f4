//! Pollable view of a running or finished session

use crate::output::CrawlReport;
use crate::session::SessionId;
use crate::state::SessionStatus;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Point-in-time state of a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub seed: String,
    pub status: SessionStatus,
    pub pages_done: usize,
    pub max_pages: usize,
    pub frontier_size: usize,
    pub current_url: Option<String>,
    pub current_title: Option<String>,
    pub message: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// The consumer dropped its event stream
    pub detached: bool,
    #[serde(skip)]
    pub report: Option<Arc<CrawlReport>>,
}

impl SessionSnapshot {
    pub fn new(id: SessionId, seed: String, max_pages: usize) -> Self {
        Self {
            id,
            seed,
            status: SessionStatus::Running,
            pages_done: 0,
            max_pages,
            frontier_size: 0,
            current_url: None,
            current_title: None,
            message: "Starting crawl".to_string(),
            started_at: Utc::now(),
            finished_at: None,
            detached: false,
            report: None,
        }
    }

    /// Moves the session to a terminal status
    pub fn finish(&mut self, status: SessionStatus, message: impl Into<String>) {
        self.status = status;
        self.message = message.into();
        self.finished_at = Some(Utc::now());
    }
}

/// Snapshot shared between a crawl loop and the session manager
#[derive(Debug, Clone)]
pub(crate) struct SharedSnapshot(Arc<Mutex<SessionSnapshot>>);

impl SharedSnapshot {
    pub fn new(snapshot: SessionSnapshot) -> Self {
        Self(Arc::new(Mutex::new(snapshot)))
    }

    /// Locks the snapshot; a poisoned lock still yields the last written state
    pub fn lock(&self) -> MutexGuard<'_, SessionSnapshot> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn update(&self, f: impl FnOnce(&mut SessionSnapshot)) {
        f(&mut self.lock());
    }

    pub fn get(&self) -> SessionSnapshot {
        self.lock().clone()
    }
}
