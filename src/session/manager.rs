//! Session registry: starts, tracks, cancels and reaps crawl sessions

use crate::config::Config;
use crate::crawler::{build_http_client, Coordinator, CrawlOutcome};
use crate::output::CrawlReport;
use crate::session::channel::{channel, EventSink, EventStream};
use crate::session::snapshot::{SessionSnapshot, SharedSnapshot};
use crate::session::{CrawlEvent, CrawlRequest, SessionId};
use crate::state::SessionStatus;
use crate::{RankError, Result};
use chrono::Utc;
use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// How long a cancelled session may take to wind down before it is aborted
const CANCEL_GRACE: Duration = Duration::from_secs(5);

struct SessionEntry {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
    snapshot: SharedSnapshot,
    created: Instant,
}

impl SessionEntry {
    /// Age counted from the end of the session, or from its start while running
    fn age(&self, snapshot: &SessionSnapshot) -> Duration {
        match snapshot.finished_at {
            Some(finished) => (Utc::now() - finished).to_std().unwrap_or_default(),
            None => self.created.elapsed(),
        }
    }

    /// Cancels the session without waiting for it
    ///
    /// The task keeps running long enough to send its `cancelled` event and
    /// is aborted only if it outlives the grace period.
    fn shutdown(self, id: SessionId) {
        self.cancel.cancel();
        if self.handle.is_finished() {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(wait_stopped(id, self.handle));
            }
            Err(_) => self.handle.abort(),
        }
    }
}

/// Waits out the cancel grace period, then aborts a session that is still running
async fn wait_stopped(id: SessionId, mut handle: JoinHandle<()>) {
    if tokio::time::timeout(CANCEL_GRACE, &mut handle).await.is_err() {
        tracing::warn!("Session {} did not stop in time, aborting", id);
        handle.abort();
    }
}

/// Owns every live crawl session
///
/// Sessions share nothing but the static configuration. Must be used from
/// within a tokio runtime.
pub struct SessionManager {
    config: Arc<Config>,
    sessions: Mutex<HashMap<SessionId, SessionEntry>>,
}

impl SessionManager {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<SessionId, SessionEntry>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Validates the request and starts crawling in the background
    ///
    /// Returns as soon as the session is registered. An invalid seed or
    /// parameter is reported here and no session is created.
    pub fn start(&self, request: CrawlRequest) -> Result<(SessionId, EventStream)> {
        self.reap_expired();

        let settings = request.resolve(&self.config)?;
        let client = build_http_client(&self.config.fetch, &self.config.user_agent)?;

        let id = SessionId::new();
        let (sink, stream) = channel(
            self.config.session.event_buffer,
            self.config.session.on_disconnect,
        );
        let snapshot = SharedSnapshot::new(SessionSnapshot::new(
            id,
            settings.seed.to_string(),
            settings.max_pages,
        ));
        let cancel = CancellationToken::new();

        tracing::info!("Starting session {} for {}", id, settings.seed);

        let coordinator = Coordinator::new(
            settings,
            client,
            sink.clone(),
            snapshot.clone(),
            cancel.clone(),
        );
        let handle = tokio::spawn(run_session(id, coordinator, sink, snapshot.clone()));

        self.sessions().insert(
            id,
            SessionEntry {
                cancel,
                handle,
                snapshot,
                created: Instant::now(),
            },
        );

        Ok((id, stream))
    }

    /// Cancels a session, waits for it to stop, and frees it
    ///
    /// Outstanding fetches are aborted. The consumer still receives the
    /// `cancelled` event if it keeps reading.
    pub async fn cancel(&self, id: SessionId) -> Result<()> {
        let entry = self
            .sessions()
            .remove(&id)
            .ok_or_else(|| RankError::SessionNotFound(id.to_string()))?;

        entry.cancel.cancel();
        wait_stopped(id, entry.handle).await;

        tracing::info!("Session {} cancelled", id);
        Ok(())
    }

    /// Current state of a session
    pub fn status(&self, id: SessionId) -> Option<SessionSnapshot> {
        self.sessions().get(&id).map(|entry| entry.snapshot.get())
    }

    /// Final report of a completed session
    pub fn result(&self, id: SessionId) -> Option<Arc<CrawlReport>> {
        self.sessions()
            .get(&id)
            .and_then(|entry| entry.snapshot.lock().report.clone())
    }

    /// Number of sessions currently tracked
    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops sessions past their TTL and sessions nobody is listening to
    ///
    /// A finished session expires once the TTL has passed since it ended, so
    /// a completed result stays pollable for the whole TTL. A session still
    /// running past the TTL is cancelled and sends its `cancelled` event. A
    /// session is abandoned once its consumer disconnected and it ended
    /// without a report. Returns the number of sessions removed.
    pub fn reap_expired(&self) -> usize {
        let ttl = Duration::from_secs(self.config.session.ttl_secs);
        let mut sessions = self.sessions();

        let stale: Vec<SessionId> = sessions
            .iter()
            .filter(|(_, entry)| {
                let snapshot = entry.snapshot.lock();
                let expired = entry.age(&snapshot) >= ttl;
                let abandoned = snapshot.detached
                    && snapshot.status.is_terminal()
                    && snapshot.status != SessionStatus::Completed;
                expired || abandoned
            })
            .map(|(id, _)| *id)
            .collect();

        for id in &stale {
            if let Some(entry) = sessions.remove(id) {
                tracing::debug!("Reaping session {}", id);
                entry.shutdown(*id);
            }
        }

        stale.len()
    }

    /// Periodically reaps sessions until the manager is dropped
    ///
    /// Without it, sessions are only reaped when a new one starts.
    pub fn spawn_reaper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let manager = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(manager) = manager.upgrade() else {
                    break;
                };
                let reaped = manager.reap_expired();
                if reaped > 0 {
                    tracing::info!("Reaped {} sessions", reaped);
                }
            }
        })
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        let sessions = std::mem::take(&mut *self.sessions());
        for (id, entry) in sessions {
            entry.shutdown(id);
        }
    }
}

/// Drives one session; a panic in the crawl loop becomes a fatal error event
async fn run_session(
    id: SessionId,
    coordinator: Coordinator,
    mut fatal: EventSink,
    snapshot: SharedSnapshot,
) {
    match AssertUnwindSafe(coordinator.run()).catch_unwind().await {
        Ok(CrawlOutcome::Completed(report)) => {
            tracing::info!("Session {} completed with {} pages", id, report.summary.pages)
        }
        Ok(CrawlOutcome::Cancelled { pages_done }) => {
            tracing::info!("Session {} stopped after {} pages", id, pages_done)
        }
        Ok(CrawlOutcome::Failed(reason)) => tracing::error!("Session {} failed: {}", id, reason),
        Err(_) => {
            tracing::error!("Session {} panicked", id);
            snapshot.update(|s| s.finish(SessionStatus::Failed, "Internal failure"));
            fatal
                .finish(CrawlEvent::Error {
                    url: None,
                    reason: "internal failure".to_string(),
                    fatal: true,
                })
                .await;
        }
    }
}
