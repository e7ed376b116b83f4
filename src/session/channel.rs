//! The ordered event channel between a crawl loop and its single consumer

use crate::config::DisconnectPolicy;
use crate::session::events::CrawlEvent;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc;

/// How long a terminal event may wait for room in the channel
const TERMINAL_SEND_TIMEOUT: Duration = Duration::from_secs(1);

/// Creates a connected sink/stream pair
pub(crate) fn channel(buffer: usize, policy: DisconnectPolicy) -> (EventSink, EventStream) {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    (
        EventSink {
            tx,
            policy,
            detached: false,
        },
        EventStream { rx },
    )
}

/// The consumer dropped its stream and the session should stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Disconnected;

/// Producer half, owned by the crawl loop
#[derive(Debug, Clone)]
pub(crate) struct EventSink {
    tx: mpsc::Sender<CrawlEvent>,
    policy: DisconnectPolicy,
    detached: bool,
}

impl EventSink {
    /// Sends an event, waiting for room in the channel
    ///
    /// Once the consumer is gone, events are discarded. Under
    /// [`DisconnectPolicy::Cancel`] the first failed send reports
    /// [`Disconnected`]; under [`DisconnectPolicy::Complete`] the crawl goes on.
    pub async fn emit(&mut self, event: CrawlEvent) -> Result<(), Disconnected> {
        if self.detached {
            return Ok(());
        }

        if self.tx.send(event).await.is_err() {
            self.detached = true;
            tracing::info!("Event consumer disconnected");
            if self.policy == DisconnectPolicy::Cancel {
                return Err(Disconnected);
            }
        }
        Ok(())
    }

    /// Sends a terminal event without risking an unbounded wait
    pub async fn finish(&mut self, event: CrawlEvent) {
        if self.detached {
            return;
        }
        match tokio::time::timeout(TERMINAL_SEND_TIMEOUT, self.tx.send(event)).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => self.detached = true,
            Err(_) => tracing::warn!("Consumer not reading, dropped terminal event"),
        }
    }

    /// True once a send has failed because the consumer went away
    pub fn is_detached(&self) -> bool {
        self.detached || self.tx.is_closed()
    }
}

/// Consumer half: the ordered stream of a session's events
///
/// The stream ends after the terminal event.
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::Receiver<CrawlEvent>,
}

impl EventStream {
    /// Waits for the next event; `None` once the session has finished
    pub async fn next_event(&mut self) -> Option<CrawlEvent> {
        self.rx.recv().await
    }
}

impl Stream for EventStream {
    type Item = CrawlEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
