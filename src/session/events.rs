//! Events streamed to the consumer of a crawl session
//!
//! Serialized as JSON objects tagged by `"type"`, e.g.
//! `{"type":"progress","frontier_size":3,"in_flight":2}`.

use crate::output::CrawlReport;
use crate::state::FetchStatus;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CrawlEvent {
    /// A page was visited, successfully or not
    PageCrawled {
        url: String,
        status: FetchStatus,
        http_status: Option<u16>,
        title: Option<String>,
        /// Distinct internal links on the page
        links_found: usize,
        pages_done: usize,
        /// Upper bound on the pages this crawl will visit
        estimate: usize,
    },

    Progress {
        frontier_size: usize,
        in_flight: usize,
    },

    /// A page failed (`fatal: false`) or the session died (`fatal: true`)
    Error {
        url: Option<String>,
        reason: String,
        fatal: bool,
    },

    /// Final analysis; always the last event of a finished crawl
    Complete(CrawlReport),

    Cancelled {
        pages_done: usize,
    },
}

impl CrawlEvent {
    /// True for the events that end a stream
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::Complete(_) | Self::Cancelled { .. } => true,
            Self::Error { fatal, .. } => *fatal,
            Self::PageCrawled { .. } | Self::Progress { .. } => false,
        }
    }

    /// Wire name of the event
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PageCrawled { .. } => "page_crawled",
            Self::Progress { .. } => "progress",
            Self::Error { .. } => "error",
            Self::Complete(_) => "complete",
            Self::Cancelled { .. } => "cancelled",
        }
    }

    /// Serializes the event as a single JSON line
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_crawled_wire_form() {
        let event = CrawlEvent::PageCrawled {
            url: "https://example.com/".to_string(),
            status: FetchStatus::Fetched,
            http_status: Some(200),
            title: Some("Home".to_string()),
            links_found: 4,
            pages_done: 1,
            estimate: 5,
        };

        let value: serde_json::Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "page_crawled",
                "url": "https://example.com/",
                "status": "fetched",
                "http_status": 200,
                "title": "Home",
                "links_found": 4,
                "pages_done": 1,
                "estimate": 5
            })
        );
        assert_eq!(event.kind(), "page_crawled");
    }

    #[test]
    fn test_terminal_events() {
        let page_error = CrawlEvent::Error {
            url: Some("https://example.com/x".to_string()),
            reason: "HTTP 404".to_string(),
            fatal: false,
        };
        let fatal = CrawlEvent::Error {
            url: None,
            reason: "internal failure".to_string(),
            fatal: true,
        };

        assert!(!page_error.is_terminal());
        assert!(fatal.is_terminal());
        assert!(CrawlEvent::Cancelled { pages_done: 3 }.is_terminal());
        assert!(!CrawlEvent::Progress {
            frontier_size: 0,
            in_flight: 0
        }
        .is_terminal());

        let value = serde_json::to_value(&fatal).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["fatal"], true);
    }
}
