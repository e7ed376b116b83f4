//! Crawl frontier: the deduplicated FIFO of pages still to visit
//!
//! The frontier is also the page-cap gate. Every URL it admits becomes a node
//! in the crawl graph, so it counts admissions and refuses new URLs once the
//! cap is reached. URLs it has already seen are never queued twice.

use crate::url::{normalize_url, same_site};
use std::collections::{HashSet, VecDeque};
use url::Url;

/// Outcome of offering a URL to the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// First sighting: the URL was queued and counts against the cap
    Queued(Url),

    /// The URL is already known (queued, visited, or a redirect alias)
    Seen(Url),

    /// The URL is new but the cap is reached; it was dropped
    CapReached,

    /// The URL is malformed, not http(s), or outside the crawled site
    Rejected,
}

impl Admission {
    /// The canonical URL when the page is (or already was) part of the crawl
    pub fn url(&self) -> Option<&Url> {
        match self {
            Self::Queued(url) | Self::Seen(url) => Some(url),
            Self::CapReached | Self::Rejected => None,
        }
    }
}

/// Deduplicated FIFO of URLs to visit, bounded by a page cap
#[derive(Debug)]
pub struct Frontier {
    /// Root of the crawled site; only same-site URLs are admitted
    site: Url,

    /// URLs waiting to be fetched, in discovery order
    queue: VecDeque<Url>,

    /// Every canonical URL ever admitted, plus redirect aliases
    seen: HashSet<String>,

    /// Number of distinct pages admitted so far
    admitted: usize,

    /// Maximum number of distinct pages
    cap: usize,
}

impl Frontier {
    /// Creates a frontier for the site rooted at `site`
    pub fn new(site: Url, cap: usize) -> Self {
        Self {
            site,
            queue: VecDeque::new(),
            seen: HashSet::new(),
            admitted: 0,
            cap,
        }
    }

    /// Normalizes `raw` and offers it to the frontier
    pub fn enqueue(&mut self, raw: &str) -> Admission {
        match normalize_url(raw) {
            Ok(url) => self.enqueue_url(url),
            Err(e) => {
                tracing::debug!("Rejected malformed URL {}: {}", raw, e);
                Admission::Rejected
            }
        }
    }

    /// Offers an already-canonical URL to the frontier
    pub fn enqueue_url(&mut self, url: Url) -> Admission {
        if !same_site(&url, &self.site) {
            return Admission::Rejected;
        }

        if self.seen.contains(url.as_str()) {
            return Admission::Seen(url);
        }

        if self.admitted >= self.cap {
            return Admission::CapReached;
        }

        self.seen.insert(url.as_str().to_string());
        self.admitted += 1;
        self.queue.push_back(url.clone());
        Admission::Queued(url)
    }

    /// Pops the next URL to visit, oldest first
    pub fn dequeue(&mut self) -> Option<Url> {
        self.queue.pop_front()
    }

    /// Marks a redirect target as seen without consuming cap
    ///
    /// Returns false if the URL was already known.
    pub fn register_alias(&mut self, url: &Url) -> bool {
        self.seen.insert(url.as_str().to_string())
    }

    /// Gives back one unit of cap after two pages were merged into one
    pub fn release(&mut self) {
        self.admitted = self.admitted.saturating_sub(1);
    }

    /// Returns true if the URL has been admitted or aliased
    pub fn contains(&self, url: &Url) -> bool {
        self.seen.contains(url.as_str())
    }

    /// Number of URLs waiting to be fetched
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of distinct pages admitted so far
    pub fn admitted(&self) -> usize {
        self.admitted
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn site(&self) -> &Url {
        &self.site
    }

    /// Moves the crawl to another site root
    ///
    /// Used when the seed itself redirects to a different host; only valid
    /// while the seed is the sole admitted page.
    pub fn rebase(&mut self, site: Url) -> bool {
        if self.admitted > 1 || !self.queue.is_empty() {
            return false;
        }
        self.seen.insert(site.as_str().to_string());
        self.site = site;
        true
    }
}
