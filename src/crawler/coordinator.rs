//! Crawler coordinator - the crawl loop of one session
//!
//! One loop owns the frontier and the graph builder. Fetches run concurrently
//! in a bounded pool; each finished fetch is applied to the graph by the loop
//! itself, in completion order. This covers:
//! - Dispatching frontier URLs to the worker pool
//! - Folding redirects into the graph
//! - Enqueueing discovered links and recording edges
//! - Streaming progress events
//! - Ranking and issue detection once the frontier has drained

use crate::crawler::fetcher::{fetch_url, FetchedPage};
use crate::crawler::frontier::{Admission, Frontier};
use crate::crawler::parser::{parse_html, ParsedPage};
use crate::graph::{CrawlGraph, GraphBuilder, NodeId, RedirectOutcome};
use crate::issues::{detect, LowAuthorityPolicy};
use crate::output::CrawlReport;
use crate::rank::{compute, PageRankParams};
use crate::session::channel::{Disconnected, EventSink};
use crate::session::snapshot::SharedSnapshot;
use crate::session::{CrawlEvent, CrawlSettings};
use crate::state::{FetchStatus, SessionStatus};
use crate::url::same_site;
use crate::{FetchError, FetchResult, RankError};
use futures::stream::{FuturesUnordered, StreamExt};
use reqwest::Client;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// How a crawl loop ended
#[derive(Debug, Clone)]
pub enum CrawlOutcome {
    Completed(Arc<CrawlReport>),
    Cancelled { pages_done: usize },
    Failed(String),
}

/// A finished worker: the fetch and, when it succeeded, the parsed page
struct Visit {
    node: NodeId,
    requested: Url,
    result: FetchResult<(FetchedPage, ParsedPage)>,
}

/// Fetches and parses one page
///
/// The parsed document never lives across an await point.
async fn visit(
    client: Client,
    requested: Url,
    node: NodeId,
    site: Url,
    max_body_bytes: usize,
) -> Visit {
    let result = fetch_url(&client, &requested, max_body_bytes)
        .await
        .map(|mut page| {
            let body = std::mem::take(&mut page.body);
            let parsed = parse_html(&body, &page.final_url, &site);
            (page, parsed)
        });

    Visit {
        node,
        requested,
        result,
    }
}

/// Ranks a frozen graph and assembles the final report
pub fn analyze(
    graph: &CrawlGraph,
    params: &PageRankParams,
    policy: &LowAuthorityPolicy,
) -> CrawlReport {
    let ranking = compute(graph, params);

    let scored = graph.with_scores(&ranking.scores);
    let issues = detect(&scored, &ranking.scores, policy);
    CrawlReport::build(&scored, &ranking, &issues, params.alpha)
}

/// The crawl loop of one session
pub struct Coordinator {
    settings: CrawlSettings,
    client: Client,
    frontier: Frontier,
    graph: GraphBuilder,
    /// Nodes already handed to a worker
    claimed: HashSet<NodeId>,
    sink: EventSink,
    snapshot: SharedSnapshot,
    cancel: CancellationToken,
    pages_done: usize,
}

impl Coordinator {
    pub(crate) fn new(
        settings: CrawlSettings,
        client: Client,
        sink: EventSink,
        snapshot: SharedSnapshot,
        cancel: CancellationToken,
    ) -> Self {
        let frontier = Frontier::new(settings.seed.clone(), settings.max_pages);
        Self {
            settings,
            client,
            frontier,
            graph: GraphBuilder::new(),
            claimed: HashSet::new(),
            sink,
            snapshot,
            cancel,
            pages_done: 0,
        }
    }

    /// Runs the crawl to completion, cancellation, or failure
    ///
    /// Exactly one terminal event is sent before this returns.
    pub(crate) async fn run(mut self) -> CrawlOutcome {
        match self.crawl().await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Crawl of {} failed: {}", self.settings.seed, e);
                self.snapshot
                    .update(|s| s.finish(SessionStatus::Failed, "Internal failure"));
                self.sink
                    .finish(CrawlEvent::Error {
                        url: None,
                        reason: "internal failure".to_string(),
                        fatal: true,
                    })
                    .await;
                CrawlOutcome::Failed(e.to_string())
            }
        }
    }

    async fn crawl(&mut self) -> Result<CrawlOutcome, RankError> {
        let seed = self.settings.seed.clone();
        tracing::info!(
            "Starting crawl of {} (max {} pages, {} workers)",
            seed,
            self.settings.max_pages,
            self.settings.max_concurrent_fetches
        );

        if !matches!(self.frontier.enqueue_url(seed.clone()), Admission::Queued(_)) {
            return Err(RankError::Internal(format!("seed {} was not admitted", seed)));
        }
        self.graph.set_seed(&seed);

        let mut in_flight = FuturesUnordered::new();

        loop {
            while in_flight.len() < self.settings.max_concurrent_fetches {
                let Some((node, url)) = self.next_dispatch() else {
                    break;
                };

                if !self.settings.politeness_delay.is_zero() {
                    let cancelled = tokio::select! {
                        _ = self.cancel.cancelled() => true,
                        _ = tokio::time::sleep(self.settings.politeness_delay) => false,
                    };
                    if cancelled {
                        return Ok(self.cancelled().await);
                    }
                }

                tracing::debug!("Fetching {}", url);
                let current = url.to_string();
                self.snapshot.update(|s| s.current_url = Some(current));
                in_flight.push(visit(
                    self.client.clone(),
                    url,
                    node,
                    self.frontier.site().clone(),
                    self.settings.max_body_bytes,
                ));
            }

            if in_flight.is_empty() {
                tracing::info!("Frontier is empty, crawl complete");
                break;
            }

            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                finished = in_flight.next() => Some(finished),
            };

            let finished = match next {
                Some(Some(finished)) => finished,
                Some(None) => continue,
                None => {
                    // Dropping the pool aborts every outstanding fetch.
                    drop(in_flight);
                    return Ok(self.cancelled().await);
                }
            };

            if self.apply(finished, in_flight.len()).await.is_err() {
                tracing::info!("Cancelling crawl of {}: consumer went away", seed);
                self.cancel.cancel();
                drop(in_flight);
                return Ok(self.cancelled().await);
            }
        }

        Ok(self.complete().await)
    }

    /// Pops the next URL whose node still needs a fetch
    fn next_dispatch(&mut self) -> Option<(NodeId, Url)> {
        while let Some(url) = self.frontier.dequeue() {
            let Some(node) = self.graph.node_id(url.as_str()) else {
                continue;
            };
            let pending = self
                .graph
                .node(node)
                .is_some_and(|n| n.status == FetchStatus::Pending);
            if pending && self.claimed.insert(node) {
                return Some((node, url));
            }
        }
        None
    }

    async fn apply(&mut self, visit: Visit, in_flight: usize) -> Result<(), Disconnected> {
        let Visit {
            node,
            requested,
            result,
        } = visit;

        match result {
            Ok((page, parsed)) => self.apply_page(node, &requested, page, parsed, in_flight).await,
            Err(error) => self.apply_failure(node, &requested, error, in_flight).await,
        }
    }

    async fn apply_failure(
        &mut self,
        node: NodeId,
        requested: &Url,
        error: FetchError,
        in_flight: usize,
    ) -> Result<(), Disconnected> {
        tracing::warn!("Failed to fetch {}: {}", requested, error);

        let http_status = match error {
            FetchError::Http(code) => Some(code),
            _ => None,
        };
        self.graph
            .record_fetch(node, FetchStatus::Failed, http_status, None, 0);
        self.pages_done += 1;

        self.sink
            .emit(CrawlEvent::Error {
                url: Some(requested.to_string()),
                reason: error.to_string(),
                fatal: false,
            })
            .await?;
        self.page_crawled(node, 0, in_flight).await
    }

    async fn apply_page(
        &mut self,
        requested_node: NodeId,
        requested: &Url,
        page: FetchedPage,
        mut parsed: ParsedPage,
        in_flight: usize,
    ) -> Result<(), Disconnected> {
        let mut node = requested_node;

        if page.final_url != *requested {
            if !same_site(&page.final_url, self.frontier.site()) {
                let is_seed = self.graph.seed() == Some(node);
                if is_seed && self.frontier.rebase(page.final_url.clone()) {
                    tracing::info!("Seed redirected to {}, crawling that site", page.final_url);
                    parsed.links.rescope(page.final_url.clone());
                } else {
                    let error =
                        FetchError::Redirect(format!("redirected off-site to {}", page.final_url));
                    return self.apply_failure(node, requested, error, in_flight).await;
                }
            }

            match self.graph.resolve_redirect(node, &page.final_url) {
                RedirectOutcome::Unchanged(id) => node = id,
                RedirectOutcome::Renamed(id) => {
                    tracing::debug!("{} redirected to {}", requested, page.final_url);
                    self.frontier.register_alias(&page.final_url);
                    node = id;
                }
                RedirectOutcome::Merged { into } => {
                    self.frontier.release();
                    // The target sends its own page_crawled, so this fetch
                    // only refreshes progress and pages_done stays unchanged.
                    if !self.claimed.insert(into) {
                        tracing::debug!(
                            "{} redirected to {}, which is already handled",
                            requested,
                            page.final_url
                        );
                        return self.progress(in_flight).await;
                    }
                    node = into;
                }
            }
        }

        let Some(source) = self.graph.node(node).map(|n| n.url.clone()) else {
            return Ok(());
        };

        let mut links_found = 0;
        let mut dropped = 0;
        for link in parsed.links.internal() {
            links_found += 1;
            match self.frontier.enqueue_url(link) {
                Admission::Queued(target) | Admission::Seen(target) => {
                    self.graph.add_edge(&source, &target);
                }
                Admission::CapReached => dropped += 1,
                Admission::Rejected => {}
            }
        }
        if dropped > 0 {
            tracing::debug!("Page cap reached, dropped {} links from {}", dropped, source);
        }

        let external_links = parsed.links.external_count();
        self.graph.record_fetch(
            node,
            FetchStatus::Fetched,
            Some(page.status_code),
            parsed.title,
            external_links,
        );
        self.pages_done += 1;
        tracing::debug!("Crawled {} ({} internal links)", source, links_found);

        self.page_crawled(node, links_found, in_flight).await
    }

    /// Upper bound on the pages this crawl will visit
    fn estimate(&self, in_flight: usize) -> usize {
        (self.pages_done + self.frontier.len() + in_flight).min(self.settings.max_pages)
    }

    async fn page_crawled(
        &mut self,
        node: NodeId,
        links_found: usize,
        in_flight: usize,
    ) -> Result<(), Disconnected> {
        let Some(page) = self.graph.node(node) else {
            return Ok(());
        };

        let event = CrawlEvent::PageCrawled {
            url: page.url.to_string(),
            status: page.status,
            http_status: page.http_status,
            title: page.title.clone(),
            links_found,
            pages_done: self.pages_done,
            estimate: self.estimate(in_flight),
        };

        let pages_done = self.pages_done;
        let title = page.title.clone();
        self.snapshot.update(|s| {
            s.pages_done = pages_done;
            s.current_title = title;
            s.message = format!("Crawled {} pages", pages_done);
        });

        self.sink.emit(event).await?;
        self.progress(in_flight).await
    }

    async fn progress(&mut self, in_flight: usize) -> Result<(), Disconnected> {
        let frontier_size = self.frontier.len();
        let detached = self.sink.is_detached();
        self.snapshot.update(|s| {
            s.frontier_size = frontier_size;
            s.detached = detached;
        });

        self.sink
            .emit(CrawlEvent::Progress {
                frontier_size,
                in_flight,
            })
            .await
    }

    async fn complete(&mut self) -> CrawlOutcome {
        self.snapshot.update(|s| {
            s.frontier_size = 0;
            s.current_url = None;
            s.message = "Computing PageRank".to_string();
        });

        let graph = std::mem::take(&mut self.graph).finalize();
        let report = Arc::new(analyze(
            &graph,
            &self.settings.rank,
            &self.settings.low_authority,
        ));

        tracing::info!(
            "Crawl of {} complete: {} pages, {} links, {} failed",
            self.settings.seed,
            report.summary.pages,
            report.summary.links,
            report.summary.failed_pages
        );

        let detached = self.sink.is_detached();
        let stored = Arc::clone(&report);
        self.snapshot.update(|s| {
            s.report = Some(stored);
            s.detached = detached;
            s.finish(SessionStatus::Completed, "Analysis complete");
        });

        self.sink
            .finish(CrawlEvent::Complete(report.as_ref().clone()))
            .await;
        CrawlOutcome::Completed(report)
    }

    async fn cancelled(&mut self) -> CrawlOutcome {
        let pages_done = self.pages_done;
        tracing::info!(
            "Crawl of {} cancelled after {} pages",
            self.settings.seed,
            pages_done
        );

        let detached = self.sink.is_detached();
        self.snapshot.update(|s| {
            s.detached = detached;
            s.current_url = None;
            s.finish(SessionStatus::Cancelled, "Crawl cancelled");
        });

        self.sink.finish(CrawlEvent::Cancelled { pages_done }).await;
        CrawlOutcome::Cancelled { pages_done }
    }
}
