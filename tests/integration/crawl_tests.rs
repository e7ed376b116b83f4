//! Integration tests for crawl sessions
//!
//! These tests use wiremock to create mock HTTP servers and run full
//! sessions end-to-end: crawl, rank, detect issues, stream events.

use std::time::Duration;
use sumi_rank::config::Config;
use sumi_rank::issues::IssueKind;
use sumi_rank::output::CrawlReport;
use sumi_rank::{CrawlEvent, CrawlRequest, FetchStatus, RankError, SessionManager, SessionStatus};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Configuration tuned for fast tests
fn test_config() -> Config {
    let mut config = Config::default();
    config.crawler.politeness_delay_ms = 0;
    config.fetch.timeout_secs = 1;
    config.fetch.connect_timeout_secs = 1;
    config
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_raw(format!("<html><body>{}</body></html>", body), "text/html")
}

async fn mount_page(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Drains a session and returns every event it sent
async fn run_session(manager: &SessionManager, request: CrawlRequest) -> Vec<CrawlEvent> {
    let (_id, mut stream) = manager.start(request).expect("Failed to start session");
    let mut events = Vec::new();
    while let Some(event) = stream.next_event().await {
        events.push(event);
    }
    events
}

fn final_report(events: &[CrawlEvent]) -> &CrawlReport {
    match events.last() {
        Some(CrawlEvent::Complete(report)) => report,
        other => panic!("expected a complete event last, got {:?}", other),
    }
}

fn assert_single_terminal(events: &[CrawlEvent]) {
    let terminals = events.iter().filter(|e| e.is_terminal()).count();
    assert_eq!(terminals, 1, "exactly one terminal event expected");
    assert!(events.last().is_some_and(CrawlEvent::is_terminal));
}

#[tokio::test]
async fn test_three_page_scenario() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    mount_page(&mock_server, "/", html(r#"<a href="/b">B</a><a href="/c">C</a>"#)).await;
    mount_page(&mock_server, "/b", html(r#"<a href="/c">C</a>"#)).await;
    mount_page(&mock_server, "/c", html("nothing here")).await;

    let manager = SessionManager::new(test_config());
    let events = run_session(&manager, CrawlRequest::new(base.clone())).await;

    assert_single_terminal(&events);
    let crawled = events
        .iter()
        .filter(|e| matches!(e, CrawlEvent::PageCrawled { .. }))
        .count();
    assert_eq!(crawled, 3);

    let report = final_report(&events);
    let order: Vec<&str> = report.nodes.iter().map(|n| n.path.as_str()).collect();
    assert_eq!(order, vec!["/c", "/b", "/"]);

    let total: f64 = report.nodes.iter().map(|n| n.score).sum();
    assert!((total - 1.0).abs() < 1e-6);
    assert!(report.nodes.iter().all(|n| n.score > 0.0));

    let c = report.node(&format!("{}/c", base)).unwrap();
    assert!(c.issues.contains(&IssueKind::DeadEnd));
    assert!(!c.issues.contains(&IssueKind::Orphan));

    let seed = report.node(&format!("{}/", base)).unwrap();
    assert!(seed.issues.is_empty());
    assert_eq!(report.edges.len(), 3);
}

#[tokio::test]
async fn test_external_links_are_not_nodes() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/",
        html(
            r#"<a href="https://elsewhere.example/page">Out</a>
               <a href="/inside">In</a>"#,
        ),
    )
    .await;
    mount_page(&mock_server, "/inside", html("")).await;

    let manager = SessionManager::new(test_config());
    let events = run_session(&manager, CrawlRequest::new(mock_server.uri())).await;
    let report = final_report(&events);

    assert_eq!(report.summary.pages, 2);
    assert_eq!(report.summary.external_links, 1);
    assert!(report.nodes.iter().all(|n| !n.url.contains("elsewhere")));
    assert!(report
        .edges
        .iter()
        .all(|e| !e.source.contains("elsewhere") && !e.target.contains("elsewhere")));
}

#[tokio::test]
async fn test_page_cap_is_respected() {
    let mock_server = MockServer::start().await;

    let links: String = (0..20)
        .map(|i| format!(r#"<a href="/p{}">{}</a>"#, i, i))
        .collect();
    mount_page(&mock_server, "/", html(&links)).await;
    Mock::given(method("GET"))
        .respond_with(html(r#"<a href="/">home</a>"#))
        .mount(&mock_server)
        .await;

    let manager = SessionManager::new(test_config());
    let request = CrawlRequest::new(mock_server.uri()).with_max_pages(5);
    let events = run_session(&manager, request).await;
    let report = final_report(&events);

    assert_eq!(report.summary.pages, 5);
    for event in &events {
        if let CrawlEvent::PageCrawled {
            pages_done,
            estimate,
            ..
        } = event
        {
            assert!(*pages_done <= 5);
            assert!(*estimate <= 5);
        }
    }
    for edge in &report.edges {
        assert!(report.node(&edge.source).is_some());
        assert!(report.node(&edge.target).is_some());
    }
}

#[tokio::test]
async fn test_self_links_make_no_edges() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/",
        html(r##"<a href="/">me</a><a href="/#top">top</a><a href="/?page=2">again</a>"##),
    )
    .await;

    let manager = SessionManager::new(test_config());
    let events = run_session(&manager, CrawlRequest::new(mock_server.uri())).await;
    let report = final_report(&events);

    assert_eq!(report.summary.pages, 1);
    assert!(report.edges.is_empty());
    assert!(report.nodes[0].issues.contains(&IssueKind::DeadEnd));
}

#[tokio::test]
async fn test_timeout_does_not_block_other_pages() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        html(r#"<a href="/slow">slow</a><a href="/fast">fast</a>"#),
    )
    .await;
    mount_page(
        &mock_server,
        "/slow",
        html("too late").set_delay(Duration::from_secs(3)),
    )
    .await;
    mount_page(&mock_server, "/fast", html(r#"<a href="/after">after</a>"#)).await;
    mount_page(&mock_server, "/after", html("")).await;

    let manager = SessionManager::new(test_config());
    let events = run_session(&manager, CrawlRequest::new(base.clone())).await;
    let report = final_report(&events);

    let slow = report.node(&format!("{}/slow", base)).unwrap();
    assert_eq!(slow.status, FetchStatus::Failed);
    assert!(slow.issues.contains(&IssueKind::DeadEnd));

    let after = report.node(&format!("{}/after", base)).unwrap();
    assert_eq!(after.status, FetchStatus::Fetched);

    assert!(events.iter().any(|e| matches!(
        e,
        CrawlEvent::Error { url: Some(url), fatal: false, .. } if url.ends_with("/slow")
    )));
}

#[tokio::test]
async fn test_failed_page_is_kept_as_dead_end() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    mount_page(&mock_server, "/", html(r#"<a href="/missing">gone</a>"#)).await;
    mount_page(&mock_server, "/missing", ResponseTemplate::new(404)).await;

    let manager = SessionManager::new(test_config());
    let events = run_session(&manager, CrawlRequest::new(base.clone())).await;
    let report = final_report(&events);

    let missing = report.node(&format!("{}/missing", base)).unwrap();
    assert_eq!(missing.http_status, Some(404));
    assert_eq!(missing.links_in, 1);
    assert!(missing.issues.contains(&IssueKind::DeadEnd));
    assert_eq!(report.summary.failed_pages, 1);
}

#[tokio::test]
async fn test_redirect_folds_into_target() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        html(r#"<a href="/old">old</a><a href="/new">new</a>"#),
    )
    .await;
    mount_page(
        &mock_server,
        "/old",
        ResponseTemplate::new(301).insert_header("location", format!("{}/new", base).as_str()),
    )
    .await;
    mount_page(&mock_server, "/new", html("")).await;

    let manager = SessionManager::new(test_config());
    let events = run_session(&manager, CrawlRequest::new(base.clone())).await;
    let report = final_report(&events);

    assert_eq!(report.summary.pages, 2);
    assert!(report.node(&format!("{}/old", base)).is_none());
    let new = report.node(&format!("{}/new", base)).unwrap();
    assert_eq!(new.links_in, 1);
    assert_eq!(new.status, FetchStatus::Fetched);

    // One page_crawled per node, never one for the redirecting URL
    let crawled: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            CrawlEvent::PageCrawled { pages_done, .. } => Some(*pages_done),
            _ => None,
        })
        .collect();
    assert_eq!(crawled, vec![1, 2]);
    assert!(!events.iter().any(
        |e| matches!(e, CrawlEvent::PageCrawled { url, .. } if url.ends_with("/old"))
    ));
}

#[tokio::test]
async fn test_cancel_stops_crawl() {
    let mock_server = MockServer::start().await;

    let links: String = (0..10)
        .map(|i| format!(r#"<a href="/slow{}">{}</a>"#, i, i))
        .collect();
    mount_page(&mock_server, "/", html(&links)).await;
    Mock::given(method("GET"))
        .respond_with(html("").set_delay(Duration::from_millis(900)))
        .mount(&mock_server)
        .await;

    let manager = SessionManager::new(test_config());
    let (id, mut stream) = manager.start(CrawlRequest::new(mock_server.uri())).unwrap();

    loop {
        match stream.next_event().await {
            Some(CrawlEvent::PageCrawled { .. }) => break,
            Some(_) => continue,
            None => panic!("stream ended before the first page"),
        }
    }

    manager.cancel(id).await.unwrap();

    let mut rest = Vec::new();
    while let Some(event) = stream.next_event().await {
        rest.push(event);
    }

    assert!(matches!(rest.last(), Some(CrawlEvent::Cancelled { .. })));
    assert!(!rest.iter().any(|e| matches!(e, CrawlEvent::Complete(_))));
    assert!(manager.status(id).is_none());
}

#[tokio::test]
async fn test_disconnect_cancels_session() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", html(r#"<a href="/next">next</a>"#)).await;
    mount_page(&mock_server, "/next", html("")).await;

    let manager = SessionManager::new(test_config());
    let (id, stream) = manager.start(CrawlRequest::new(mock_server.uri())).unwrap();
    drop(stream);

    let mut status = None;
    for _ in 0..50 {
        status = manager.status(id).map(|s| s.status);
        if status.is_some_and(|s| s.is_terminal()) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    assert_eq!(status, Some(SessionStatus::Cancelled));
    assert_eq!(manager.reap_expired(), 1);
    assert!(manager.is_empty());
}

#[tokio::test]
async fn test_invalid_seed_is_rejected() {
    let manager = SessionManager::new(test_config());

    for seed in ["", "ftp://example.com/", "https://"] {
        let result = manager.start(CrawlRequest::new(seed));
        assert!(
            matches!(result, Err(RankError::InvalidSeed { .. })),
            "{:?} should be rejected",
            seed
        );
    }
    assert!(manager.is_empty());
}

#[tokio::test]
async fn test_events_serialize_as_json_lines() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", html("")).await;

    let manager = SessionManager::new(test_config());
    let events = run_session(&manager, CrawlRequest::new(mock_server.uri())).await;

    let kinds: Vec<String> = events
        .iter()
        .map(|e| {
            let value: serde_json::Value = serde_json::from_str(&e.to_json().unwrap()).unwrap();
            value["type"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(kinds, vec!["page_crawled", "progress", "complete"]);
}
