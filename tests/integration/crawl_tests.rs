//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use std::net::TcpListener;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;
use word_ripple::config::{Config, UserAgentConfig};
use word_ripple::crawler::{
    build_http_client, crawl, Coordinator, FetchFailure, FetchOutcome, Fetcher, FollowAll,
    RedirectCheck, RedirectGuard,
};
use word_ripple::state::DomainPhase;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration without politeness delay
fn create_test_config(max_pages: u32) -> Config {
    let mut config = Config::default();
    config.crawler.max_pages_per_domain = max_pages;
    config.crawler.workers = 4;
    config.crawler.delay_ms = 0;
    config.crawler.request_timeout_secs = 5;
    config
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><head><title>Test</title></head><body>{}</body></html>", body),
        "text/html; charset=utf-8",
    )
}

async fn mount_page(server: &MockServer, page: &str, body: &str, expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html(body))
        .expect(expected_hits)
        .mount(server)
        .await;
}

/// Returns a local port with nothing listening on it
fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let port = listener.local_addr().expect("No local address").port();
    drop(listener);
    port
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn test_fetcher(max_body_bytes: usize) -> Fetcher {
    let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(5))
        .expect("Failed to build client");
    Fetcher::new(client, max_body_bytes)
}

fn target(url: &str) -> Url {
    Url::parse(url).expect("Invalid test URL")
}

#[tokio::test]
async fn test_page_cap_stops_domain() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        &format!(
            r#"<a href="{0}/page1">Page 1</a>
               <a href="{0}/page2">Page 2</a>
               <a href="https://external.example/page3">External</a>"#,
            base_url
        ),
        1,
    )
    .await;
    mount_page(&mock_server, "/page1", "<p>first child</p>", 1).await;
    mount_page(&mock_server, "/page2", "<p>second child</p>", 0).await;

    let report = crawl(
        &create_test_config(2),
        &[base_url.clone()],
        &strings(&["child"]),
        CancellationToken::new(),
    )
    .await
    .expect("Crawl failed");

    let domain = report.domain(&base_url).expect("Domain missing from report");
    assert_eq!(domain.pages_fetched, 2);
    assert_eq!(domain.pages_failed, 0);
    assert_eq!(domain.phase, DomainPhase::Capped);
    assert!(!report.cancelled);

    // Only the root and the first child were requested
    let requests = mock_server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.url.path() != "/page2"));

    assert_eq!(report.matches.len(), 1);
    assert!(report.matches[0].url.ends_with("/page1"));
}

#[tokio::test]
async fn test_bengali_whole_word_matching() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<p>আমরা বাংলাদেশে থাকি।</p><a href="/about">সম্পর্কে</a>"#,
        1,
    )
    .await;
    mount_page(&mock_server, "/about", "<p>বাংলাদেশ একটি দেশ।</p>", 1).await;

    let report = crawl(
        &create_test_config(10),
        &[base_url.clone()],
        &strings(&["বাংলাদেশ"]),
        CancellationToken::new(),
    )
    .await
    .expect("Crawl failed");

    assert_eq!(report.matches.len(), 1);
    let found = &report.matches[0];
    assert_eq!(found.domain, base_url);
    assert_eq!(found.url, format!("{}/about", base_url));
    assert_eq!(found.word, "বাংলাদেশ");

    let domain = report.domain(&base_url).unwrap();
    assert_eq!(domain.pages_fetched, 2);
    assert_eq!(domain.matches, 1);
    assert_eq!(domain.phase, DomainPhase::Exhausted);
}

#[tokio::test]
async fn test_script_text_is_not_matched() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<script>var word = "সফটওয়্যার";</script><p>কিছু নেই</p>"#,
        1,
    )
    .await;

    let report = crawl(
        &create_test_config(10),
        &[base_url.clone()],
        &strings(&["সফটওয়্যার"]),
        CancellationToken::new(),
    )
    .await
    .expect("Crawl failed");

    assert!(report.matches.is_empty());
    assert_eq!(report.total_fetched(), 1);
}

#[tokio::test]
async fn test_failed_link_is_abandoned_and_crawl_continues() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dead = format!("https://127.0.0.1:{}/dead", closed_port());

    mount_page(
        &mock_server,
        "/",
        &format!(r#"<a href="{}">Dead</a><a href="/next">Next</a>"#, dead),
        1,
    )
    .await;
    mount_page(&mock_server, "/next", "<p>আমাদের দেশ</p>", 1).await;

    let report = crawl(
        &create_test_config(10),
        &[base_url.clone()],
        &strings(&["আমাদের"]),
        CancellationToken::new(),
    )
    .await
    .expect("Crawl failed");

    let domain = report.domain(&base_url).unwrap();
    assert_eq!(domain.pages_fetched, 3);
    assert_eq!(domain.pages_failed, 1);
    assert_eq!(domain.phase, DomainPhase::Exhausted);

    assert_eq!(report.matches.len(), 1);
    assert!(report.matches[0].url.ends_with("/next"));
    assert!(report.matches.iter().all(|m| !m.url.contains("/dead")));
}

#[tokio::test]
async fn test_pages_are_fetched_once_despite_cycles() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", r#"<a href="/a">A</a><a href="/b">B</a>"#, 1).await;
    mount_page(
        &mock_server,
        "/a",
        r##"<a href="/">Home</a><a href="/b#top">B</a><a href="/a?utm_source=x">Self</a>"##,
        1,
    )
    .await;
    mount_page(&mock_server, "/b", r#"<a href="/a">A</a><a href="/">Home</a>"#, 1).await;

    let report = crawl(
        &create_test_config(50),
        &[base_url.clone()],
        &strings(&["nothing"]),
        CancellationToken::new(),
    )
    .await
    .expect("Crawl failed");

    let domain = report.domain(&base_url).unwrap();
    assert_eq!(domain.pages_fetched, 3);
    assert_eq!(domain.phase, DomainPhase::Exhausted);
    assert_eq!(mock_server.received_requests().await.unwrap_or_default().len(), 3);
}

#[tokio::test]
async fn test_depth_limit_stops_link_discovery() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", r#"<a href="/level1">Down</a>"#, 1).await;
    mount_page(&mock_server, "/level1", r#"<a href="/level2">Down</a>"#, 1).await;
    mount_page(&mock_server, "/level2", "<p>too deep</p>", 0).await;

    let mut config = create_test_config(50);
    config.crawler.max_depth = 1;

    let report = crawl(
        &config,
        &[base_url.clone()],
        &strings(&["deep"]),
        CancellationToken::new(),
    )
    .await
    .expect("Crawl failed");

    assert_eq!(report.total_fetched(), 2);
    assert!(report.matches.is_empty());
}

#[tokio::test]
async fn test_multiple_domains_crawled_independently() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;

    mount_page(&first, "/", r#"<a href="/x">X</a><p>দেশ</p>"#, 1).await;
    mount_page(&first, "/x", "<p>দেশ আবার</p>", 1).await;
    mount_page(&second, "/", "<p>আমাদের</p>", 1).await;

    let coordinator = Coordinator::new(
        &create_test_config(10),
        &[first.uri(), second.uri()],
        &strings(&["দেশ", "আমাদের"]),
    )
    .expect("Failed to create coordinator");

    let report = coordinator.run(CancellationToken::new()).await;

    assert_eq!(report.domains.len(), 2);
    assert_eq!(report.domain(&first.uri()).unwrap().pages_fetched, 2);
    assert_eq!(report.domain(&second.uri()).unwrap().pages_fetched, 1);
    assert!(report
        .domains
        .iter()
        .all(|d| d.phase == DomainPhase::Exhausted));

    assert_eq!(report.matches.len(), 3);
    assert_eq!(coordinator.sink().len(), 3);
}

fn redirect(location: &str) -> ResponseTemplate {
    ResponseTemplate::new(301).insert_header("location", location)
}

async fn mount_redirect(server: &MockServer, page: &str, location: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(redirect(location))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_redirect_to_queued_page_fetches_it_once() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", r#"<a href="/old">Old</a><a href="/new">New</a>"#, 1).await;
    mount_redirect(&mock_server, "/old", "/new").await;
    mount_page(&mock_server, "/new", r#"<p>নতুন খবর</p><a href="/old">Old</a>"#, 1).await;

    let mut config = create_test_config(10);
    config.crawler.workers = 1;

    let report = crawl(&config, &[base_url.clone()], &strings(&["খবর"]), CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(report.matches.len(), 1);
    assert_eq!(report.matches[0].url, format!("{}/new", base_url));

    let domain = report.domain(&base_url).unwrap();
    assert_eq!(domain.pages_fetched, 2);
    assert_eq!(domain.phase, DomainPhase::Exhausted);
}

#[tokio::test]
async fn test_redirect_to_fetched_page_is_not_followed() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", r#"<a href="/new">New</a><a href="/old">Old</a>"#, 1).await;
    mount_page(&mock_server, "/new", "<p>নতুন খবর</p>", 1).await;
    mount_redirect(&mock_server, "/old", "/new").await;

    let mut config = create_test_config(10);
    config.crawler.workers = 1;

    let report = crawl(&config, &[base_url.clone()], &strings(&["খবর"]), CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(report.matches.len(), 1);

    let domain = report.domain(&base_url).unwrap();
    assert_eq!(domain.pages_fetched, 3);
    assert_eq!(domain.pages_failed, 0);
}

#[tokio::test]
async fn test_off_domain_redirect_is_counted_but_not_matched() {
    let home = MockServer::start().await;
    let elsewhere = MockServer::start().await;
    let base_url = home.uri();

    // Same machine, different host name
    let foreign = format!("http://localhost:{}/landing", elsewhere.address().port());

    mount_page(&home, "/", r#"<p>শুরু</p><a href="/away">Away</a>"#, 1).await;
    mount_redirect(&home, "/away", &foreign).await;
    mount_page(&elsewhere, "/landing", "<p>বিদেশি খবর</p>", 0).await;

    let report = crawl(
        &create_test_config(10),
        &[base_url.clone()],
        &strings(&["খবর"]),
        CancellationToken::new(),
    )
    .await
    .expect("Crawl failed");

    assert!(report.matches.is_empty());

    let domain = report.domain(&base_url).unwrap();
    assert_eq!(domain.pages_fetched, 2);
    assert_eq!(domain.pages_failed, 0);
    assert_eq!(domain.phase, DomainPhase::Exhausted);
    assert!(elsewhere.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_cancellation_mid_run_keeps_partial_matches() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<p>খবর</p><a href="/slow">Slow</a><a href="/x">X</a><a href="/y">Y</a>"#,
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("<p>দেরির খবর</p>").set_delay(Duration::from_millis(1500)))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/x", "<p>খবর</p>", 0).await;
    mount_page(&mock_server, "/y", "<p>খবর</p>", 0).await;

    let mut config = create_test_config(10);
    config.crawler.workers = 1;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let report = crawl(&config, &[base_url.clone()], &strings(&["খবর"]), cancel)
        .await
        .expect("Crawl failed");

    assert!(report.cancelled);

    // The request in flight at cancellation completes and is kept
    let mut urls: Vec<_> = report.matches.iter().map(|m| m.url.clone()).collect();
    urls.sort();
    assert_eq!(urls, vec![format!("{}/", base_url), format!("{}/slow", base_url)]);

    let requests = mock_server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.url.path() != "/x" && r.url.path() != "/y"));
}

#[tokio::test]
async fn test_empty_word_list_is_rejected() {
    let result = crawl(
        &create_test_config(10),
        &strings(&["example.com"]),
        &[],
        CancellationToken::new(),
    )
    .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_fetch_sends_crawler_headers() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", "Mozilla/5.0 (compatible; BanglaCrawler/1.0)"))
        .and(header_exists("accept-language"))
        .respond_with(html("<p>ok</p>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = test_fetcher(1024 * 1024)
        .fetch(&target(&format!("{}/", mock_server.uri())), &FollowAll)
        .await;

    assert_eq!(result.attempts, 1);
    match result.outcome {
        FetchOutcome::Page { status, body } => {
            assert_eq!(status, 200);
            assert!(body.contains("<p>ok</p>"));
        }
        other => panic!("Unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_https_failure_falls_back_to_http() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/page", "<p>plain http</p>", 1).await;

    // The mock server only speaks plain HTTP, so the TLS handshake fails
    let mut url = Url::parse(&mock_server.uri()).unwrap();
    url.set_scheme("https").unwrap();
    url.set_path("/page");

    let result = test_fetcher(1024 * 1024).fetch(&url, &FollowAll).await;

    assert_eq!(result.attempts, 2);
    assert_eq!(result.final_url.scheme(), "http");
    assert_eq!(result.final_url.path(), "/page");
    assert!(matches!(result.outcome, FetchOutcome::Page { .. }));
}

#[tokio::test]
async fn test_https_failure_on_both_schemes_is_network_failure() {
    let url = format!("https://127.0.0.1:{}/", closed_port());
    let result = test_fetcher(1024 * 1024).fetch(&target(&url), &FollowAll).await;

    assert_eq!(result.attempts, 2);
    assert_eq!(result.final_url.scheme(), "http");
    match result.outcome {
        FetchOutcome::Failed(failure) => assert!(failure.is_network()),
        other => panic!("Closed port produced {:?}", other),
    }
}

#[tokio::test]
async fn test_http_failure_has_no_fallback() {
    let url = format!("http://127.0.0.1:{}/", closed_port());
    let result = test_fetcher(1024 * 1024).fetch(&target(&url), &FollowAll).await;

    assert_eq!(result.attempts, 1);
    assert!(matches!(
        result.outcome,
        FetchOutcome::Failed(FetchFailure::Network(_))
    ));
}

#[tokio::test]
async fn test_http_error_status_is_not_retried() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = test_fetcher(1024 * 1024)
        .fetch(&target(&format!("{}/missing", mock_server.uri())), &FollowAll)
        .await;

    assert_eq!(result.attempts, 1);
    assert!(matches!(
        result.outcome,
        FetchOutcome::Failed(FetchFailure::HttpStatus(404))
    ));
}

#[tokio::test]
async fn test_non_html_content_is_rejected() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/file.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"))
        .mount(&mock_server)
        .await;

    let result = test_fetcher(1024 * 1024)
        .fetch(&target(&format!("{}/file.pdf", mock_server.uri())), &FollowAll)
        .await;

    assert!(matches!(
        result.outcome,
        FetchOutcome::Failed(FetchFailure::NotHtml(ref ct)) if ct.starts_with("application/pdf")
    ));
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let mock_server = MockServer::start().await;
    let big = format!("<html><body>{}</body></html>", "ক".repeat(4096));
    Mock::given(method("GET"))
        .and(path("/big"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(big, "text/html"))
        .mount(&mock_server)
        .await;

    let result = test_fetcher(1024)
        .fetch(&target(&format!("{}/big", mock_server.uri())), &FollowAll)
        .await;

    assert!(matches!(
        result.outcome,
        FetchOutcome::Failed(FetchFailure::TooLarge { limit: 1024 })
    ));
}

#[tokio::test]
async fn test_undecodable_body_is_decode_failure() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            b"<html><body>\xff\xfe\xc3\x28</body></html>".to_vec(),
            "text/html; charset=utf-8",
        ))
        .mount(&mock_server)
        .await;

    let result = test_fetcher(1024 * 1024)
        .fetch(&target(&format!("{}/broken", mock_server.uri())), &FollowAll)
        .await;

    assert_eq!(result.attempts, 1);
    assert!(matches!(
        result.outcome,
        FetchOutcome::Failed(FetchFailure::Decode { .. })
    ));
}

#[tokio::test]
async fn test_fetch_follows_redirect_chain() {
    let mock_server = MockServer::start().await;
    mount_redirect(&mock_server, "/first", "/second").await;
    Mock::given(method("GET"))
        .and(path("/second"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/final"))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/final", "<p>landed</p>", 1).await;

    let result = test_fetcher(1024 * 1024)
        .fetch(&target(&format!("{}/first", mock_server.uri())), &FollowAll)
        .await;

    assert_eq!(result.attempts, 1);
    assert_eq!(result.final_url.path(), "/final");
    assert!(matches!(result.outcome, FetchOutcome::Page { status: 200, .. }));
}

#[tokio::test]
async fn test_fetch_detects_redirect_loop() {
    let mock_server = MockServer::start().await;
    mount_redirect(&mock_server, "/a", "/b").await;
    mount_redirect(&mock_server, "/b", "/a").await;

    let result = test_fetcher(1024 * 1024)
        .fetch(&target(&format!("{}/a", mock_server.uri())), &FollowAll)
        .await;

    assert_eq!(result.attempts, 1);
    assert!(matches!(
        result.outcome,
        FetchOutcome::Failed(FetchFailure::RedirectLoop(_))
    ));
}

/// Refuses every redirect to another page
struct StayPut;

impl RedirectGuard for StayPut {
    fn check(&self, _target: &Url) -> RedirectCheck {
        RedirectCheck::AlreadyVisited
    }
}

#[tokio::test]
async fn test_refused_redirect_is_not_requested() {
    let mock_server = MockServer::start().await;
    mount_redirect(&mock_server, "/old", "/new").await;
    mount_page(&mock_server, "/new", "<p>never</p>", 0).await;

    let result = test_fetcher(1024 * 1024)
        .fetch(&target(&format!("{}/old", mock_server.uri())), &StayPut)
        .await;

    assert_eq!(result.final_url.path(), "/new");
    assert!(matches!(
        result.outcome,
        FetchOutcome::Skipped(RedirectCheck::AlreadyVisited)
    ));
}
