//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the worker pool that drives a crawl run:
//! - Creating and seeding one frontier per input domain
//! - Handing tasks to a fixed number of workers, round-robin across domains
//! - Running each task through rate limiter, fetcher, matcher and link extractor
//! - Detecting the end of the run and building the final report
//!
//! Workers never wait on each other. An idle worker parks on a shared
//! notification that every completed task fires, so it wakes up either to new
//! work or to find that every frontier has closed.

use crate::config::{validate, Config};
use crate::crawler::fetcher::{
    build_http_client, FetchOutcome, Fetcher, RedirectCheck, RedirectGuard,
};
use crate::crawler::matcher::WordMatcher;
use crate::crawler::parser::parse_html;
use crate::crawler::rate_limiter::RateLimiter;
use crate::output::{MatchResult, ResultSink};
use crate::state::{CrawlTask, DomainPhase, Frontier};
use crate::url::{normalize_host, same_domain, seed_url};
use crate::CrawlerError;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Final state of one domain after a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainReport {
    /// Domain entry as given
    pub domain: String,
    /// Starting URL
    pub seed_url: String,
    pub phase: DomainPhase,
    /// Completed tasks, failed ones included
    pub pages_fetched: u32,
    pub pages_failed: u32,
    pub matches: u32,
    /// Tasks left unvisited (only non-zero after cancellation)
    pub pages_queued: usize,
}

/// Outcome of a crawl run
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// One entry per crawled domain, in input order
    pub domains: Vec<DomainReport>,
    /// Every match, in the order workers recorded them
    pub matches: Vec<MatchResult>,
    /// True if the run was stopped from outside
    pub cancelled: bool,
    pub elapsed: Duration,
}

impl CrawlReport {
    pub fn domain(&self, domain: &str) -> Option<&DomainReport> {
        self.domains.iter().find(|d| d.domain == domain)
    }

    pub fn total_fetched(&self) -> u32 {
        self.domains.iter().map(|d| d.pages_fetched).sum()
    }

    pub fn total_failed(&self) -> u32 {
        self.domains.iter().map(|d| d.pages_failed).sum()
    }
}

/// A domain's frontier plus its counters
#[derive(Debug)]
struct DomainSlot {
    frontier: Frontier,
    seed: Url,
    failed: AtomicU32,
    matches: AtomicU32,
}

/// Redirects stay on the seed's domain and never reach a URL this domain
/// already requested. A followed target is claimed as visited.
impl RedirectGuard for DomainSlot {
    fn check(&self, target: &Url) -> RedirectCheck {
        if !same_domain(target, &self.seed) {
            RedirectCheck::OffDomain
        } else if !self.frontier.mark_visited(target) {
            RedirectCheck::AlreadyVisited
        } else {
            RedirectCheck::Follow
        }
    }
}

impl DomainSlot {
    fn report(&self) -> DomainReport {
        DomainReport {
            domain: self.frontier.domain().to_string(),
            seed_url: self.seed.to_string(),
            phase: self.frontier.phase(),
            pages_fetched: self.frontier.fetched(),
            pages_failed: self.failed.load(Ordering::Relaxed),
            matches: self.matches.load(Ordering::Relaxed),
            pages_queued: self.frontier.queued(),
        }
    }
}

/// State shared by all workers
struct Shared {
    slots: Vec<DomainSlot>,
    fetcher: Fetcher,
    rate_limiter: RateLimiter,
    matcher: WordMatcher,
    sink: Arc<ResultSink>,
    max_depth: Option<u32>,
    cursor: AtomicUsize,
    work_ready: Notify,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    shared: Arc<Shared>,
    workers: usize,
}

impl Coordinator {
    /// Creates a coordinator with one seeded frontier per domain
    ///
    /// Domains that normalize to the same host collapse into one frontier,
    /// the first spelling wins. Entries that cannot form a URL are logged and
    /// skipped.
    ///
    /// # Errors
    ///
    /// * `Config` - the configuration is out of range
    /// * `EmptyInput` - no domains or no usable target words
    /// * `InvalidDomain` - not a single domain entry was usable
    /// * `HttpClient` - the HTTP client could not be built
    pub fn new(config: &Config, domains: &[String], words: &[String]) -> Result<Self, CrawlerError> {
        validate(config)?;

        if domains.iter().all(|d| d.trim().is_empty()) {
            return Err(CrawlerError::EmptyInput("domain"));
        }

        let matcher = WordMatcher::new(words);
        if matcher.is_empty() {
            return Err(CrawlerError::EmptyInput("word"));
        }

        let max_pages = config.crawler.max_pages_per_domain;
        let mut slots = Vec::new();
        let mut hosts = HashSet::new();
        let mut first_error = None;

        for entry in domains.iter().map(|d| d.trim()).filter(|d| !d.is_empty()) {
            let seed = match seed_url(entry) {
                Ok(seed) => seed,
                Err(source) => {
                    tracing::warn!(domain = entry, "skipping domain: {}", source);
                    first_error.get_or_insert(CrawlerError::InvalidDomain {
                        domain: entry.to_string(),
                        source,
                    });
                    continue;
                }
            };

            if !hosts.insert(host_key(&seed)) {
                tracing::debug!(domain = entry, "duplicate domain ignored");
                continue;
            }

            let frontier = Frontier::new(entry, max_pages);
            frontier.seed(seed.clone());
            slots.push(DomainSlot {
                frontier,
                seed,
                failed: AtomicU32::new(0),
                matches: AtomicU32::new(0),
            });
        }

        if slots.is_empty() {
            return Err(first_error.unwrap_or(CrawlerError::EmptyInput("domain")));
        }

        let client = build_http_client(&config.user_agent, config.crawler.request_timeout())?;

        tracing::info!(
            "Prepared {} domain(s) and {} target word(s)",
            slots.len(),
            matcher.len()
        );

        Ok(Self {
            shared: Arc::new(Shared {
                slots,
                fetcher: Fetcher::new(client, config.crawler.max_body_bytes),
                rate_limiter: RateLimiter::new(config.crawler.delay()),
                matcher,
                sink: Arc::new(ResultSink::new()),
                max_depth: config.crawler.depth_limit(),
                cursor: AtomicUsize::new(0),
                work_ready: Notify::new(),
            }),
            workers: config.crawler.workers.max(1) as usize,
        })
    }

    /// The sink matches are recorded into
    pub fn sink(&self) -> Arc<ResultSink> {
        Arc::clone(&self.shared.sink)
    }

    /// Current state of every domain
    pub fn domain_reports(&self) -> Vec<DomainReport> {
        self.shared.slots.iter().map(DomainSlot::report).collect()
    }

    /// Runs the crawl until every frontier is closed or `cancel` fires
    ///
    /// Cancellation stops workers from taking new tasks and interrupts
    /// politeness waits; requests already on the wire are allowed to finish.
    pub async fn run(&self, cancel: CancellationToken) -> CrawlReport {
        let start_time = Instant::now();
        tracing::info!(
            "Starting crawl of {} domain(s) with {} worker(s)",
            self.shared.slots.len(),
            self.workers
        );

        let mut workers = JoinSet::new();
        for id in 0..self.workers {
            workers.spawn(worker_loop(Arc::clone(&self.shared), id, cancel.clone()));
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Worker task failed: {}", e);
            }
        }

        let domains = self.domain_reports();
        for report in &domains {
            tracing::info!(
                domain = %report.domain,
                phase = %report.phase,
                fetched = report.pages_fetched,
                failed = report.pages_failed,
                matches = report.matches,
                "Domain finished"
            );
        }

        let elapsed = start_time.elapsed();
        let cancelled = cancel.is_cancelled();
        tracing::info!(
            "Crawl {} in {:.1}s: {} page(s), {} match(es)",
            if cancelled { "cancelled" } else { "complete" },
            elapsed.as_secs_f64(),
            domains.iter().map(|d| d.pages_fetched).sum::<u32>(),
            self.shared.sink.len()
        );

        CrawlReport {
            domains,
            matches: self.shared.sink.snapshot(),
            cancelled,
            elapsed,
        }
    }
}

/// Identity of a domain for de-duplication: normalized host plus explicit port
fn host_key(url: &Url) -> String {
    let host = url.host_str().map(normalize_host).unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    }
}

async fn worker_loop(shared: Arc<Shared>, id: usize, cancel: CancellationToken) {
    tracing::trace!(worker = id, "worker started");

    loop {
        if cancel.is_cancelled() {
            break;
        }

        // Register interest before scanning so a completion between the scan
        // and the wait is not missed.
        let notified = shared.work_ready.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        match shared.next_task() {
            Some((slot, task)) => shared.process_task(slot, task, &cancel).await,
            None => {
                if shared.all_closed() {
                    break;
                }
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = &mut notified => {}
                }
            }
        }
    }

    tracing::trace!(worker = id, "worker stopped");
}

impl Shared {
    /// Takes a task from the first domain with work, starting at the cursor
    fn next_task(&self) -> Option<(&DomainSlot, CrawlTask)> {
        let count = self.slots.len();
        let start = self.cursor.fetch_add(1, Ordering::Relaxed);

        (0..count).find_map(|offset| {
            let slot = &self.slots[(start + offset) % count];
            slot.frontier.take().map(|task| (slot, task))
        })
    }

    fn all_closed(&self) -> bool {
        self.slots.iter().all(|slot| slot.frontier.is_closed())
    }

    /// Runs one task to completion and records it on its frontier
    async fn process_task(&self, slot: &DomainSlot, task: CrawlTask, cancel: &CancellationToken) {
        let domain = slot.frontier.domain();

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(domain, url = %task.url, "cancelled before request");
                return;
            }
            _ = self.rate_limiter.acquire(domain) => {}
        }

        let depth = task.depth;
        let result = self.fetcher.fetch(&task.url, slot).await;
        let final_url = result.final_url;

        match result.outcome {
            FetchOutcome::Page { status, body } => {
                let page = parse_html(&body, &final_url);

                let words = self.matcher.find_matches(&page.text);
                for word in &words {
                    self.sink
                        .record(MatchResult::new(domain, final_url.as_str(), word.as_str()));
                }
                slot.matches.fetch_add(words.len() as u32, Ordering::Relaxed);

                let mut admitted = 0;
                if self.max_depth.map_or(true, |max| depth < max) {
                    for link in page.links {
                        if slot.frontier.offer(link, depth + 1) {
                            admitted += 1;
                        }
                    }
                }

                tracing::info!(
                    domain,
                    url = %final_url,
                    status,
                    attempts = result.attempts,
                    matches = words.len(),
                    new_links = admitted,
                    "Crawled page"
                );
            }
            FetchOutcome::Skipped(check) => {
                tracing::info!(
                    domain,
                    url = %task.url,
                    target = %final_url,
                    "Redirect not followed: {}",
                    check
                );
            }
            FetchOutcome::Failed(failure) => {
                slot.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    domain,
                    url = %final_url,
                    attempts = result.attempts,
                    "Failed to fetch: {}",
                    failure
                );
            }
        }

        let phase = slot.frontier.record_fetched();
        if phase.is_terminal() {
            tracing::debug!(domain, %phase, "Frontier closed");
        }

        self.work_ready.notify_waiters();
    }
}
