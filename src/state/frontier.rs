use crate::state::DomainPhase;
use crate::url::visit_key;
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use url::Url;

/// One unit of crawl work: a page of a domain at some discovery depth
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    /// The domain entry this task belongs to
    pub domain: String,

    /// The URL to fetch
    pub url: Url,

    /// Link distance from the domain's starting URL
    pub depth: u32,
}

/// Per-domain crawl queue with de-duplication and a page cap
///
/// The frontier owns its queue, its visited-set and its counters; all of
/// them are mutated only through the methods below, under one lock, so the
/// operations are linearizable with respect to each other. Frontiers of
/// different domains share nothing.
///
/// Admission accounts for pages already fetched, pages taken but not yet
/// recorded (in flight) and pages still queued. Their sum never exceeds
/// `max_pages`, so the fetched count can never pass the cap.
///
/// Besides the set of URLs ever queued, the frontier keeps the set of URLs
/// actually requested: task URLs when taken, redirect targets when followed.
/// A queued URL that was reached through a redirect in the meantime is
/// dropped by `take` instead of being requested again.
#[derive(Debug)]
pub struct Frontier {
    domain: String,
    max_pages: u32,
    inner: Mutex<FrontierInner>,
}

#[derive(Debug)]
struct FrontierInner {
    queue: VecDeque<CrawlTask>,
    seen: HashSet<String>,
    visited: HashSet<String>,
    fetched: u32,
    in_flight: u32,
    phase: DomainPhase,
}

impl FrontierInner {
    fn committed(&self) -> u32 {
        self.fetched + self.in_flight + self.queue.len() as u32
    }
}

impl Frontier {
    /// Creates an empty frontier for `domain` holding at most `max_pages` pages
    pub fn new(domain: impl Into<String>, max_pages: u32) -> Self {
        Self {
            domain: domain.into(),
            max_pages,
            inner: Mutex::new(FrontierInner {
                queue: VecDeque::new(),
                seen: HashSet::new(),
                visited: HashSet::new(),
                fetched: 0,
                in_flight: 0,
                phase: DomainPhase::Seeded,
            }),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    /// Queues the domain's starting URL unless the frontier is closed
    pub fn seed(&self, start_url: Url) -> bool {
        self.offer(start_url, 0)
    }

    /// Queues `url` if it was never queued before and the page budget allows
    ///
    /// Returns true if the URL was admitted. Rejection is silent: offering a
    /// known URL, offering past the cap, or offering to a closed frontier
    /// are all no-ops.
    pub fn offer(&self, url: Url, depth: u32) -> bool {
        let mut inner = self.inner.lock();

        if inner.phase.is_terminal() || inner.committed() >= self.max_pages {
            return false;
        }

        if !inner.seen.insert(visit_key(&url)) {
            return false;
        }

        inner.queue.push_back(CrawlTask {
            domain: self.domain.clone(),
            url,
            depth,
        });
        true
    }

    /// Pops the next task in FIFO order and marks its URL visited
    ///
    /// Queued URLs that were already visited through a redirect are dropped.
    /// Returns None when the queue is drained or the frontier is closed. A
    /// drained queue with nothing in flight moves the frontier to
    /// `Exhausted`.
    pub fn take(&self) -> Option<CrawlTask> {
        let mut inner = self.inner.lock();

        if inner.phase.is_terminal() {
            return None;
        }

        while let Some(task) = inner.queue.pop_front() {
            if inner.visited.insert(visit_key(&task.url)) {
                inner.in_flight += 1;
                inner.phase = DomainPhase::Active;
                return Some(task);
            }
        }

        if inner.in_flight == 0 {
            inner.phase = DomainPhase::Exhausted;
        }
        None
    }

    /// Marks a redirect target as visited
    ///
    /// Returns false if the page was already requested for this domain. The
    /// URL also counts as queued from now on, so later offers of it are
    /// rejected. Budget is not affected: the request belongs to the task
    /// that was redirected.
    pub fn mark_visited(&self, url: &Url) -> bool {
        let mut inner = self.inner.lock();
        let key = visit_key(url);
        inner.seen.insert(key.clone());
        inner.visited.insert(key)
    }

    /// Records one completed task, whatever its outcome
    ///
    /// A failed fetch consumes budget like a successful one. Returns the
    /// phase after the update.
    pub fn record_fetched(&self) -> DomainPhase {
        let mut inner = self.inner.lock();

        inner.fetched += 1;
        inner.in_flight = inner.in_flight.saturating_sub(1);

        if inner.fetched >= self.max_pages {
            inner.phase = DomainPhase::Capped;
            inner.queue.clear();
        } else if inner.queue.is_empty() && inner.in_flight == 0 {
            inner.phase = DomainPhase::Exhausted;
        }

        inner.phase
    }

    pub fn phase(&self) -> DomainPhase {
        self.inner.lock().phase
    }

    /// Returns true once the frontier is `Exhausted` or `Capped`
    pub fn is_closed(&self) -> bool {
        self.phase().is_terminal()
    }

    /// Number of pages fetched so far
    pub fn fetched(&self) -> u32 {
        self.inner.lock().fetched
    }

    /// Number of tasks waiting in the queue
    pub fn queued(&self) -> usize {
        self.inner.lock().queue.len()
    }

    /// Number of tasks taken but not yet recorded
    pub fn in_flight(&self) -> u32 {
        self.inner.lock().in_flight
    }
}
