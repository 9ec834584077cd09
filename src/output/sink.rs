use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;

/// One target word found on one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// Domain entry the page was crawled under
    pub domain: String,

    /// URL the page content came from
    pub url: String,

    /// The target word as given in the word list
    pub word: String,

    /// When the match was recorded
    pub timestamp: DateTime<Utc>,
}

impl MatchResult {
    /// Creates a match stamped with the current time
    pub fn new(domain: impl Into<String>, url: impl Into<String>, word: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            url: url.into(),
            word: word.into(),
            timestamp: Utc::now(),
        }
    }

    /// Returns the CSV fields in column order
    pub fn to_row(&self) -> [String; 4] {
        [
            self.domain.clone(),
            self.url.clone(),
            self.word.clone(),
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        ]
    }
}

/// Append-only collector shared by all workers
///
/// Appends from concurrent workers are serialized by one lock; the order of
/// the snapshot is the order in which `record` calls won that lock.
#[derive(Debug, Default)]
pub struct ResultSink {
    results: Mutex<Vec<MatchResult>>,
}

impl ResultSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one match
    pub fn record(&self, result: MatchResult) {
        self.results.lock().push(result);
    }

    /// Returns a copy of every match recorded so far, in append order
    pub fn snapshot(&self) -> Vec<MatchResult> {
        self.results.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.results.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.lock().is_empty()
    }
}
