use std::fmt;

/// Lifecycle phase of a domain's crawl
///
/// ```text
/// Seeded -> Active -> Exhausted | Capped
/// ```
///
/// Both `Exhausted` and `Capped` are terminal: a frontier in either phase
/// produces no further tasks even if new links are offered for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainPhase {
    /// The starting URL is queued and nothing has been taken yet
    Seeded,

    /// Tasks are being drained
    Active,

    /// The queue ran dry with nothing in flight
    Exhausted,

    /// The page cap was reached
    Capped,
}

impl DomainPhase {
    /// Returns true if no more tasks will be produced
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Exhausted | Self::Capped)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seeded => "seeded",
            Self::Active => "active",
            Self::Exhausted => "exhausted",
            Self::Capped => "capped",
        }
    }
}

impl fmt::Display for DomainPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
