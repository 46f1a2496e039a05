/// Request state definitions for tracking crawl progress
use std::fmt;

/// Represents the current state of a crawl request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestState {
    // ===== Active States =====
    /// Waiting in the frontier for a worker slot
    Queued,

    /// Dispatched to a worker; retries stay in this state
    Fetching,

    // ===== Terminal States =====
    /// Fetched and run through every extraction strategy
    Extracted,

    /// Retries exhausted or a permanent error was hit
    Failed,

    /// Disallowed by robots.txt or the skip list; never fetched
    Blocked,
}

impl RequestState {
    /// Returns true if no further transition can happen from this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Extracted | Self::Failed | Self::Blocked)
    }

    /// Returns true if the move to `next` is allowed
    ///
    /// `Fetching -> Fetching` is a retry. Terminal states never change.
    pub fn can_transition_to(&self, next: RequestState) -> bool {
        match (self, next) {
            (Self::Queued, Self::Fetching) => true,
            (Self::Fetching, Self::Fetching) => true,
            (Self::Fetching, Self::Extracted | Self::Failed | Self::Blocked) => true,
            _ => false,
        }
    }

    /// Converts the state to its stored string form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Fetching => "fetching",
            Self::Extracted => "extracted",
            Self::Failed => "failed",
            Self::Blocked => "blocked",
        }
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
