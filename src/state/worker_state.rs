/// Worker state definitions for tracking one candidate's progress
///
/// A detail worker moves through these states exactly once, in order, and may
/// jump from `Fetching` or `Parsing` straight to `Done`.
use std::fmt;

/// Represents the current state of a detail worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerState {
    /// Worker holds its URL and rank but has not started
    Created,

    /// Detail page request is in flight
    Fetching,

    /// Page body is being validated and parsed
    Parsing,

    /// Record is being built, cached and pushed to the sink
    Emitting,

    /// Terminal; the worker has exited
    Done,
}

impl WorkerState {
    /// Returns true if this is the terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: WorkerState) -> bool {
        matches!(
            (self, next),
            (Self::Created, Self::Fetching)
                | (Self::Created, Self::Done)
                | (Self::Fetching, Self::Parsing)
                | (Self::Fetching, Self::Done)
                | (Self::Parsing, Self::Emitting)
                | (Self::Parsing, Self::Done)
                | (Self::Emitting, Self::Done)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Fetching => "fetching",
            Self::Parsing => "parsing",
            Self::Emitting => "emitting",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a detail worker ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerOutcome {
    /// A record was pushed to the result sink
    Emitted,

    /// HTTP 404, a 404 page, or an error page
    NotFound,

    /// The detail request timed out
    TimedOut,

    /// Any other network failure
    NetworkError,

    /// Title, authors or Shelfari id could not be extracted
    Incomplete,

    /// The abort signal fired before the record was emitted
    Aborted,
}

impl WorkerOutcome {
    /// Returns true if this outcome produced a record
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Emitted)
    }

    /// Returns true if this outcome represents a fetch or page failure
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound | Self::TimedOut | Self::NetworkError | Self::Incomplete
        )
    }
}

impl fmt::Display for WorkerOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Emitted => "emitted",
            Self::NotFound => "not_found",
            Self::TimedOut => "timed_out",
            Self::NetworkError => "network_error",
            Self::Incomplete => "incomplete",
            Self::Aborted => "aborted",
        };
        f.write_str(s)
    }
}
