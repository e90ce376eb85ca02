use crate::error::FetchError;

/// Notification sent to the render surface after the view model touched
/// (or declined to touch) the view state.
#[derive(Debug, Clone, PartialEq)]
pub struct Incoming {
    pub endpoint: String,
    pub kind: IncomingKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IncomingKind {
    /// Top-level keys written by a shallow merge.
    Merged(Vec<String>),
    /// `events` was replaced with this many entries.
    Events(usize),
    /// An events response arrived for a selection that is no longer current.
    StaleEvents,
    Failed(FetchError),
    Stopped,
}

impl Incoming {
    pub fn merged(endpoint: String, keys: Vec<String>) -> Self {
        Self {
            endpoint,
            kind: IncomingKind::Merged(keys),
        }
    }

    pub fn events(endpoint: String, count: usize) -> Self {
        Self {
            endpoint,
            kind: IncomingKind::Events(count),
        }
    }

    pub fn stale_events(endpoint: String) -> Self {
        Self {
            endpoint,
            kind: IncomingKind::StaleEvents,
        }
    }

    pub fn failed(endpoint: String, err: FetchError) -> Self {
        Self {
            endpoint,
            kind: IncomingKind::Failed(err),
        }
    }

    pub fn stopped() -> Self {
        Self {
            endpoint: String::new(),
            kind: IncomingKind::Stopped,
        }
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self.kind, IncomingKind::Stopped)
    }
}
