use overview_core::Endpoint;

/// The two broad ways a fetch goes wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network, connect or timeout failure; no response was seen.
    Transport,
    /// A response arrived but was not usable (status or body).
    Response,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("request to {endpoint} failed: {detail}")]
    Transport { endpoint: String, detail: String },

    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("malformed body from {endpoint}: {detail}")]
    Body { endpoint: String, detail: String },

    #[error("invalid base url: {0}")]
    BaseUrl(String),
}

impl FetchError {
    pub fn transport(endpoint: &Endpoint, detail: impl Into<String>) -> Self {
        Self::Transport {
            endpoint: endpoint.to_string(),
            detail: detail.into(),
        }
    }

    pub fn status(endpoint: &Endpoint, status: u16) -> Self {
        Self::Status {
            endpoint: endpoint.to_string(),
            status,
        }
    }

    pub fn body(endpoint: &Endpoint, detail: impl Into<String>) -> Self {
        Self::Body {
            endpoint: endpoint.to_string(),
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport { .. } | Self::BaseUrl(_) => FailureKind::Transport,
            Self::Status { .. } | Self::Body { .. } => FailureKind::Response,
        }
    }
}
