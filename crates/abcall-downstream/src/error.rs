//! Downstream transport error types.
//!
//! A non-success HTTP status is NOT an error at this layer; it comes back as
//! a [`crate::DownstreamResponse`]. These variants cover the cases where no
//! usable response exists at all.

/// The downstream service could not be reached, or answered with something
/// that is not JSON.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection, DNS, TLS, or timeout failure.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The response body could not be read or is not valid JSON.
    #[error("non-JSON response from {endpoint} (status {status}): {source}")]
    InvalidBody {
        endpoint: String,
        status: u16,
        source: serde_json::Error,
    },
    /// The request payload could not be serialized.
    #[error("failed to encode request body for {endpoint}: {source}")]
    Encode {
        endpoint: String,
        source: serde_json::Error,
    },
    /// Base URL and relative path do not form a valid URL.
    #[error("invalid target URL {url:?}: {source}")]
    InvalidTarget {
        url: String,
        source: url::ParseError,
    },
    /// A caller-supplied identifier cannot be addressed as one path segment.
    #[error("identifier {0:?} is not a valid path segment")]
    InvalidSegment(String),
    /// The shared HTTP client could not be built.
    #[error("failed to initialize HTTP client: {0}")]
    ClientInit(reqwest::Error),
}

impl TransportError {
    /// The `METHOD /path` label of the failed call, when one was issued.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::Http { endpoint, .. }
            | Self::InvalidBody { endpoint, .. }
            | Self::Encode { endpoint, .. } => Some(endpoint),
            Self::InvalidTarget { .. } | Self::InvalidSegment(_) | Self::ClientInit(_) => None,
        }
    }

    /// Whether the request timed out rather than failing to connect.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http { source, .. } if source.is_timeout())
    }
}
