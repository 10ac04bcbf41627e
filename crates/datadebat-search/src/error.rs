use thiserror::Error;

/// Errors returned by the search-engine client.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The engine answered with a non-2xx status.
    #[error("search engine returned {status} for {context}: {body}")]
    UnexpectedStatus {
        status: u16,
        context: String,
        body: String,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The startup ping failed.
    #[error("search engine unreachable at {url}: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("invalid search engine URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl SearchError {
    /// HTTP status carried by the error, if the engine answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            SearchError::UnexpectedStatus { status, .. } => Some(*status),
            SearchError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
