mod http;

pub use http::HttpLoader;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("HTTP error {status} fetching {url}: {message}")]
    Http {
        url: String,
        status: u16,
        message: String,
    },
    #[error("Network error fetching {url}: {reason}")]
    Network { url: String, reason: String },
    #[error("Timeout fetching {url}")]
    Timeout { url: String },
}

impl LoadError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Trait for the relay's two network primitives: existence probes and the
/// indirection fetch.
///
/// `probe` is deliberately infallible: network errors, timeouts, and non-2xx
/// statuses all collapse to `false`. A failed probe means "not available
/// yet", and the user re-opening the menu is the retry mechanism — there is
/// no internal retry.
///
/// The trait is object-safe and Send + Sync for use across async tasks.
#[async_trait]
pub trait RelayLoader: Send + Sync {
    /// Lightweight existence check (HEAD). True means reachable.
    async fn probe(&self, url: &str) -> bool;

    /// Fetch the body at `url` (GET). Used for the indirection step, where
    /// the body text is the next-stage manifest URL.
    async fn fetch_text(&self, url: &str) -> Result<String, LoadError>;
}
