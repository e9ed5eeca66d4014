//! Fetching resource bodies.

use std::time::Duration;

use async_trait::async_trait;
use ureq::Agent;

/// Error fetching a resource.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP request failed (network error, timeout, etc).
    #[error("HTTP request failed: {0}")]
    Request(#[from] ureq::Error),
    /// Server returned an error status.
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },
    /// The blocking request task panicked or was cancelled.
    #[error("fetch task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Fetches resource bodies as text.
#[async_trait(?Send)]
pub trait Fetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

/// [`Fetcher`] backed by a shared `ureq` agent.
///
/// Requests run on the blocking pool so concurrent fetches interleave on a
/// single-threaded runtime.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    agent: Agent,
}

impl HttpFetcher {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self { agent }
    }
}

#[async_trait(?Send)]
impl Fetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let agent = self.agent.clone();
        let url = url.to_owned();
        tokio::task::spawn_blocking(move || {
            tracing::debug!(%url, "Fetching resource");
            let response = agent.get(&url).call()?;
            let status = response.status().as_u16();
            if status >= 400 {
                return Err(FetchError::Status { status, url });
            }
            Ok(response.into_body().read_to_string()?)
        })
        .await?
    }
}
