use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::{LoadError, RelayLoader};
use crate::config::RelayConfig;

/// HTTP-backed loader with short explicit timeouts.
///
/// Every call this loader makes gates an interactive menu action, so a
/// stalled request must never hang the host UI.
#[derive(Debug, Clone)]
pub struct HttpLoader {
    client: Client,
    probe_timeout: Duration,
}

impl HttpLoader {
    pub fn new(user_agent: &str, probe_timeout: Duration, request_timeout: Duration) -> Self {
        let client = Self::build_client(user_agent, request_timeout);
        Self {
            client,
            probe_timeout,
        }
    }

    pub fn with_client(client: Client, probe_timeout: Duration) -> Self {
        Self {
            client,
            probe_timeout,
        }
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(
            &config.user_agent,
            config.probe_timeout,
            config.request_timeout,
        )
    }

    pub fn build_client(user_agent: &str, timeout: Duration) -> Client {
        Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(2))
            .user_agent(user_agent.to_string())
            .gzip(true)
            .build()
            .expect("Failed to build HTTP client")
    }
}

impl Default for HttpLoader {
    fn default() -> Self {
        Self::from_config(&RelayConfig::default())
    }
}

#[async_trait]
impl RelayLoader for HttpLoader {
    async fn probe(&self, url: &str) -> bool {
        match self
            .client
            .head(url)
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) => {
                let up = response.status().is_success();
                debug!(url, status = response.status().as_u16(), up, "Probe result");
                up
            }
            Err(e) => {
                debug!(url, error = %e, "Probe failed");
                false
            }
        }
    }

    async fn fetch_text(&self, url: &str) -> Result<String, LoadError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                warn!(url, "Fetch timed out");
                LoadError::Timeout {
                    url: url.to_string(),
                }
            } else {
                warn!(url, error = %e, "Fetch network error");
                LoadError::Network {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .status()
                .canonical_reason()
                .unwrap_or("Unknown")
                .to_string();
            warn!(url, status, "Fetch returned error status");
            return Err(LoadError::Http {
                url: url.to_string(),
                status,
                message,
            });
        }

        response.text().await.map_err(|e| LoadError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}
