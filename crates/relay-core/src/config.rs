use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::quality::QualityTier;

/// Settings-store key holding the unix timestamp of the last clean DNS check.
pub const DNS_CHECKED_KEY: &str = "dnsChecked";

/// Configuration for the relay client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Hostname of the relay server, without scheme (e.g. "freegamez.ga").
    pub base_url: String,
    /// CDN selection suffix appended verbatim to content URLs.
    pub cdn_suffix: String,
    /// User-Agent sent on every request and embedded in the auth suffix.
    pub user_agent: String,
    /// Preferred quality tier for resolved streams.
    pub quality: QualityTier,
    /// Timeout for existence probes (HEAD). Gates an interactive menu action,
    /// so it stays short.
    pub probe_timeout: Duration,
    /// Timeout for the indirection fetch (GET).
    pub request_timeout: Duration,
    /// Minimum interval between DNS consistency checks.
    pub dns_check_interval: Duration,
    /// Hostnames that must resolve to the relay server's address.
    pub monitored_hosts: Vec<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            base_url: "freegamez.ga".to_string(),
            cdn_suffix: "?cdn=akc".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64)".to_string(),
            quality: QualityTier::Master,
            probe_timeout: Duration::from_secs(2),
            request_timeout: Duration::from_secs(3),
            dns_check_interval: Duration::from_secs(24 * 3600),
            monitored_hosts: vec![
                "mf.svc.nhl.com".to_string(),
                "mlb-ws-mf.media.mlb.com".to_string(),
                "playback.svcs.mlb.com".to_string(),
            ],
        }
    }
}

impl RelayConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_cdn_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.cdn_suffix = suffix.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_quality(mut self, quality: QualityTier) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_dns_check_interval(mut self, interval: Duration) -> Self {
        self.dns_check_interval = interval;
        self
    }

    pub fn with_monitored_hosts(mut self, hosts: Vec<String>) -> Self {
        self.monitored_hosts = hosts;
        self
    }
}
