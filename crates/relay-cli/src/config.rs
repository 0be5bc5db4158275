//! TOML configuration file schema and parsing.
//!
//! Example config file:
//!
//! ```toml
//! [relay]
//! base_url = "freegamez.ga"
//! cdn_suffix = "?cdn=akc"
//! quality = "720p"
//!
//! [health]
//! interval_hours = 24
//! state_file = "/var/lib/lazyrelay/state.json"
//! hosts = [
//!   "mf.svc.nhl.com",
//!   "mlb-ws-mf.media.mlb.com",
//!   "playback.svcs.mlb.com",
//! ]
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use relay_core::{QualityTier, RelayConfig};

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub relay: RelaySection,

    #[serde(default)]
    pub health: HealthSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelaySection {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_cdn_suffix")]
    pub cdn_suffix: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Tier key as the quality selector understands it. Unknown keys are a
    /// configuration error surfaced at load time.
    #[serde(default = "default_quality")]
    pub quality: String,
}

impl Default for RelaySection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            cdn_suffix: default_cdn_suffix(),
            user_agent: default_user_agent(),
            quality: default_quality(),
        }
    }
}

fn default_base_url() -> String {
    RelayConfig::default().base_url
}

fn default_cdn_suffix() -> String {
    RelayConfig::default().cdn_suffix
}

fn default_user_agent() -> String {
    RelayConfig::default().user_agent
}

fn default_quality() -> String {
    "master".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthSection {
    #[serde(default = "default_interval_hours")]
    pub interval_hours: u64,

    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    #[serde(default = "default_hosts")]
    pub hosts: Vec<String>,
}

impl Default for HealthSection {
    fn default() -> Self {
        Self {
            interval_hours: default_interval_hours(),
            state_file: default_state_file(),
            hosts: default_hosts(),
        }
    }
}

fn default_interval_hours() -> u64 {
    24
}

fn default_state_file() -> PathBuf {
    PathBuf::from("lazyrelay-state.json")
}

fn default_hosts() -> Vec<String> {
    RelayConfig::default().monitored_hosts
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, String> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read config file {}: {e}", path.display()))?;
        toml::from_str(&raw).map_err(|e| format!("Invalid config file {}: {e}", path.display()))
    }

    /// Fold the file into the core config, validating the quality tier key.
    pub fn to_relay_config(&self) -> Result<RelayConfig, String> {
        let quality: QualityTier = self
            .relay
            .quality
            .parse()
            .map_err(|e| format!("{e}"))?;

        Ok(RelayConfig::default()
            .with_base_url(&self.relay.base_url)
            .with_cdn_suffix(&self.relay.cdn_suffix)
            .with_user_agent(&self.relay.user_agent)
            .with_quality(quality)
            .with_dns_check_interval(Duration::from_secs(self.health.interval_hours * 3600))
            .with_monitored_hosts(self.health.hosts.clone()))
    }
}
