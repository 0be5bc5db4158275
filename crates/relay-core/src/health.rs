//! Time-gated DNS consistency check for the relay service.
//!
//! The relay only works when a fixed set of upstream hostnames is aliased
//! to the relay server's address (hosts-file or local DNS override). Once
//! per check interval, the monitor resolves the primary relay host, verifies
//! it is alive, then resolves each dependent hostname and compares. The
//! persisted checkpoint advances only when the entire batch matches in a
//! single pass; a server-offline result or any mismatch leaves it untouched
//! so the next menu entry re-checks regardless of elapsed time.

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::{RelayConfig, DNS_CHECKED_KEY};
use crate::loader::RelayLoader;

/// Injected clock, for deterministic tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// External integer key-value store. Holds exactly one key for this
/// subsystem: the last-checked checkpoint timestamp.
pub trait SettingsStore: Send + Sync {
    fn get_int(&self, key: &str) -> i64;
    fn set_int(&self, key: &str, value: i64);
}

/// Hostname resolution seam.
#[async_trait]
pub trait HostResolver: Send + Sync {
    async fn resolve(&self, host: &str) -> Option<IpAddr>;
}

/// System resolver backed by tokio's lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioResolver;

#[async_trait]
impl HostResolver for TokioResolver {
    async fn resolve(&self, host: &str) -> Option<IpAddr> {
        match tokio::net::lookup_host((host, 443)).await {
            Ok(mut addrs) => addrs.next().map(|a| a.ip()),
            Err(e) => {
                debug!(host, error = %e, "Hostname did not resolve");
                None
            }
        }
    }
}

/// A dependent hostname that does not resolve to the relay server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsMismatch {
    pub host: String,
    pub expected: IpAddr,
}

impl DnsMismatch {
    /// Dialog text naming the offending hostname and the expected target.
    pub fn user_message(&self) -> String {
        format!(
            "{} doesn't resolve to the relay server. Update your hosts file to point to {}",
            self.host, self.expected
        )
    }
}

/// Result of one `maybe_check` pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthOutcome {
    /// The check interval has not elapsed; nothing was done.
    Skipped,
    /// Every monitored hostname resolved to the relay address; the
    /// checkpoint advanced.
    Passed,
    /// The primary relay host did not resolve or is not reachable.
    ServerOffline,
    /// One or more dependent hostnames point elsewhere.
    Misconfigured(Vec<DnsMismatch>),
}

impl HealthOutcome {
    pub fn user_messages(&self) -> Vec<String> {
        match self {
            Self::Skipped | Self::Passed => Vec::new(),
            Self::ServerOffline => vec!["The relay server is offline.".to_string()],
            Self::Misconfigured(mismatches) => {
                mismatches.iter().map(DnsMismatch::user_message).collect()
            }
        }
    }
}

/// Owns the checkpoint accessor and the check-frequency gate. Constructed
/// with injected clock, settings store, resolver, and liveness prober.
pub struct HealthMonitor {
    config: RelayConfig,
    clock: Arc<dyn Clock>,
    store: Arc<dyn SettingsStore>,
    resolver: Arc<dyn HostResolver>,
    loader: Arc<dyn RelayLoader>,
}

impl HealthMonitor {
    pub fn new(
        config: RelayConfig,
        clock: Arc<dyn Clock>,
        store: Arc<dyn SettingsStore>,
        resolver: Arc<dyn HostResolver>,
        loader: Arc<dyn RelayLoader>,
    ) -> Self {
        Self {
            config,
            clock,
            store,
            resolver,
            loader,
        }
    }

    /// Run the DNS consistency check if the interval has elapsed.
    ///
    /// Invoked once per top-level menu entry, never per playback request.
    /// The checkpoint advances only on a clean full-batch pass: offline and
    /// mismatch results are real failures that must be re-checked next
    /// entry, not rate-limited away.
    pub async fn maybe_check(&self) -> HealthOutcome {
        let now = self.clock.now().timestamp();
        let last_checked = self.store.get_int(DNS_CHECKED_KEY);
        let interval = self.config.dns_check_interval.as_secs() as i64;
        if now - interval <= last_checked {
            debug!(last_checked, "DNS check interval not elapsed");
            return HealthOutcome::Skipped;
        }

        let Some(relay_addr) = self.resolver.resolve(&self.config.base_url).await else {
            warn!(host = %self.config.base_url, "Relay host did not resolve");
            return HealthOutcome::ServerOffline;
        };

        if !self
            .loader
            .probe(&format!("https://{}/", self.config.base_url))
            .await
        {
            warn!(host = %self.config.base_url, %relay_addr, "Relay host not reachable");
            return HealthOutcome::ServerOffline;
        }

        info!(%relay_addr, "Checking DNS aliases");
        let mut mismatches = Vec::new();
        for host in &self.config.monitored_hosts {
            let resolved = self.resolver.resolve(host).await;
            if resolved != Some(relay_addr) {
                warn!(host = %host, ?resolved, expected = %relay_addr, "DNS mismatch");
                mismatches.push(DnsMismatch {
                    host: host.clone(),
                    expected: relay_addr,
                });
            }
        }

        if mismatches.is_empty() {
            self.store.set_int(DNS_CHECKED_KEY, now);
            info!("All monitored hosts resolve to the relay server");
            HealthOutcome::Passed
        } else {
            HealthOutcome::Misconfigured(mismatches)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::loader::LoadError;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    #[derive(Default)]
    struct MemoryStore(Mutex<HashMap<String, i64>>);

    impl SettingsStore for MemoryStore {
        fn get_int(&self, key: &str) -> i64 {
            self.0.lock().unwrap().get(key).copied().unwrap_or(0)
        }

        fn set_int(&self, key: &str, value: i64) {
            self.0.lock().unwrap().insert(key.to_string(), value);
        }
    }

    struct ScriptedResolver(HashMap<String, IpAddr>);

    #[async_trait]
    impl HostResolver for ScriptedResolver {
        async fn resolve(&self, host: &str) -> Option<IpAddr> {
            self.0.get(host).copied()
        }
    }

    struct FixedProbe(bool);

    #[async_trait]
    impl RelayLoader for FixedProbe {
        async fn probe(&self, _url: &str) -> bool {
            self.0
        }

        async fn fetch_text(&self, url: &str) -> Result<String, LoadError> {
            Err(LoadError::Network {
                url: url.to_string(),
                reason: "not used".to_string(),
            })
        }
    }

    const RELAY: &str = "relay.test";
    const NOW: i64 = 1_700_000_000;

    fn addr(last: u8) -> IpAddr {
        IpAddr::from([10, 0, 0, last])
    }

    fn config() -> RelayConfig {
        RelayConfig::default()
            .with_base_url(RELAY)
            .with_monitored_hosts(vec!["a.test".to_string(), "b.test".to_string()])
    }

    fn monitor(
        resolver: ScriptedResolver,
        store: Arc<MemoryStore>,
        probe_up: bool,
    ) -> HealthMonitor {
        HealthMonitor::new(
            config(),
            Arc::new(FixedClock(DateTime::from_timestamp(NOW, 0).unwrap())),
            store,
            Arc::new(resolver),
            Arc::new(FixedProbe(probe_up)),
        )
    }

    fn consistent_resolver() -> ScriptedResolver {
        ScriptedResolver(HashMap::from([
            (RELAY.to_string(), addr(1)),
            ("a.test".to_string(), addr(1)),
            ("b.test".to_string(), addr(1)),
        ]))
    }

    fn poisoned_resolver() -> ScriptedResolver {
        ScriptedResolver(HashMap::from([
            (RELAY.to_string(), addr(1)),
            ("a.test".to_string(), addr(1)),
            ("b.test".to_string(), addr(2)),
        ]))
    }

    #[tokio::test]
    async fn noop_within_interval_even_with_poisoned_dns() {
        let store = Arc::new(MemoryStore::default());
        // Checked one hour ago.
        store.set_int(DNS_CHECKED_KEY, NOW - 3600);
        let m = monitor(poisoned_resolver(), store.clone(), true);
        assert_eq!(m.maybe_check().await, HealthOutcome::Skipped);
        assert_eq!(store.get_int(DNS_CHECKED_KEY), NOW - 3600);
    }

    #[tokio::test]
    async fn full_batch_match_advances_checkpoint() {
        let store = Arc::new(MemoryStore::default());
        let m = monitor(consistent_resolver(), store.clone(), true);
        assert_eq!(m.maybe_check().await, HealthOutcome::Passed);
        assert_eq!(store.get_int(DNS_CHECKED_KEY), NOW);
    }

    #[tokio::test]
    async fn single_mismatch_names_host_and_keeps_checkpoint() {
        let store = Arc::new(MemoryStore::default());
        let m = monitor(poisoned_resolver(), store.clone(), true);
        let outcome = m.maybe_check().await;
        let HealthOutcome::Misconfigured(mismatches) = outcome else {
            panic!("expected mismatch outcome, got {outcome:?}");
        };
        assert_eq!(
            mismatches,
            vec![DnsMismatch {
                host: "b.test".to_string(),
                expected: addr(1),
            }]
        );
        assert!(mismatches[0].user_message().contains("b.test"));
        assert!(mismatches[0].user_message().contains("10.0.0.1"));
        assert_eq!(store.get_int(DNS_CHECKED_KEY), 0);
    }

    #[tokio::test]
    async fn unresolved_primary_is_offline_without_checkpoint() {
        let store = Arc::new(MemoryStore::default());
        let m = monitor(ScriptedResolver(HashMap::new()), store.clone(), true);
        assert_eq!(m.maybe_check().await, HealthOutcome::ServerOffline);
        assert_eq!(store.get_int(DNS_CHECKED_KEY), 0);
    }

    #[tokio::test]
    async fn dead_primary_is_offline_without_checkpoint() {
        let store = Arc::new(MemoryStore::default());
        let m = monitor(consistent_resolver(), store.clone(), false);
        assert_eq!(m.maybe_check().await, HealthOutcome::ServerOffline);
        assert_eq!(store.get_int(DNS_CHECKED_KEY), 0);
    }

    #[tokio::test]
    async fn offline_result_rechecks_next_entry() {
        let store = Arc::new(MemoryStore::default());
        let m = monitor(ScriptedResolver(HashMap::new()), store.clone(), true);
        assert_eq!(m.maybe_check().await, HealthOutcome::ServerOffline);
        // Checkpoint untouched, so a second entry checks again immediately.
        assert_eq!(m.maybe_check().await, HealthOutcome::ServerOffline);
    }

    #[tokio::test]
    async fn interval_boundary_is_exclusive() {
        let store = Arc::new(MemoryStore::default());
        store.set_int(
            DNS_CHECKED_KEY,
            NOW - Duration::from_secs(24 * 3600).as_secs() as i64,
        );
        let m = monitor(consistent_resolver(), store.clone(), true);
        // Exactly 24h elapsed: the gate requires strictly more.
        assert_eq!(m.maybe_check().await, HealthOutcome::Skipped);
    }
}
