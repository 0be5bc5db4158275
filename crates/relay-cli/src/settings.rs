//! JSON-file-backed settings store.
//!
//! Stands in for the host's key-value settings; this subsystem keeps exactly
//! one integer in it, the DNS check checkpoint. A missing or unreadable file
//! reads as zero, which simply forces the next check to run.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::warn;

use relay_core::SettingsStore;

#[derive(Debug, Clone)]
pub struct FileSettings {
    path: PathBuf,
}

impl FileSettings {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn read_all(&self) -> HashMap<String, i64> {
        let Ok(raw) = std::fs::read_to_string(&self.path) else {
            return HashMap::new();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "Ignoring malformed state file");
            HashMap::new()
        })
    }
}

impl SettingsStore for FileSettings {
    fn get_int(&self, key: &str) -> i64 {
        self.read_all().get(key).copied().unwrap_or(0)
    }

    fn set_int(&self, key: &str, value: i64) {
        let mut all = self.read_all();
        all.insert(key.to_string(), value);
        match serde_json::to_string_pretty(&all) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&self.path, json) {
                    warn!(path = %self.path.display(), error = %e, "Cannot write state file");
                }
            }
            Err(e) => warn!(error = %e, "Cannot serialize state file"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("lazyrelay-test-{}-{name}.json", std::process::id()))
    }

    #[test]
    fn missing_file_reads_zero() {
        let store = FileSettings::new(temp_path("missing"));
        assert_eq!(store.get_int("dnsChecked"), 0);
    }

    #[test]
    fn set_then_get_round_trips() {
        let path = temp_path("roundtrip");
        let store = FileSettings::new(path.clone());
        store.set_int("dnsChecked", 1_700_000_000);
        assert_eq!(store.get_int("dnsChecked"), 1_700_000_000);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn malformed_file_reads_zero() {
        let path = temp_path("malformed");
        std::fs::write(&path, "not json").unwrap();
        let store = FileSettings::new(path.clone());
        assert_eq!(store.get_int("dnsChecked"), 0);
        let _ = std::fs::remove_file(path);
    }
}
