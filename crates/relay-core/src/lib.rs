#![forbid(unsafe_code)]

pub mod auth;
pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod health;
pub mod loader;
pub mod quality;
pub mod resolver;

pub use auth::{AuthSuffix, SessionAuth, HEADER_DELIMITER};
pub use catalog::{list_entries, CatalogError, CatalogProvider, DirectoryEntry, Feed, Game};
pub use config::{RelayConfig, DNS_CHECKED_KEY};
pub use dispatch::{
    dispatch, ContentKind, PlayableItem, PlaybackSink, TransportProperties, HLS_MIME_TYPE,
};
pub use health::{
    Clock, DnsMismatch, HealthMonitor, HealthOutcome, HostResolver, SettingsStore, SystemClock,
    TokioResolver,
};
pub use loader::{HttpLoader, LoadError, RelayLoader};
pub use quality::{classify, select_variant, GamePhase, QualityError, QualityTier};
pub use resolver::{ManifestResolver, Provider, ResolveError, StreamRequest};
