//! Two-stage manifest resolution.
//!
//! A feed selection resolves through a stable content-existence URL whose
//! body, once fetched, yields the actual time-varying master manifest URL.
//! Both stages are probed before use, and each stage short-circuits with a
//! user-visible failure: the relay publishes content on its own schedule,
//! so "not there yet" and "withdrawn" are expected outcomes, not errors to
//! retry.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::auth::SessionAuth;
use crate::config::RelayConfig;
use crate::dispatch::{ContentKind, PlayableItem};
use crate::loader::{LoadError, RelayLoader};
use crate::quality::{classify, select_variant, QualityError};

/// Upstream service a feed belongs to. The two services share a content-URL
/// template differing only by one path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Nhl,
    Mlb,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nhl => write!(f, "NHL.tv"),
            Self::Mlb => write!(f, "MLB.tv"),
        }
    }
}

impl FromStr for Provider {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nhl" | "nhl.tv" => Ok(Self::Nhl),
            "mlb" | "mlb.tv" => Ok(Self::Mlb),
            other => Err(ResolveError::Configuration(format!(
                "unknown provider '{other}'"
            ))),
        }
    }
}

/// One playback attempt. Constructed per request, discarded after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRequest {
    pub date: NaiveDate,
    pub feed_id: String,
    pub provider: Provider,
    /// Raw catalog state string, e.g. "In Progress - Period 2".
    pub game_state: String,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    /// The content-existence probe failed: the relay has not published this
    /// game yet.
    #[error("Content not yet available for this game")]
    NotYetAvailable,
    /// The post-indirection probe or fetch failed: the manifest was listed
    /// but has been withdrawn.
    #[error("Stream manifest is unreachable")]
    StreamWithdrawn,
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ResolveError {
    /// Literal one-shot dialog text for the host UI. The current action is
    /// aborted after showing it; nothing is retried.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NotYetAvailable => "Game not available yet",
            Self::StreamWithdrawn => "Stream is unavailable",
            Self::Configuration(_) => "Invalid stream configuration",
        }
    }
}

impl From<QualityError> for ResolveError {
    fn from(e: QualityError) -> Self {
        Self::Configuration(e.to_string())
    }
}

impl From<LoadError> for ResolveError {
    // A fetch failure after a successful probe means the stream vanished
    // between the two calls. Raw network errors never reach the host.
    fn from(_: LoadError) -> Self {
        Self::StreamWithdrawn
    }
}

/// Resolves feed selections into playable items.
///
/// Resolution is idempotent only in shape: every call re-does the network
/// round trips, because live relays rotate manifest URLs between calls.
/// Nothing is cached.
pub struct ManifestResolver {
    config: RelayConfig,
    loader: Arc<dyn RelayLoader>,
    auth: SessionAuth,
}

impl ManifestResolver {
    pub fn new(config: RelayConfig, loader: Arc<dyn RelayLoader>, auth: SessionAuth) -> Self {
        Self {
            config,
            loader,
            auth,
        }
    }

    /// Provider-specific content-existence URL for a request.
    pub fn content_url(&self, request: &StreamRequest) -> String {
        let url = format!(
            "https://{}/mlb/m3u8/{}/{}{}",
            self.config.base_url, request.date, request.feed_id, self.config.cdn_suffix
        );
        match request.provider {
            Provider::Nhl => url.replacen("mlb/", "", 1),
            Provider::Mlb => url,
        }
    }

    /// Resolve a request into a playable item, or fail with a user-facing
    /// error. See the module docs for the stage-by-stage contract.
    pub async fn resolve(&self, request: &StreamRequest) -> Result<PlayableItem, ResolveError> {
        debug!(state = %request.game_state, feed = %request.feed_id, "Resolving stream");

        let content_url = self.content_url(request);
        debug!(url = %content_url, "Checking content URL");
        if !self.loader.probe(&content_url).await {
            info!(url = %content_url, "Content URL not reachable");
            return Err(ResolveError::NotYetAvailable);
        }

        // Indirection step: the body text is the master manifest URL.
        let body = self.loader.fetch_text(&content_url).await?;
        let manifest_url = body.trim();
        if url::Url::parse(manifest_url).is_err() {
            warn!(body = %manifest_url, "Indirection body is not a URL");
            return Err(ResolveError::StreamWithdrawn);
        }
        debug!(url = %manifest_url, "Stream URL resolved");

        if !self.loader.probe(manifest_url).await {
            info!(url = %manifest_url, "Manifest URL not reachable");
            return Err(ResolveError::StreamWithdrawn);
        }

        let phase = classify(&request.game_state);
        let adjusted = select_variant(self.config.quality, phase, manifest_url);
        debug!(url = %adjusted, ?phase, "Adjusted quality");

        let suffix = self.auth.build_suffix();
        Ok(PlayableItem::prepare(
            &adjusted,
            &suffix,
            ContentKind::LiveRelay,
        ))
    }

    /// Prepare a pre-packaged highlight clip. Highlights skip the
    /// existence/indirection protocol: their URL comes straight from the
    /// catalog.
    pub fn prepare_highlight(&self, url: &str) -> PlayableItem {
        let suffix = self.auth.build_suffix();
        PlayableItem::prepare(url, &suffix, ContentKind::Highlight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(config: RelayConfig) -> ManifestResolver {
        let loader = Arc::new(crate::loader::HttpLoader::from_config(&config));
        let auth = SessionAuth::new(b"k".to_vec(), &config.user_agent);
        ManifestResolver::new(config, loader, auth)
    }

    fn request(provider: Provider) -> StreamRequest {
        StreamRequest {
            date: NaiveDate::from_ymd_opt(2024, 4, 10).unwrap(),
            feed_id: "NYR Home".to_string(),
            provider,
            game_state: "Scheduled".to_string(),
        }
    }

    #[test]
    fn mlb_content_url_keeps_segment() {
        let r = resolver(RelayConfig::default().with_base_url("relay.test"));
        assert_eq!(
            r.content_url(&request(Provider::Mlb)),
            "https://relay.test/mlb/m3u8/2024-04-10/NYR Home?cdn=akc"
        );
    }

    #[test]
    fn nhl_content_url_drops_segment() {
        let r = resolver(RelayConfig::default().with_base_url("relay.test"));
        assert_eq!(
            r.content_url(&request(Provider::Nhl)),
            "https://relay.test/m3u8/2024-04-10/NYR Home?cdn=akc"
        );
    }

    #[test]
    fn provider_parse() {
        assert_eq!("NHL.tv".parse::<Provider>().unwrap(), Provider::Nhl);
        assert_eq!("mlb".parse::<Provider>().unwrap(), Provider::Mlb);
        assert!("espn".parse::<Provider>().is_err());
    }

    #[test]
    fn dialog_texts_are_literal() {
        assert_eq!(
            ResolveError::NotYetAvailable.user_message(),
            "Game not available yet"
        );
        assert_eq!(
            ResolveError::StreamWithdrawn.user_message(),
            "Stream is unavailable"
        );
    }
}
