//! Playback item preparation and handoff to the host.
//!
//! Live relay feeds and pre-packaged highlights need different transport
//! handling, keyed on content type. The relay's TLS certificate does not
//! match the playback domain, and adaptive-transport clients reject that
//! mismatch, so live feeds go through the host's generic path resolution
//! with the header suffix still bundled into the URL string. Highlights are
//! served from a certificate-matching domain, so they get the richer
//! adaptive HLS transport with the suffix split out as custom headers.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::{AuthSuffix, HEADER_DELIMITER};

pub const HLS_MIME_TYPE: &str = "application/x-mpegURL";
pub const ADAPTIVE_TRANSPORT_CLASS: &str = "inputstream.adaptive";

/// Content type of a resolved stream. Decides the transport policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// A live relay feed (or its archived manifest).
    LiveRelay,
    /// A pre-packaged highlight clip.
    Highlight,
}

/// Adaptive-streaming transport properties attached to highlight items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportProperties {
    pub class: String,
    pub manifest_type: String,
    pub stream_headers: String,
}

/// The resolved playable handed to the host. Built once per resolution,
/// then owned by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayableItem {
    pub path: String,
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport: Option<TransportProperties>,
}

impl PlayableItem {
    /// Build the playable item for a resolved URL plus auth suffix.
    pub fn prepare(url: &str, suffix: &AuthSuffix, kind: ContentKind) -> Self {
        let combined = suffix.apply(url);
        match kind {
            ContentKind::LiveRelay => Self {
                path: combined,
                mime_type: HLS_MIME_TYPE.to_string(),
                transport: None,
            },
            ContentKind::Highlight => {
                let (path, headers) = combined
                    .split_once(HEADER_DELIMITER)
                    .unwrap_or((combined.as_str(), ""));
                Self {
                    path: path.to_string(),
                    mime_type: HLS_MIME_TYPE.to_string(),
                    transport: Some(TransportProperties {
                        class: ADAPTIVE_TRANSPORT_CLASS.to_string(),
                        manifest_type: "hls".to_string(),
                        stream_headers: headers.to_string(),
                    }),
                }
            }
        }
    }
}

/// The host's playback sink. The host decodes and plays; this subsystem
/// only hands over the resolved item.
pub trait PlaybackSink: Send + Sync {
    fn deliver(&self, item: PlayableItem);
}

/// Hand a resolved item to the host sink.
pub fn dispatch(item: PlayableItem, sink: &dyn PlaybackSink) {
    debug!(path = %item.path, adaptive = item.transport.is_some(), "Dispatching playable item");
    sink.deliver(item);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionAuth;
    use std::sync::Mutex;

    fn suffix() -> AuthSuffix {
        SessionAuth::new(b"key".to_vec(), "agent").build_suffix_with_salt(b"salt")
    }

    #[test]
    fn live_relay_keeps_bundled_suffix_and_no_transport() {
        let item = PlayableItem::prepare(
            "https://cdn.example.com/master.m3u8",
            &suffix(),
            ContentKind::LiveRelay,
        );
        assert!(item.path.starts_with("https://cdn.example.com/master.m3u8|cookie="));
        assert_eq!(item.mime_type, HLS_MIME_TYPE);
        assert!(item.transport.is_none());
    }

    #[test]
    fn highlight_splits_suffix_into_transport_headers() {
        let item = PlayableItem::prepare(
            "https://media.example.com/clip.m3u8",
            &suffix(),
            ContentKind::Highlight,
        );
        assert_eq!(item.path, "https://media.example.com/clip.m3u8");
        let transport = item.transport.expect("highlight gets adaptive transport");
        assert_eq!(transport.class, ADAPTIVE_TRANSPORT_CLASS);
        assert_eq!(transport.manifest_type, "hls");
        assert!(transport.stream_headers.starts_with("cookie=mediaAuth"));
    }

    struct RecordingSink(Mutex<Vec<PlayableItem>>);

    impl PlaybackSink for RecordingSink {
        fn deliver(&self, item: PlayableItem) {
            self.0.lock().unwrap().push(item);
        }
    }

    #[test]
    fn dispatch_hands_item_to_sink() {
        let sink = RecordingSink(Mutex::new(Vec::new()));
        let item = PlayableItem::prepare("https://x/m.m3u8", &suffix(), ContentKind::LiveRelay);
        dispatch(item.clone(), &sink);
        assert_eq!(sink.0.lock().unwrap().as_slice(), &[item]);
    }
}
