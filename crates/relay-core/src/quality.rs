//! Quality tier selection and manifest path rewriting.
//!
//! The relay serves a master playlist plus fixed-bitrate renditions at
//! well-known sibling paths. Selecting a tier means replacing the last path
//! segment of the master URL with that tier's template, filled with a
//! variant name that depends on whether the game is still running.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QualityError {
    #[error("Unknown quality tier '{0}'")]
    UnknownTier(String),
}

/// Closed set of stream quality tiers the relay publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    /// Full-quality master playlist, no path rewrite.
    Master,
    Q540p,
    Q720p,
    Q720p60,
}

impl QualityTier {
    /// Path template for this tier, with `{}` standing for the variant name.
    /// `None` for `Master`, which never rewrites.
    fn template(self) -> Option<&'static str> {
        match self {
            Self::Master => None,
            Self::Q540p => Some("2500K/2500_{}.m3u8"),
            Self::Q720p => Some("3500K/3500_{}.m3u8"),
            Self::Q720p60 => Some("5600K/5600_{}.m3u8"),
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Master => write!(f, "Master"),
            Self::Q540p => write!(f, "540p"),
            Self::Q720p => write!(f, "720p"),
            Self::Q720p60 => write!(f, "720p60"),
        }
    }
}

impl FromStr for QualityTier {
    type Err = QualityError;

    /// Unknown tier keys are a configuration error, never a silent fallback.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "master" => Ok(Self::Master),
            "540p" => Ok(Self::Q540p),
            "720p" => Ok(Self::Q720p),
            "720p60" => Ok(Self::Q720p60),
            other => Err(QualityError::UnknownTier(other.to_string())),
        }
    }
}

/// Game lifecycle phase, derived from the catalog's free-form state string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Live,
    Upcoming,
    Final,
}

impl GamePhase {
    /// Variant name spliced into tier templates. Live and upcoming games
    /// reference the continuously-growing manifest; finished games the
    /// finalized trimmed one.
    pub fn variant_name(self) -> &'static str {
        match self {
            Self::Live | Self::Upcoming => "complete",
            Self::Final => "complete-trimmed",
        }
    }
}

/// Classify a raw catalog state string into a phase.
///
/// The rule is a case-insensitive substring match: anything containing
/// "progress" is live; "scheduled", "pre-game" or "warmup" is upcoming;
/// everything else (e.g. "Final") is finished. Catalog state strings carry
/// suffixes like "In Progress - Period 2", so exact matching is not an
/// option.
pub fn classify(raw_state: &str) -> GamePhase {
    let lower = raw_state.to_ascii_lowercase();
    if lower.contains("progress") {
        GamePhase::Live
    } else if ["scheduled", "pre-game", "warmup"]
        .iter()
        .any(|marker| lower.contains(marker))
    {
        GamePhase::Upcoming
    } else {
        GamePhase::Final
    }
}

/// Rewrite a master manifest URL for the requested tier.
///
/// `Master` returns the input unchanged. Any other tier replaces everything
/// after the final path separator with the filled tier template.
pub fn select_variant(tier: QualityTier, phase: GamePhase, master_url: &str) -> String {
    let Some(template) = tier.template() else {
        return master_url.to_string();
    };

    let path = template.replace("{}", phase.variant_name());
    match master_url.rsplit_once('/') {
        Some((base, _)) => format!("{base}/{path}"),
        None => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASTER: &str = "https://nhl.freegamez.ga/getM3U8.php/master_wired60.m3u8";

    #[test]
    fn master_tier_is_passthrough() {
        for state in ["In Progress", "Final", "Scheduled", ""] {
            assert_eq!(
                select_variant(QualityTier::Master, classify(state), MASTER),
                MASTER
            );
        }
    }

    #[test]
    fn tier_rewrite_contains_bitrate_marker() {
        let cases = [
            (QualityTier::Q540p, "2500K/2500_"),
            (QualityTier::Q720p, "3500K/3500_"),
            (QualityTier::Q720p60, "5600K/5600_"),
        ];
        for (tier, marker) in cases {
            let out = select_variant(tier, GamePhase::Live, MASTER);
            assert!(out.contains(marker), "{out} missing {marker}");
        }
    }

    #[test]
    fn live_game_selects_complete_variant() {
        let out = select_variant(QualityTier::Q720p, classify("In Progress"), MASTER);
        assert!(out.ends_with("3500K/3500_complete.m3u8"));
    }

    #[test]
    fn final_game_selects_trimmed_variant() {
        let out = select_variant(QualityTier::Q720p, classify("Final"), MASTER);
        assert!(out.ends_with("3500K/3500_complete-trimmed.m3u8"));
    }

    #[test]
    fn classify_is_case_insensitive_substring() {
        assert_eq!(classify("in progress"), GamePhase::Live);
        assert_eq!(classify("In Progress - Period 2"), GamePhase::Live);
        assert_eq!(classify("progress"), GamePhase::Live);
        assert_eq!(classify("Pre-Game"), GamePhase::Upcoming);
        assert_eq!(classify("WARMUP"), GamePhase::Upcoming);
        assert_eq!(classify("Scheduled"), GamePhase::Upcoming);
        assert_eq!(classify("Final"), GamePhase::Final);
        assert_eq!(classify("Postponed"), GamePhase::Final);
    }

    #[test]
    fn rewrite_replaces_only_last_segment() {
        let out = select_variant(QualityTier::Q540p, GamePhase::Final, MASTER);
        assert_eq!(
            out,
            "https://nhl.freegamez.ga/getM3U8.php/2500K/2500_complete-trimmed.m3u8"
        );
    }

    #[test]
    fn tier_parse_rejects_unknown_keys() {
        assert!("480p".parse::<QualityTier>().is_err());
        assert!("".parse::<QualityTier>().is_err());
        assert_eq!("Master".parse::<QualityTier>().unwrap(), QualityTier::Master);
        assert_eq!("720p60".parse::<QualityTier>().unwrap(), QualityTier::Q720p60);
    }
}
