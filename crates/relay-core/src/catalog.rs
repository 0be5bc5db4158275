//! External catalog contract.
//!
//! The game/feed catalog is produced by an external directory provider; this
//! subsystem consumes its records opaquely and only reads ids, states, and
//! feed viewability. The menu glue on top of it needs nothing more than the
//! `list_entries` shape: a flat sequence of (label, action, params).

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resolver::Provider;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("No games scheduled for {0}")]
    NoGamesScheduled(NaiveDate),
    #[error("Catalog request failed: {0}")]
    Unavailable(String),
}

impl CatalogError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NoGamesScheduled(_) => "No games scheduled today",
            Self::Unavailable(_) => "Stream is unavailable",
        }
    }
}

/// One camera/broadcast angle or language variant of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    pub media_id: String,
    pub label: String,
    pub viewable: bool,
}

/// A single game as the catalog reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: String,
    pub home: String,
    pub away: String,
    /// Free-form lifecycle state, e.g. "In Progress - Period 2".
    pub state: String,
    pub start_time: String,
    pub feeds: Vec<Feed>,
}

impl Game {
    /// Feeds the catalog marks as playable.
    pub fn viewable_feeds(&self) -> impl Iterator<Item = &Feed> {
        self.feeds.iter().filter(|f| f.viewable)
    }
}

#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn list_games(
        &self,
        date: NaiveDate,
        provider: Provider,
    ) -> Result<Vec<Game>, CatalogError>;
}

/// One row of a directory listing handed to the menu glue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub label: String,
    pub action: String,
    pub params: Vec<(String, String)>,
}

/// Build the feed-level directory entries for a date's games.
///
/// An empty game list is a hard stop: the caller shows the dialog and
/// renders no further entries.
pub fn list_entries(
    date: NaiveDate,
    provider: Provider,
    games: &[Game],
) -> Result<Vec<DirectoryEntry>, CatalogError> {
    if games.is_empty() {
        return Err(CatalogError::NoGamesScheduled(date));
    }

    let mut entries = Vec::new();
    for game in games {
        for feed in game.viewable_feeds() {
            entries.push(DirectoryEntry {
                label: format!("{} vs. {} [{}]", game.away, game.home, feed.label),
                action: "playgame".to_string(),
                params: vec![
                    ("date".to_string(), date.to_string()),
                    ("feed".to_string(), feed.media_id.clone()),
                    ("provider".to_string(), provider.to_string()),
                    ("state".to_string(), game.state.clone()),
                ],
            });
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game() -> Game {
        Game {
            id: "2023020001".to_string(),
            home: "Rangers".to_string(),
            away: "Devils".to_string(),
            state: "Scheduled".to_string(),
            start_time: "19:00".to_string(),
            feeds: vec![
                Feed {
                    media_id: "101".to_string(),
                    label: "Home".to_string(),
                    viewable: true,
                },
                Feed {
                    media_id: "102".to_string(),
                    label: "French".to_string(),
                    viewable: false,
                },
            ],
        }
    }

    #[test]
    fn empty_date_is_a_hard_stop() {
        let date = NaiveDate::from_ymd_opt(2024, 4, 10).unwrap();
        let err = list_entries(date, Provider::Nhl, &[]).unwrap_err();
        assert_eq!(err.user_message(), "No games scheduled today");
    }

    #[test]
    fn only_viewable_feeds_are_listed() {
        let date = NaiveDate::from_ymd_opt(2024, 4, 10).unwrap();
        let entries = list_entries(date, Provider::Nhl, &[game()]).unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.action, "playgame");
        assert!(entry.label.contains("Devils vs. Rangers"));
        assert!(entry
            .params
            .contains(&("feed".to_string(), "101".to_string())));
        assert!(entry
            .params
            .contains(&("state".to_string(), "Scheduled".to_string())));
    }
}
