//! Conversation state machine — tracks which onboarding step a user is at.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::profiles::model::GameCatalogEntry;

/// The named step a user is currently parked at.
///
/// `Idle` is both initial and terminal; the happy path walks
/// WaitNick → WaitAge → WaitLanguage → WaitGames → WaitBio → WaitPhoto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    #[default]
    Idle,
    WaitNick,
    WaitAge,
    WaitLanguage,
    WaitGames,
    WaitBio,
    WaitPhoto,
}

impl ConversationState {
    /// Whether the user is inside the onboarding flow.
    pub fn is_onboarding(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

impl std::fmt::Display for ConversationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::WaitNick => "wait_nick",
            Self::WaitAge => "wait_age",
            Self::WaitLanguage => "wait_language",
            Self::WaitGames => "wait_games",
            Self::WaitBio => "wait_bio",
            Self::WaitPhoto => "wait_photo",
        };
        write!(f, "{s}")
    }
}

/// Transient per-conversation fields collected before the final commit.
///
/// Created on entry to WaitNick, mutated by each step handler, discarded on
/// completion or cancellation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scratch {
    /// Working interface locale, stored at flow entry.
    pub locale: Option<String>,
    pub nickname: Option<String>,
    pub age: Option<u8>,
    /// Explicitly chosen search/interface language.
    pub language: Option<String>,
    /// Toggled game ids, at most five.
    pub selected_games: BTreeSet<i64>,
    /// Catalog snapshot cached for the games sub-flow.
    pub games_catalog: Vec<GameCatalogEntry>,
    /// Active fuzzy-search filter over the cached catalog.
    pub search_filter: Option<String>,
    pub description: Option<String>,
    pub photo_reference: Option<String>,
}

impl Scratch {
    /// A fresh scratch pad carrying only the resolved locale.
    ///
    /// Used on flow entry and on the duplicate-nickname rewind, where every
    /// other collected answer is discarded.
    pub fn with_locale(locale: &str) -> Self {
        Self {
            locale: Some(locale.to_string()),
            ..Self::default()
        }
    }

    /// Look up a cached catalog entry by id.
    pub fn catalog_entry(&self, id: i64) -> Option<&GameCatalogEntry> {
        self.games_catalog.iter().find(|g| g.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_is_default_and_not_onboarding() {
        assert_eq!(ConversationState::default(), ConversationState::Idle);
        assert!(!ConversationState::Idle.is_onboarding());
        assert!(ConversationState::WaitNick.is_onboarding());
        assert!(ConversationState::WaitPhoto.is_onboarding());
    }

    #[test]
    fn display_matches_serde() {
        let states = [
            ConversationState::Idle,
            ConversationState::WaitNick,
            ConversationState::WaitAge,
            ConversationState::WaitLanguage,
            ConversationState::WaitGames,
            ConversationState::WaitBio,
            ConversationState::WaitPhoto,
        ];
        for state in states {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{state}\""));
        }
    }

    #[test]
    fn with_locale_drops_everything_else() {
        let mut scratch = Scratch::with_locale("en");
        scratch.nickname = Some("Player_1".into());
        scratch.age = Some(25);
        scratch.selected_games.insert(3);

        let rewound = Scratch::with_locale(scratch.locale.as_deref().unwrap());
        assert_eq!(rewound.locale.as_deref(), Some("en"));
        assert!(rewound.nickname.is_none());
        assert!(rewound.age.is_none());
        assert!(rewound.selected_games.is_empty());
    }

    #[test]
    fn scratch_serde_roundtrip() {
        let mut scratch = Scratch::with_locale("ru");
        scratch.age = Some(14);
        scratch.selected_games.extend([3, 7]);
        scratch.games_catalog.push(GameCatalogEntry {
            id: 3,
            name: "Arsenal".into(),
            alias: "arsenal".into(),
        });

        let json = serde_json::to_string(&scratch).unwrap();
        let parsed: Scratch = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, scratch);
    }

    #[test]
    fn catalog_entry_lookup() {
        let mut scratch = Scratch::default();
        scratch.games_catalog.push(GameCatalogEntry {
            id: 7,
            name: "Tower of Hell".into(),
            alias: "toh".into(),
        });
        assert!(scratch.catalog_entry(7).is_some());
        assert!(scratch.catalog_entry(8).is_none());
    }
}
