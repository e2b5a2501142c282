//! Profile and catalog data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A selectable game mode from the reference catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameCatalogEntry {
    pub id: i64,
    pub name: String,
    pub alias: String,
}

/// Immutable snapshot assembled at the final onboarding step.
///
/// Constructed once and consumed exactly once by the profile upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationPayload {
    /// Stable id issued by the messaging platform.
    pub external_id: i64,
    /// Platform display name (`@username`), if the user has one.
    pub display_name: Option<String>,
    pub nickname: String,
    pub age: u8,
    /// Single-element in practice; ordered.
    pub languages: Vec<String>,
    /// At most five, unique.
    pub game_ids: Vec<i64>,
    /// ≤300 chars when present.
    pub description: Option<String>,
    /// Opaque platform file reference.
    pub photo_reference: Option<String>,
}

/// A persisted user profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Same as the platform external id.
    pub id: i64,
    pub display_name: Option<String>,
    /// Globally unique.
    pub nickname: String,
    pub age: u8,
    pub languages: Vec<String>,
    pub description: Option<String>,
    pub photo_reference: Option<String>,
    pub games: Vec<GameCatalogEntry>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl Profile {
    /// The profile's preferred locale, if one was recorded.
    pub fn primary_language(&self) -> Option<&str> {
        self.languages.first().map(String::as_str)
    }
}

/// A raw games seed file entry (`data/games.json`).
#[derive(Debug, Clone, Deserialize)]
pub struct GameSeedEntry {
    pub name: Option<String>,
    pub alias: Option<String>,
    pub category: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_language_first_entry() {
        let profile = Profile {
            id: 1,
            display_name: None,
            nickname: "Player_1".into(),
            age: 25,
            languages: vec!["en".into(), "ru".into()],
            description: None,
            photo_reference: None,
            games: vec![],
            is_deleted: false,
            created_at: Utc::now(),
            last_active: Utc::now(),
        };
        assert_eq!(profile.primary_language(), Some("en"));
    }

    #[test]
    fn seed_entry_parses_partial_json() {
        let raw = r#"{"alias": "mm2"}"#;
        let entry: GameSeedEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.alias.as_deref(), Some("mm2"));
        assert!(entry.name.is_none());
        assert!(entry.category.is_none());
    }
}
