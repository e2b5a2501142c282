//! `ProfileStore` trait and the in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::error::StorageError;
use crate::profiles::model::{GameCatalogEntry, Profile, RegistrationPayload};

/// Backend-agnostic profile and catalog persistence.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Insert or update a profile from a completed registration.
    ///
    /// Fails with [`StorageError::DuplicateNickname`] when the nickname is
    /// already owned by a different external id. Revives soft-deleted rows.
    async fn upsert(&self, payload: &RegistrationPayload) -> Result<Profile, StorageError>;

    /// Look up a profile by external id. Soft-deleted profiles are absent.
    async fn get(&self, external_id: i64) -> Result<Option<Profile>, StorageError>;

    /// Soft-delete a profile. Returns `false` if there was nothing to delete.
    async fn delete(&self, external_id: i64) -> Result<bool, StorageError>;

    /// Bump the profile's `last_active` timestamp. No-op for missing rows.
    async fn touch(&self, external_id: i64) -> Result<(), StorageError>;

    /// All active games, ordered by name. May be empty.
    async fn list_active_games(&self) -> Result<Vec<GameCatalogEntry>, StorageError>;

    /// Insert catalog entries that are not present yet (keyed by alias).
    async fn seed_games(&self, entries: &[GameCatalogEntry]) -> Result<(), StorageError>;
}

/// In-memory profile store for tests and local runs.
#[derive(Default)]
pub struct MemoryProfileStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    profiles: HashMap<i64, Profile>,
    games: Vec<GameCatalogEntry>,
    next_game_id: i64,
}

impl MemoryProfileStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn upsert(&self, payload: &RegistrationPayload) -> Result<Profile, StorageError> {
        let mut inner = self.inner.lock().await;

        let nickname_taken = inner.profiles.values().any(|p| {
            p.id != payload.external_id && p.nickname == payload.nickname && !p.is_deleted
        });
        if nickname_taken {
            return Err(StorageError::DuplicateNickname(payload.nickname.clone()));
        }

        let games: Vec<GameCatalogEntry> = inner
            .games
            .iter()
            .filter(|g| payload.game_ids.contains(&g.id))
            .cloned()
            .collect();

        let now = Utc::now();
        let created_at = inner
            .profiles
            .get(&payload.external_id)
            .map(|p| p.created_at)
            .unwrap_or(now);

        let profile = Profile {
            id: payload.external_id,
            display_name: payload.display_name.clone(),
            nickname: payload.nickname.clone(),
            age: payload.age,
            languages: payload.languages.clone(),
            description: payload.description.clone(),
            photo_reference: payload.photo_reference.clone(),
            games,
            is_deleted: false,
            created_at,
            last_active: now,
        };
        inner.profiles.insert(payload.external_id, profile.clone());
        Ok(profile)
    }

    async fn get(&self, external_id: i64) -> Result<Option<Profile>, StorageError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .profiles
            .get(&external_id)
            .filter(|p| !p.is_deleted)
            .cloned())
    }

    async fn delete(&self, external_id: i64) -> Result<bool, StorageError> {
        let mut inner = self.inner.lock().await;
        match inner.profiles.get_mut(&external_id) {
            Some(profile) if !profile.is_deleted => {
                profile.is_deleted = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn touch(&self, external_id: i64) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().await;
        if let Some(profile) = inner.profiles.get_mut(&external_id) {
            profile.last_active = Utc::now();
        }
        Ok(())
    }

    async fn list_active_games(&self) -> Result<Vec<GameCatalogEntry>, StorageError> {
        let inner = self.inner.lock().await;
        let mut games = inner.games.clone();
        games.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(games)
    }

    async fn seed_games(&self, entries: &[GameCatalogEntry]) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().await;
        for entry in entries {
            if inner.games.iter().any(|g| g.alias == entry.alias) {
                continue;
            }
            inner.next_game_id += 1;
            let id = if entry.id > 0 {
                entry.id
            } else {
                inner.next_game_id
            };
            inner.games.push(GameCatalogEntry {
                id,
                name: entry.name.clone(),
                alias: entry.alias.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(id: i64, nickname: &str) -> RegistrationPayload {
        RegistrationPayload {
            external_id: id,
            display_name: Some("tester".into()),
            nickname: nickname.into(),
            age: 25,
            languages: vec!["en".into()],
            game_ids: vec![1, 2],
            description: None,
            photo_reference: None,
        }
    }

    fn games() -> Vec<GameCatalogEntry> {
        vec![
            GameCatalogEntry { id: 1, name: "Arsenal".into(), alias: "arsenal".into() },
            GameCatalogEntry { id: 2, name: "Tower of Hell".into(), alias: "toh".into() },
        ]
    }

    #[tokio::test]
    async fn upsert_then_get() {
        let store = MemoryProfileStore::new();
        store.seed_games(&games()).await.unwrap();
        let profile = store.upsert(&payload(10, "Player_1")).await.unwrap();
        assert_eq!(profile.games.len(), 2);

        let fetched = store.get(10).await.unwrap().unwrap();
        assert_eq!(fetched.nickname, "Player_1");
    }

    #[tokio::test]
    async fn duplicate_nickname_rejected_for_other_user() {
        let store = MemoryProfileStore::new();
        store.upsert(&payload(10, "Player_1")).await.unwrap();

        let err = store.upsert(&payload(11, "Player_1")).await.unwrap_err();
        assert!(matches!(err, StorageError::DuplicateNickname(_)));
    }

    #[tokio::test]
    async fn same_user_can_keep_own_nickname() {
        let store = MemoryProfileStore::new();
        store.upsert(&payload(10, "Player_1")).await.unwrap();
        // Re-registering under the same id is an update, not a conflict.
        store.upsert(&payload(10, "Player_1")).await.unwrap();
    }

    #[tokio::test]
    async fn delete_is_soft_and_idempotent() {
        let store = MemoryProfileStore::new();
        store.upsert(&payload(10, "Player_1")).await.unwrap();

        assert!(store.delete(10).await.unwrap());
        assert!(store.get(10).await.unwrap().is_none());
        assert!(!store.delete(10).await.unwrap());
    }

    #[tokio::test]
    async fn upsert_revives_deleted_profile() {
        let store = MemoryProfileStore::new();
        store.upsert(&payload(10, "Player_1")).await.unwrap();
        store.delete(10).await.unwrap();

        store.upsert(&payload(10, "Player_2")).await.unwrap();
        let fetched = store.get(10).await.unwrap().unwrap();
        assert_eq!(fetched.nickname, "Player_2");
        assert!(!fetched.is_deleted);
    }

    #[tokio::test]
    async fn deleted_profile_frees_nickname() {
        let store = MemoryProfileStore::new();
        store.upsert(&payload(10, "Player_1")).await.unwrap();
        store.delete(10).await.unwrap();

        store.upsert(&payload(11, "Player_1")).await.unwrap();
    }

    #[tokio::test]
    async fn seed_games_dedupes_by_alias() {
        let store = MemoryProfileStore::new();
        store.seed_games(&games()).await.unwrap();
        store.seed_games(&games()).await.unwrap();
        assert_eq!(store.list_active_games().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn list_active_games_ordered_by_name() {
        let store = MemoryProfileStore::new();
        store
            .seed_games(&[
                GameCatalogEntry { id: 1, name: "Zed Wars".into(), alias: "zw".into() },
                GameCatalogEntry { id: 2, name: "Arsenal".into(), alias: "ars".into() },
            ])
            .await
            .unwrap();
        let names: Vec<String> = store
            .list_active_games()
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.name)
            .collect();
        assert_eq!(names, vec!["Arsenal", "Zed Wars"]);
    }
}
