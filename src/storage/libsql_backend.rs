//! libSQL backend — async implementation of `ProfileStore` and
//! `ConversationStore`. Supports local file and in-memory databases.
//!
//! All statements go through one connection, which also serializes writes
//! per key; `libsql::Connection` is `Send + Sync` and safe for concurrent
//! async use.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::info;

use crate::dialogue::state::{ConversationState, Scratch};
use crate::dialogue::store::{ConversationRecord, ConversationStore};
use crate::error::{StateStoreError, StorageError};
use crate::profiles::model::{GameCatalogEntry, Profile, RegistrationPayload};
use crate::profiles::store::ProfileStore;

/// libSQL database backend.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and initialize the schema.
    pub async fn new_local(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StorageError::Pool(format!("Failed to open libSQL database: {e}")))?;
        let conn = db
            .connect()
            .map_err(|e| StorageError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self { db: Arc::new(db), conn };
        backend.init_schema().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, StorageError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| StorageError::Pool(format!("Failed to create in-memory database: {e}")))?;
        let conn = db
            .connect()
            .map_err(|e| StorageError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self { db: Arc::new(db), conn };
        backend.init_schema().await?;
        Ok(backend)
    }

    async fn init_schema(&self) -> Result<(), StorageError> {
        // The nickname uniqueness index is partial: soft-deleted rows give
        // their nickname up.
        let statements = [
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                username TEXT,
                roblox_nick TEXT NOT NULL,
                age INTEGER NOT NULL,
                languages TEXT NOT NULL DEFAULT '[]',
                description TEXT,
                photo_id TEXT,
                is_deleted INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                last_active TEXT NOT NULL
            )",
            "CREATE UNIQUE INDEX IF NOT EXISTS uq_users_roblox_nick
                ON users(roblox_nick) WHERE is_deleted = 0",
            "CREATE TABLE IF NOT EXISTS games (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                alias TEXT NOT NULL UNIQUE,
                category TEXT
            )",
            "CREATE TABLE IF NOT EXISTS user_games (
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                game_id INTEGER NOT NULL REFERENCES games(id) ON DELETE CASCADE,
                PRIMARY KEY (user_id, game_id)
            )",
            "CREATE TABLE IF NOT EXISTS conversations (
                user_id INTEGER PRIMARY KEY,
                record TEXT NOT NULL
            )",
        ];
        for sql in statements {
            self.conn
                .execute(sql, ())
                .await
                .map_err(|e| StorageError::Query(format!("schema init failed: {e}")))?;
        }
        Ok(())
    }

    async fn load_games_of(&self, user_id: i64) -> Result<Vec<GameCatalogEntry>, StorageError> {
        let mut rows = self
            .conn
            .query(
                "SELECT g.id, g.name, g.alias FROM games g
                 JOIN user_games ug ON ug.game_id = g.id
                 WHERE ug.user_id = ?1 ORDER BY g.name",
                params![user_id],
            )
            .await
            .map_err(query_err)?;

        let mut games = Vec::new();
        while let Some(row) = rows.next().await.map_err(query_err)? {
            games.push(GameCatalogEntry {
                id: row.get(0).map_err(query_err)?,
                name: row.get(1).map_err(query_err)?,
                alias: row.get(2).map_err(query_err)?,
            });
        }
        Ok(games)
    }
}

fn query_err(e: libsql::Error) -> StorageError {
    StorageError::Query(e.to_string())
}

/// Convert `Option<String>` to a libsql Value (NULL when absent).
fn opt_text(s: Option<String>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s),
        None => libsql::Value::Null,
    }
}

/// Parse our canonical RFC 3339 write format, tolerating plain SQLite
/// datetime strings from hand-edited rows.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

fn row_to_profile(row: &libsql::Row) -> Result<Profile, StorageError> {
    let languages_json: String = row.get(4).map_err(query_err)?;
    let languages: Vec<String> = serde_json::from_str(&languages_json)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    let age: i64 = row.get(3).map_err(query_err)?;
    let is_deleted: i64 = row.get(7).map_err(query_err)?;
    let created_at: String = row.get(8).map_err(query_err)?;
    let last_active: String = row.get(9).map_err(query_err)?;

    Ok(Profile {
        id: row.get(0).map_err(query_err)?,
        display_name: row.get::<String>(1).ok(),
        nickname: row.get(2).map_err(query_err)?,
        age: u8::try_from(age).unwrap_or(0),
        languages,
        description: row.get::<String>(5).ok(),
        photo_reference: row.get::<String>(6).ok(),
        games: Vec::new(),
        is_deleted: is_deleted != 0,
        created_at: parse_datetime(&created_at),
        last_active: parse_datetime(&last_active),
    })
}

const PROFILE_COLUMNS: &str =
    "id, username, roblox_nick, age, languages, description, photo_id, is_deleted, \
     created_at, last_active";

#[async_trait]
impl ProfileStore for LibSqlBackend {
    async fn upsert(&self, payload: &RegistrationPayload) -> Result<Profile, StorageError> {
        // Pre-check gives a clean error; the partial unique index still
        // backstops races.
        let mut rows = self
            .conn
            .query(
                "SELECT id FROM users WHERE roblox_nick = ?1 AND id != ?2 AND is_deleted = 0",
                params![payload.nickname.clone(), payload.external_id],
            )
            .await
            .map_err(query_err)?;
        if rows.next().await.map_err(query_err)?.is_some() {
            return Err(StorageError::DuplicateNickname(payload.nickname.clone()));
        }

        let languages = serde_json::to_string(&payload.languages)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let now = Utc::now().to_rfc3339();

        let result = self
            .conn
            .execute(
                "INSERT INTO users (id, username, roblox_nick, age, languages, description, \
                 photo_id, is_deleted, created_at, last_active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?8)
                 ON CONFLICT(id) DO UPDATE SET
                    username = excluded.username,
                    roblox_nick = excluded.roblox_nick,
                    age = excluded.age,
                    languages = excluded.languages,
                    description = excluded.description,
                    photo_id = excluded.photo_id,
                    is_deleted = 0,
                    last_active = excluded.last_active",
                params![
                    payload.external_id,
                    opt_text(payload.display_name.clone()),
                    payload.nickname.clone(),
                    i64::from(payload.age),
                    languages,
                    opt_text(payload.description.clone()),
                    opt_text(payload.photo_reference.clone()),
                    now,
                ],
            )
            .await;
        if let Err(e) = result {
            let message = e.to_string();
            if message.contains("UNIQUE") {
                return Err(StorageError::DuplicateNickname(payload.nickname.clone()));
            }
            return Err(StorageError::Query(message));
        }

        self.conn
            .execute(
                "DELETE FROM user_games WHERE user_id = ?1",
                params![payload.external_id],
            )
            .await
            .map_err(query_err)?;
        for game_id in &payload.game_ids {
            self.conn
                .execute(
                    "INSERT OR IGNORE INTO user_games (user_id, game_id)
                     SELECT ?1, id FROM games WHERE id = ?2",
                    params![payload.external_id, *game_id],
                )
                .await
                .map_err(query_err)?;
        }

        ProfileStore::get(self, payload.external_id)
            .await?
            .ok_or_else(|| StorageError::Query("upserted profile vanished".into()))
    }

    async fn get(&self, external_id: i64) -> Result<Option<Profile>, StorageError> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {PROFILE_COLUMNS} FROM users WHERE id = ?1 AND is_deleted = 0"
                ),
                params![external_id],
            )
            .await
            .map_err(query_err)?;

        let Some(row) = rows.next().await.map_err(query_err)? else {
            return Ok(None);
        };
        let mut profile = row_to_profile(&row)?;
        profile.games = self.load_games_of(external_id).await?;
        Ok(Some(profile))
    }

    async fn delete(&self, external_id: i64) -> Result<bool, StorageError> {
        let changed = self
            .conn
            .execute(
                "UPDATE users SET is_deleted = 1 WHERE id = ?1 AND is_deleted = 0",
                params![external_id],
            )
            .await
            .map_err(query_err)?;
        Ok(changed > 0)
    }

    async fn touch(&self, external_id: i64) -> Result<(), StorageError> {
        self.conn
            .execute(
                "UPDATE users SET last_active = ?2 WHERE id = ?1",
                params![external_id, Utc::now().to_rfc3339()],
            )
            .await
            .map_err(query_err)?;
        Ok(())
    }

    async fn list_active_games(&self) -> Result<Vec<GameCatalogEntry>, StorageError> {
        let mut rows = self
            .conn
            .query("SELECT id, name, alias FROM games ORDER BY name", ())
            .await
            .map_err(query_err)?;

        let mut games = Vec::new();
        while let Some(row) = rows.next().await.map_err(query_err)? {
            games.push(GameCatalogEntry {
                id: row.get(0).map_err(query_err)?,
                name: row.get(1).map_err(query_err)?,
                alias: row.get(2).map_err(query_err)?,
            });
        }
        Ok(games)
    }

    async fn seed_games(&self, entries: &[GameCatalogEntry]) -> Result<(), StorageError> {
        for entry in entries {
            self.conn
                .execute(
                    "INSERT OR IGNORE INTO games (name, alias) VALUES (?1, ?2)",
                    params![entry.name.clone(), entry.alias.clone()],
                )
                .await
                .map_err(query_err)?;
        }
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for LibSqlBackend {
    async fn get(&self, user_id: i64) -> Result<ConversationRecord, StateStoreError> {
        let mut rows = self
            .conn
            .query(
                "SELECT record FROM conversations WHERE user_id = ?1",
                params![user_id],
            )
            .await
            .map_err(|e| StateStoreError::ReadFailed { user_id, reason: e.to_string() })?;

        let Some(row) = rows
            .next()
            .await
            .map_err(|e| StateStoreError::ReadFailed { user_id, reason: e.to_string() })?
        else {
            return Ok(ConversationRecord::default());
        };
        let raw: String = row
            .get(0)
            .map_err(|e| StateStoreError::ReadFailed { user_id, reason: e.to_string() })?;
        serde_json::from_str(&raw).map_err(|e| StateStoreError::Serialization(e.to_string()))
    }

    async fn set_state(
        &self,
        user_id: i64,
        state: ConversationState,
    ) -> Result<(), StateStoreError> {
        let mut record = ConversationStore::get(self, user_id).await?;
        record.state = state;
        put_record(&self.conn, user_id, &record).await
    }

    async fn put_scratch(&self, user_id: i64, scratch: &Scratch) -> Result<(), StateStoreError> {
        let mut record = ConversationStore::get(self, user_id).await?;
        record.scratch = scratch.clone();
        put_record(&self.conn, user_id, &record).await
    }

    async fn clear(&self, user_id: i64) -> Result<(), StateStoreError> {
        self.conn
            .execute(
                "DELETE FROM conversations WHERE user_id = ?1",
                params![user_id],
            )
            .await
            .map_err(|e| StateStoreError::WriteFailed { user_id, reason: e.to_string() })?;
        Ok(())
    }
}

async fn put_record(
    conn: &Connection,
    user_id: i64,
    record: &ConversationRecord,
) -> Result<(), StateStoreError> {
    let raw = serde_json::to_string(record)
        .map_err(|e| StateStoreError::Serialization(e.to_string()))?;
    conn.execute(
        "INSERT INTO conversations (user_id, record) VALUES (?1, ?2)
         ON CONFLICT(user_id) DO UPDATE SET record = excluded.record",
        params![user_id, raw],
    )
    .await
    .map_err(|e| StateStoreError::WriteFailed { user_id, reason: e.to_string() })?;
    Ok(())
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
            game_ids: vec![],
            description: Some("hello".into()),
            photo_reference: None,
        }
    }

    #[tokio::test]
    async fn upsert_and_get_roundtrip() {
        let backend = LibSqlBackend::new_memory().await.unwrap();
        backend
            .seed_games(&[
                GameCatalogEntry { id: 0, name: "Arsenal".into(), alias: "arsenal".into() },
                GameCatalogEntry { id: 0, name: "Doors".into(), alias: "doors".into() },
            ])
            .await
            .unwrap();
        let games = backend.list_active_games().await.unwrap();
        assert_eq!(games.len(), 2);

        let mut p = payload(10, "Player_1");
        p.game_ids = games.iter().map(|g| g.id).collect();
        let profile = backend.upsert(&p).await.unwrap();
        assert_eq!(profile.nickname, "Player_1");
        assert_eq!(profile.games.len(), 2);
        assert_eq!(profile.languages, vec!["en"]);
        assert_eq!(profile.description.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn duplicate_nickname_for_other_user_rejected() {
        let backend = LibSqlBackend::new_memory().await.unwrap();
        backend.upsert(&payload(10, "Player_1")).await.unwrap();

        let err = backend.upsert(&payload(11, "Player_1")).await.unwrap_err();
        assert!(matches!(err, StorageError::DuplicateNickname(_)));

        // Same user updating keeps the nickname.
        backend.upsert(&payload(10, "Player_1")).await.unwrap();
    }

    #[tokio::test]
    async fn soft_delete_frees_nickname() {
        let backend = LibSqlBackend::new_memory().await.unwrap();
        backend.upsert(&payload(10, "Player_1")).await.unwrap();
        assert!(backend.delete(10).await.unwrap());
        assert!(ProfileStore::get(&backend, 10).await.unwrap().is_none());
        assert!(!backend.delete(10).await.unwrap());

        backend.upsert(&payload(11, "Player_1")).await.unwrap();
    }

    #[tokio::test]
    async fn upsert_revives_deleted_profile() {
        let backend = LibSqlBackend::new_memory().await.unwrap();
        backend.upsert(&payload(10, "Player_1")).await.unwrap();
        backend.delete(10).await.unwrap();

        backend.upsert(&payload(10, "Player_2")).await.unwrap();
        let profile = ProfileStore::get(&backend, 10).await.unwrap().unwrap();
        assert_eq!(profile.nickname, "Player_2");
    }

    #[tokio::test]
    async fn seed_games_dedupes_by_alias() {
        let backend = LibSqlBackend::new_memory().await.unwrap();
        let entries = [GameCatalogEntry { id: 0, name: "Arsenal".into(), alias: "arsenal".into() }];
        backend.seed_games(&entries).await.unwrap();
        backend.seed_games(&entries).await.unwrap();
        assert_eq!(backend.list_active_games().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn conversation_roundtrip() {
        let backend = LibSqlBackend::new_memory().await.unwrap();
        assert_eq!(
            ConversationStore::get(&backend, 1).await.unwrap().state,
            ConversationState::Idle
        );

        backend.set_state(1, ConversationState::WaitGames).await.unwrap();
        let mut scratch = Scratch::with_locale("en");
        scratch.selected_games.insert(3);
        backend.put_scratch(1, &scratch).await.unwrap();

        let record = ConversationStore::get(&backend, 1).await.unwrap();
        assert_eq!(record.state, ConversationState::WaitGames);
        assert_eq!(record.scratch, scratch);

        backend.clear(1).await.unwrap();
        backend.clear(1).await.unwrap();
        assert_eq!(
            ConversationStore::get(&backend, 1).await.unwrap().state,
            ConversationState::Idle
        );
    }

    #[tokio::test]
    async fn conversation_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("squadmate.db");

        {
            let backend = LibSqlBackend::new_local(&path).await.unwrap();
            backend.set_state(7, ConversationState::WaitBio).await.unwrap();
            backend.put_scratch(7, &Scratch::with_locale("ru")).await.unwrap();
        }

        let backend = LibSqlBackend::new_local(&path).await.unwrap();
        let record = ConversationStore::get(&backend, 7).await.unwrap();
        assert_eq!(record.state, ConversationState::WaitBio);
        assert_eq!(record.scratch.locale.as_deref(), Some("ru"));
    }

    #[tokio::test]
    async fn parse_datetime_formats() {
        let rfc = Utc::now().to_rfc3339();
        assert!(parse_datetime(&rfc) > DateTime::<Utc>::MIN_UTC);
        assert!(parse_datetime("2024-06-01 10:20:30") > DateTime::<Utc>::MIN_UTC);
        assert_eq!(parse_datetime("garbage"), DateTime::<Utc>::MIN_UTC);
    }
}
