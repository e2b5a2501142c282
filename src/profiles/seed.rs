//! Games catalog seeding from the bundled JSON file.

use std::path::Path;

use crate::error::ConfigError;
use crate::profiles::model::{GameCatalogEntry, GameSeedEntry};

/// Read and normalize the games seed file.
///
/// A missing file is not an error; the catalog simply stays as-is and the
/// bot reports it empty until an operator seeds it.
pub fn load_seed_file(path: &Path) -> Result<Vec<GameCatalogEntry>, ConfigError> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "games seed file not found, skipping");
        return Ok(Vec::new());
    }
    let raw = std::fs::read_to_string(path)?;
    let entries: Vec<GameSeedEntry> =
        serde_json::from_str(&raw).map_err(|e| ConfigError::InvalidValue {
            key: "GAMES_DATA_PATH".into(),
            message: e.to_string(),
        })?;
    Ok(normalize(entries))
}

/// Drop entries without an alias and default the name to the alias.
///
/// Ids are assigned by the database on insert, so they stay zero here.
pub fn normalize(entries: Vec<GameSeedEntry>) -> Vec<GameCatalogEntry> {
    entries
        .into_iter()
        .filter_map(|entry| {
            let alias = entry
                .alias
                .map(|a| a.trim().to_lowercase())
                .filter(|a| !a.is_empty())?;
            let name = entry
                .name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| alias.clone());
            Some(GameCatalogEntry { id: 0, name, alias })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(name: Option<&str>, alias: Option<&str>) -> GameSeedEntry {
        GameSeedEntry {
            name: name.map(String::from),
            alias: alias.map(String::from),
            category: None,
        }
    }

    #[test]
    fn normalize_fills_name_from_alias() {
        let out = normalize(vec![seed(None, Some("mm2"))]);
        assert_eq!(out[0].name, "mm2");
        assert_eq!(out[0].alias, "mm2");
    }

    #[test]
    fn normalize_drops_entries_without_alias() {
        let out = normalize(vec![seed(Some("Tower of Hell"), None), seed(None, Some("  "))]);
        assert!(out.is_empty());
    }

    #[test]
    fn missing_file_yields_empty() {
        let out = load_seed_file(Path::new("/nonexistent/games.json")).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn parse_full_seed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("games.json");
        std::fs::write(
            &path,
            r#"[
                {"name": "Arsenal", "alias": "arsenal", "category": "shooter"},
                {"name": "Adopt Me!", "alias": "adopt-me"}
            ]"#,
        )
        .unwrap();

        let out = load_seed_file(&path).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].alias, "adopt-me");
    }
}
