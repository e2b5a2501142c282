//! Environment-driven configuration.

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::error::ConfigError;

/// Bot settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Telegram Bot API token.
    pub bot_token: String,
    /// Path to the local libSQL database file.
    pub database_path: PathBuf,
    /// Default interface language when nothing better is known.
    pub default_language: String,
    /// Locales the bot can speak, in preference order.
    pub supported_languages: Vec<String>,
    /// Telegram user ids allowed to run admin commands.
    pub admin_ids: BTreeSet<i64>,
    /// Path to the games seed file (JSON array of {name, alias, category}).
    pub games_data_path: PathBuf,
}

impl Settings {
    /// Load settings from environment variables.
    ///
    /// `BOT_TOKEN` is required; everything else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bot_token = std::env::var("BOT_TOKEN")
            .map_err(|_| ConfigError::MissingEnvVar("BOT_TOKEN".into()))?;

        let database_path = std::env::var("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/squadmate.db"));

        let default_language =
            std::env::var("DEFAULT_LANGUAGE").unwrap_or_else(|_| "ru".to_string());

        let supported_languages = std::env::var("SUPPORTED_LANGUAGES")
            .map(|raw| parse_language_list(&raw))
            .unwrap_or_default();
        let supported_languages = if supported_languages.is_empty() {
            vec!["ru".to_string(), "en".to_string()]
        } else {
            supported_languages
        };

        let admin_ids = std::env::var("ADMIN_IDS")
            .map(|raw| parse_admin_ids(&raw))
            .unwrap_or_default();

        let games_data_path = std::env::var("GAMES_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/games.json"));

        Ok(Self {
            bot_token,
            database_path,
            default_language,
            supported_languages,
            admin_ids,
            games_data_path,
        })
    }

    /// Whether a Telegram user id is in the admin allow-list.
    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_ids.contains(&user_id)
    }
}

/// Parse a comma-separated admin id list, skipping non-numeric entries.
fn parse_admin_ids(raw: &str) -> BTreeSet<i64> {
    raw.split(',')
        .filter_map(|item| item.trim().parse::<i64>().ok())
        .collect()
}

fn parse_language_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim().to_lowercase())
        .filter(|item| !item.is_empty())
        .collect()
}
