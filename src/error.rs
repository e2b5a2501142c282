//! Error types for squadmate.

/// Top-level error type for the bot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("State store error: {0}")]
    StateStore(#[from] StateStoreError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Profile/catalog storage errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Connection error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Nickname {0} is already taken")]
    DuplicateNickname(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Conversation state store errors.
#[derive(Debug, thiserror::Error)]
pub enum StateStoreError {
    #[error("Connection error: {0}")]
    Pool(String),

    #[error("Read failed for user {user_id}: {reason}")]
    ReadFailed { user_id: i64, reason: String },

    #[error("Write failed for user {user_id}: {reason}")]
    WriteFailed { user_id: i64, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Telegram transport errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Failed to send on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Invalid update payload: {0}")]
    InvalidUpdate(String),
}

/// Result type alias for the bot.
pub type Result<T> = std::result::Result<T, Error>;
