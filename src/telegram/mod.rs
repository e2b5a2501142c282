//! Telegram transport — Bot API client, update parsing, long-poll loop.

pub mod client;
pub mod poller;
pub mod types;

pub use client::TelegramClient;
pub use poller::TelegramPoller;
