//! Squadmate — Telegram matchmaking bot onboarding core.

pub mod config;
pub mod dialogue;
pub mod error;
pub mod i18n;
pub mod keyboards;
pub mod locale;
pub mod matcher;
pub mod profiles;
pub mod storage;
pub mod telegram;
