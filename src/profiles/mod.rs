//! Profile domain — models, persistence trait, text rendering.

pub mod format;
pub mod model;
pub mod seed;
pub mod store;

pub use model::{GameCatalogEntry, Profile, RegistrationPayload};
pub use store::{MemoryProfileStore, ProfileStore};
