//! Onboarding dialogue — state machine, events, state store, controller.

pub mod controller;
pub mod event;
pub mod notify;
pub mod state;
pub mod store;

pub use controller::DialogueController;
pub use event::{EventContext, InboundEvent};
pub use notify::Notifier;
pub use state::{ConversationState, Scratch};
pub use store::{ConversationRecord, ConversationStore, MemoryConversationStore};
