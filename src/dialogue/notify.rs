//! Outbound notification capability.

use async_trait::async_trait;

use crate::error::ChannelError;
use crate::keyboards::Keyboard;

/// Where the dialogue's prompts go.
///
/// Implemented by the Telegram client in production and by a recording
/// double in tests.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a text message, optionally with an inline keyboard.
    async fn send(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), ChannelError>;

    /// Send a photo by platform file reference with a caption.
    async fn send_photo(
        &self,
        chat_id: i64,
        photo_reference: &str,
        caption: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), ChannelError>;

    /// Acknowledge a button press; `show_alert` pops a modal.
    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<(), ChannelError>;

    /// Replace the inline keyboard on an existing message.
    async fn edit_keyboard(
        &self,
        chat_id: i64,
        message_id: i64,
        keyboard: Keyboard,
    ) -> Result<(), ChannelError>;
}
