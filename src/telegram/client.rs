//! Telegram Bot API client — implements the dialogue's `Notifier`.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::dialogue::notify::Notifier;
use crate::error::ChannelError;
use crate::keyboards::Keyboard;

/// Thin JSON client over the Bot API.
pub struct TelegramClient {
    bot_token: String,
    client: reqwest::Client,
}

impl TelegramClient {
    pub fn new(bot_token: String) -> Self {
        Self {
            bot_token,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{method}", self.bot_token)
    }

    /// Verify the token by calling getMe.
    pub async fn health_check(&self) -> Result<(), ChannelError> {
        let resp = self
            .client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map_err(|e| ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: format!("getMe returned {}", resp.status()),
            })
        }
    }

    async fn post(&self, method: &str, body: &Value) -> Result<reqwest::Response, ChannelError> {
        self.client
            .post(self.api_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })
    }

    async fn post_ok(&self, method: &str, body: &Value) -> Result<(), ChannelError> {
        let resp = self.post(method, body).await?;
        if resp.status().is_success() {
            return Ok(());
        }
        let status = resp.status();
        let detail = resp.text().await.unwrap_or_default();
        Err(ChannelError::SendFailed {
            name: "telegram".into(),
            reason: format!("{method} failed ({status}): {detail}"),
        })
    }
}

/// Serialize a keyboard as Bot API inline reply markup.
fn reply_markup(keyboard: &Keyboard) -> Value {
    let rows: Vec<Vec<Value>> = keyboard
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|b| json!({"text": b.text, "callback_data": b.callback_data}))
                .collect()
        })
        .collect();
    json!({ "inline_keyboard": rows })
}

#[async_trait]
impl Notifier for TelegramClient {
    /// Send a message, HTML-first with a plain retry.
    ///
    /// Prompts carry HTML tags (`<b>`, `<code>`); a tag Telegram rejects
    /// should not swallow the message.
    async fn send(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), ChannelError> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML"
        });
        if let Some(kb) = &keyboard {
            body["reply_markup"] = reply_markup(kb);
        }

        let resp = self.post("sendMessage", &body).await?;
        if resp.status().is_success() {
            return Ok(());
        }
        let html_status = resp.status();
        tracing::warn!(
            status = ?html_status,
            "sendMessage with HTML failed; retrying without parse_mode"
        );

        let mut plain = json!({ "chat_id": chat_id, "text": text });
        if let Some(kb) = &keyboard {
            plain["reply_markup"] = reply_markup(kb);
        }
        self.post_ok("sendMessage", &plain).await
    }

    async fn send_photo(
        &self,
        chat_id: i64,
        photo_reference: &str,
        caption: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), ChannelError> {
        let mut body = json!({
            "chat_id": chat_id,
            "photo": photo_reference,
            "caption": caption,
            "parse_mode": "HTML"
        });
        if let Some(kb) = &keyboard {
            body["reply_markup"] = reply_markup(kb);
        }
        self.post_ok("sendPhoto", &body).await
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<(), ChannelError> {
        let mut body = json!({ "callback_query_id": callback_id });
        if let Some(t) = text {
            body["text"] = Value::String(t.to_string());
            body["show_alert"] = Value::Bool(show_alert);
        }
        self.post_ok("answerCallbackQuery", &body).await
    }

    async fn edit_keyboard(
        &self,
        chat_id: i64,
        message_id: i64,
        keyboard: Keyboard,
    ) -> Result<(), ChannelError> {
        let body = json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "reply_markup": reply_markup(&keyboard)
        });
        self.post_ok("editMessageReplyMarkup", &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboards::Button;

    #[test]
    fn api_url_embeds_token() {
        let client = TelegramClient::new("123:ABC".into());
        assert_eq!(
            client.api_url("getUpdates"),
            "https://api.telegram.org/bot123:ABC/getUpdates"
        );
    }

    #[test]
    fn reply_markup_shape() {
        let kb = Keyboard {
            rows: vec![
                vec![
                    Button { text: "Русский".into(), callback_data: "lang:ru".into() },
                    Button { text: "English".into(), callback_data: "lang:en".into() },
                ],
                vec![Button { text: "✔️ Done".into(), callback_data: "games:done".into() }],
            ],
        };
        let markup = reply_markup(&kb);
        assert_eq!(markup["inline_keyboard"][0][1]["callback_data"], "lang:en");
        assert_eq!(markup["inline_keyboard"][1][0]["text"], "✔️ Done");
    }

    #[tokio::test]
    async fn send_fails_without_network() {
        let client = TelegramClient::new("fake-token".into());
        let result = client.send(1, "hello", None).await;
        assert!(result.is_err());
    }
}
