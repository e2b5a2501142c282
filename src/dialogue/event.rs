//! Inbound events and sender context.

/// Who sent the event and where replies should go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventContext {
    /// Stable platform user id.
    pub user_id: i64,
    /// Chat to answer into.
    pub chat_id: i64,
    /// Message carrying the inline keyboard, for callback events.
    pub message_id: Option<i64>,
    /// Platform username, if set.
    pub username: Option<String>,
    /// Display first name.
    pub first_name: Option<String>,
    /// IETF language tag reported by the client.
    pub language_code: Option<String>,
}

/// The shape of an inbound update, after transport parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A slash command, name without the leading `/`.
    Command { name: String },
    /// Plain text message.
    Text { text: String },
    /// A photo message; the largest size's file reference.
    Photo { file_id: String },
    /// An inline button press.
    Callback { id: String, data: String },
}

impl InboundEvent {
    /// Classify a text message: commands start with `/`.
    ///
    /// `/start@botname` forms are normalized to the bare command name.
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        if let Some(rest) = trimmed.strip_prefix('/') {
            let name = rest
                .split_whitespace()
                .next()
                .unwrap_or("")
                .split('@')
                .next()
                .unwrap_or("")
                .to_lowercase();
            if !name.is_empty() {
                return Self::Command { name };
            }
        }
        Self::Text {
            text: trimmed.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_stays_text() {
        assert_eq!(
            InboundEvent::from_text("hello"),
            InboundEvent::Text { text: "hello".into() }
        );
    }

    #[test]
    fn command_parsed() {
        assert_eq!(
            InboundEvent::from_text("/start"),
            InboundEvent::Command { name: "start".into() }
        );
    }

    #[test]
    fn command_with_bot_suffix_and_args() {
        assert_eq!(
            InboundEvent::from_text("/Start@squadmate_bot now"),
            InboundEvent::Command { name: "start".into() }
        );
    }

    #[test]
    fn bare_slash_is_text() {
        assert_eq!(
            InboundEvent::from_text("/"),
            InboundEvent::Text { text: "/".into() }
        );
    }

    #[test]
    fn surrounding_whitespace_trimmed() {
        assert_eq!(
            InboundEvent::from_text("  /cancel  "),
            InboundEvent::Command { name: "cancel".into() }
        );
    }
}
