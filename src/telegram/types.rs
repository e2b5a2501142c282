//! Update payload parsing — raw getUpdates JSON into dialogue events.

use serde_json::Value;

use crate::dialogue::event::{EventContext, InboundEvent};

/// Extract a dialogue event from one getUpdates entry.
///
/// Returns `None` for update kinds we do not handle (edits, channel posts,
/// stickers and the like) and for payloads missing a sender.
pub fn parse_update(update: &Value) -> Option<(EventContext, InboundEvent)> {
    if let Some(message) = update.get("message") {
        return parse_message(message);
    }
    if let Some(callback) = update.get("callback_query") {
        return parse_callback(callback);
    }
    None
}

fn parse_message(message: &Value) -> Option<(EventContext, InboundEvent)> {
    let from = message.get("from")?;
    let ctx = EventContext {
        user_id: from.get("id")?.as_i64()?,
        chat_id: message.get("chat")?.get("id")?.as_i64()?,
        message_id: message.get("message_id").and_then(Value::as_i64),
        username: string_field(from, "username"),
        first_name: string_field(from, "first_name"),
        language_code: string_field(from, "language_code"),
    };

    if let Some(text) = message.get("text").and_then(Value::as_str) {
        return Some((ctx, InboundEvent::from_text(text)));
    }

    // Telegram lists photo sizes smallest first; take the largest.
    if let Some(sizes) = message.get("photo").and_then(Value::as_array) {
        let file_id = sizes
            .last()
            .and_then(|s| s.get("file_id"))
            .and_then(Value::as_str)?;
        return Some((ctx, InboundEvent::Photo { file_id: file_id.to_string() }));
    }

    None
}

fn parse_callback(callback: &Value) -> Option<(EventContext, InboundEvent)> {
    let from = callback.get("from")?;
    let message = callback.get("message");
    let ctx = EventContext {
        user_id: from.get("id")?.as_i64()?,
        // Callbacks from detached messages fall back to a private chat
        // with the sender.
        chat_id: message
            .and_then(|m| m.get("chat"))
            .and_then(|c| c.get("id"))
            .and_then(Value::as_i64)
            .unwrap_or(from.get("id")?.as_i64()?),
        message_id: message.and_then(|m| m.get("message_id")).and_then(Value::as_i64),
        username: string_field(from, "username"),
        first_name: string_field(from, "first_name"),
        language_code: string_field(from, "language_code"),
    };
    let id = callback.get("id")?.as_str()?.to_string();
    let data = callback.get("data").and_then(Value::as_str)?.to_string();
    Some((ctx, InboundEvent::Callback { id, data }))
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(String::from)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn text_message_parsed() {
        let update = json!({
            "update_id": 100,
            "message": {
                "message_id": 42,
                "from": {
                    "id": 777,
                    "username": "ann",
                    "first_name": "Ann",
                    "language_code": "ru"
                },
                "chat": {"id": 777},
                "text": "hello"
            }
        });
        let (ctx, event) = parse_update(&update).unwrap();
        assert_eq!(ctx.user_id, 777);
        assert_eq!(ctx.chat_id, 777);
        assert_eq!(ctx.message_id, Some(42));
        assert_eq!(ctx.username.as_deref(), Some("ann"));
        assert_eq!(ctx.language_code.as_deref(), Some("ru"));
        assert_eq!(event, InboundEvent::Text { text: "hello".into() });
    }

    #[test]
    fn command_message_parsed() {
        let update = json!({
            "message": {
                "message_id": 1,
                "from": {"id": 5},
                "chat": {"id": 5},
                "text": "/start"
            }
        });
        let (_, event) = parse_update(&update).unwrap();
        assert_eq!(event, InboundEvent::Command { name: "start".into() });
    }

    #[test]
    fn photo_takes_largest_size() {
        let update = json!({
            "message": {
                "message_id": 2,
                "from": {"id": 5},
                "chat": {"id": 5},
                "photo": [
                    {"file_id": "small", "width": 90},
                    {"file_id": "big", "width": 800}
                ]
            }
        });
        let (_, event) = parse_update(&update).unwrap();
        assert_eq!(event, InboundEvent::Photo { file_id: "big".into() });
    }

    #[test]
    fn callback_query_parsed() {
        let update = json!({
            "callback_query": {
                "id": "cb-1",
                "from": {"id": 9, "language_code": "en"},
                "message": {"message_id": 7, "chat": {"id": 9}},
                "data": "game:3"
            }
        });
        let (ctx, event) = parse_update(&update).unwrap();
        assert_eq!(ctx.message_id, Some(7));
        assert_eq!(
            event,
            InboundEvent::Callback { id: "cb-1".into(), data: "game:3".into() }
        );
    }

    #[test]
    fn unsupported_update_skipped() {
        assert!(parse_update(&json!({"edited_message": {}})).is_none());
        assert!(parse_update(&json!({"message": {"from": {"id": 1}, "chat": {"id": 1}, "sticker": {}}})).is_none());
    }
}
