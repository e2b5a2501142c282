//! Long-poll loop — pulls updates and fans them out to per-user workers.
//!
//! Each user gets one worker task fed through an unbounded channel, so a
//! user's events are handled strictly in arrival order while different
//! users proceed concurrently.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedSender};

use crate::dialogue::controller::DialogueController;
use crate::dialogue::event::{EventContext, InboundEvent};
use crate::telegram::types::parse_update;

const POLL_TIMEOUT_SECS: u64 = 30;
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// getUpdates long-polling driver.
pub struct TelegramPoller {
    bot_token: String,
    client: reqwest::Client,
}

impl TelegramPoller {
    pub fn new(bot_token: String) -> Self {
        Self {
            bot_token,
            client: reqwest::Client::new(),
        }
    }

    /// Poll forever, dispatching events through the controller.
    pub async fn run(&self, controller: Arc<DialogueController>) {
        let url = format!("https://api.telegram.org/bot{}/getUpdates", self.bot_token);
        let mut offset: i64 = 0;
        let mut workers: HashMap<i64, UnboundedSender<(EventContext, InboundEvent)>> =
            HashMap::new();

        tracing::info!("Listening for updates...");

        loop {
            let body = serde_json::json!({
                "offset": offset,
                "timeout": POLL_TIMEOUT_SECS,
                "allowed_updates": ["message", "callback_query"]
            });

            let resp = match self.client.post(&url).json(&body).send().await {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!("poll error: {e}");
                    tokio::time::sleep(RETRY_DELAY).await;
                    continue;
                }
            };

            let data: serde_json::Value = match resp.json().await {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!("update parse error: {e}");
                    tokio::time::sleep(RETRY_DELAY).await;
                    continue;
                }
            };

            let Some(results) = data.get("result").and_then(serde_json::Value::as_array) else {
                continue;
            };

            for update in results {
                if let Some(uid) = update.get("update_id").and_then(serde_json::Value::as_i64) {
                    offset = uid + 1;
                }

                let Some((ctx, event)) = parse_update(update) else {
                    continue;
                };

                let tx = workers
                    .entry(ctx.user_id)
                    .or_insert_with(|| spawn_worker(ctx.user_id, controller.clone()));
                if tx.send((ctx.clone(), event.clone())).is_err() {
                    // Worker died; replace it and retry once.
                    let tx = spawn_worker(ctx.user_id, controller.clone());
                    let _ = tx.send((ctx.clone(), event));
                    workers.insert(ctx.user_id, tx);
                }
            }
        }
    }
}

fn spawn_worker(
    user_id: i64,
    controller: Arc<DialogueController>,
) -> UnboundedSender<(EventContext, InboundEvent)> {
    let (tx, mut rx) = mpsc::unbounded_channel::<(EventContext, InboundEvent)>();
    tokio::spawn(async move {
        tracing::debug!(user_id, "worker started");
        while let Some((ctx, event)) = rx.recv().await {
            controller.handle_event(&ctx, event).await;
        }
        tracing::debug!(user_id, "worker stopped");
    });
    tx
}
