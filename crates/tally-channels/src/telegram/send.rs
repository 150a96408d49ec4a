//! Message sending, the persistent reply keyboard, and command registration.

use super::TelegramChannel;
use crate::utils::split_message;
use tally_core::error::TallyError;
use tracing::{info, warn};

/// Reply keyboard shown under the input field. Each label is a synonym for a
/// slash command; the dispatcher maps them back.
pub(crate) fn main_keyboard() -> serde_json::Value {
    serde_json::json!({
        "keyboard": [
            [ { "text": "Add" }, { "text": "My tasks" } ],
            [ { "text": "Complete" }, { "text": "Delete" } ],
        ],
        "resize_keyboard": true,
        "one_time_keyboard": false,
        "selective": true,
    })
}

impl TelegramChannel {
    /// Send a text message to a specific chat, keyboard attached.
    pub(crate) async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TallyError> {
        let chunks = split_message(text, 4096);

        for chunk in chunks {
            let url = format!("{}/sendMessage", self.base_url);
            let body = serde_json::json!({
                "chat_id": chat_id,
                "text": chunk,
                "reply_markup": main_keyboard(),
            });

            let resp = self
                .client
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(|e| TallyError::Channel(format!("telegram send failed: {e}")))?;

            let status = resp.status();
            if !status.is_success() {
                let error_text = resp.text().await.unwrap_or_default();
                return Err(TallyError::Channel(format!(
                    "telegram send failed ({status}): {error_text}"
                )));
            }
        }

        Ok(())
    }

    /// Register bot commands with Telegram so users see an autocomplete menu.
    /// Best-effort: logs failures but does not propagate errors.
    pub(crate) async fn register_commands(&self) {
        let commands = serde_json::json!({
            "commands": [
                { "command": "help", "description": "Show available commands" },
                { "command": "start", "description": "Welcome and usage hints" },
                { "command": "add", "description": "Add a task" },
                { "command": "tasks", "description": "List your open tasks" },
                { "command": "done", "description": "Complete a task by title or number" },
                { "command": "delete", "description": "Delete a task by title" },
                { "command": "cancel", "description": "Cancel the current command" },
                { "command": "registration", "description": "Account registration" },
            ]
        });

        let url = format!("{}/setMyCommands", self.base_url);
        match self.client.post(&url).json(&commands).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!("registered Telegram bot commands");
            }
            Ok(resp) => {
                let body = resp.text().await.unwrap_or_default();
                warn!("failed to register Telegram bot commands: {body}");
            }
            Err(e) => {
                warn!("failed to register Telegram bot commands: {e}");
            }
        }
    }
}
