//! Long-polling update loop and Channel trait implementation.

use super::types::{TgMessage, TgResponse, TgUpdate};
use super::TelegramChannel;
use async_trait::async_trait;
use tally_core::{
    error::TallyError,
    message::{AttachmentKind, InboundEvent, OutboundReply},
    traits::Channel,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&self) -> Result<mpsc::Receiver<InboundEvent>, TallyError> {
        self.register_commands().await;

        let (tx, rx) = mpsc::channel(64);
        let client = self.client.clone();
        let base_url = self.base_url.clone();
        let allowed_users = self.config.allowed_users.clone();
        let last_update_id = self.last_update_id.clone();

        info!("Telegram channel starting long polling...");

        tokio::spawn(async move {
            let mut backoff_secs: u64 = 1;

            loop {
                let last = last_update_id.lock().await;
                let offset = last.map(|id| id + 1);
                drop(last);

                let mut url = format!("{base_url}/getUpdates?timeout=30");
                if let Some(off) = offset {
                    url.push_str(&format!("&offset={off}"));
                }

                let resp = match client
                    .get(&url)
                    .timeout(std::time::Duration::from_secs(35))
                    .send()
                    .await
                {
                    Ok(r) => r,
                    Err(e) => {
                        error!("telegram poll error (retry in {backoff_secs}s): {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;
                        backoff_secs = (backoff_secs * 2).min(60);
                        continue;
                    }
                };

                let body: TgResponse<Vec<TgUpdate>> = match resp.json().await {
                    Ok(b) => b,
                    Err(e) => {
                        error!("telegram parse error (retry in {backoff_secs}s): {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;
                        backoff_secs = (backoff_secs * 2).min(60);
                        continue;
                    }
                };

                if !body.ok {
                    error!(
                        "telegram API error (retry in {backoff_secs}s): {}",
                        body.description.unwrap_or_default()
                    );
                    tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;
                    backoff_secs = (backoff_secs * 2).min(60);
                    continue;
                }

                // Successful poll -- reset backoff.
                backoff_secs = 1;

                let updates = body.result.unwrap_or_default();

                if let Some(last_update) = updates.last() {
                    *last_update_id.lock().await = Some(last_update.update_id);
                }

                for update in updates {
                    let msg = match update.message {
                        Some(m) => m,
                        None => continue,
                    };

                    let event = match event_from_message(msg) {
                        Some(e) => e,
                        None => continue,
                    };

                    if !allowed_users.is_empty() && !allowed_users.contains(&event.sender_id) {
                        warn!("ignoring message from unauthorized user {}", event.sender_id);
                        continue;
                    }

                    if tx.send(event).await.is_err() {
                        info!("telegram channel receiver dropped, stopping poll");
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn send(&self, reply: OutboundReply) -> Result<(), TallyError> {
        self.send_text(reply.reply_target, &reply.text).await
    }

    async fn stop(&self) -> Result<(), TallyError> {
        info!("Telegram channel stopped");
        Ok(())
    }
}

/// Convert a Telegram message into an inbound event.
///
/// Returns `None` for messages the dispatcher has no use for: no sender,
/// group chats, or no text/document/photo payload. A photo or document
/// caption rides along as the event text.
pub(super) fn event_from_message(msg: TgMessage) -> Option<InboundEvent> {
    let user = msg.from?;

    // Group chats are ignored -- task lists are personal.
    if matches!(msg.chat.chat_type.as_str(), "group" | "supergroup") {
        debug!("telegram: ignoring group message from chat {}", msg.chat.id);
        return None;
    }

    let (text, attachment) = if msg.document.is_some() {
        (msg.caption, AttachmentKind::Document)
    } else if msg.photo.is_some() {
        (msg.caption, AttachmentKind::Photo)
    } else if msg.text.is_some() {
        (msg.text, AttachmentKind::None)
    } else {
        return None;
    };

    Some(InboundEvent {
        id: Uuid::new_v4(),
        channel: "telegram".to_string(),
        sender_id: user.id,
        first_name: Some(user.first_name),
        last_name: user.last_name,
        username: user.username,
        text,
        attachment,
        timestamp: chrono::Utc::now(),
        reply_target: msg.chat.id,
    })
}
