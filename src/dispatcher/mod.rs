//! Dispatcher — the event loop connecting channels, the user store, and the
//! task engine.
//!
//! Owns the per-user pending-command state machine and the per-sender
//! ordering guarantee: events from one sender are processed in arrival
//! order, events from different senders in parallel.

mod pipeline;


use std::collections::HashMap;
use std::sync::Arc;
use tally_core::{
    message::{InboundEvent, OutboundReply},
    traits::{Channel, TaskStore, UserStore},
};
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, warn};

/// The central dispatcher routing inbound events to task operations.
pub struct Dispatcher {
    channels: HashMap<String, Arc<dyn Channel>>,
    users: Arc<dyn UserStore>,
    tasks: Arc<dyn TaskStore>,
    /// Tracks senders with an in-flight dispatch. Later events from a busy
    /// sender are buffered here and drained in arrival order, because the
    /// Awaiting state written by one event is consumed by the next.
    active_senders: Mutex<HashMap<String, Vec<InboundEvent>>>,
}

impl Dispatcher {
    /// Create a new dispatcher.
    pub fn new(
        channels: HashMap<String, Arc<dyn Channel>>,
        users: Arc<dyn UserStore>,
        tasks: Arc<dyn TaskStore>,
    ) -> Self {
        Self {
            channels,
            users,
            tasks,
            active_senders: Mutex::new(HashMap::new()),
        }
    }

    /// Run the main event loop.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        info!(
            "Tally dispatcher running | channels: {}",
            self.channels.keys().cloned().collect::<Vec<_>>().join(", "),
        );

        let (tx, mut rx) = mpsc::channel::<InboundEvent>(256);

        for (name, channel) in &self.channels {
            let mut channel_rx = channel
                .start()
                .await
                .map_err(|e| anyhow::anyhow!("failed to start channel {name}: {e}"))?;
            let tx = tx.clone();
            let channel_name = name.clone();

            tokio::spawn(async move {
                while let Some(event) = channel_rx.recv().await {
                    if tx.send(event).await.is_err() {
                        info!("dispatcher receiver dropped, stopping {channel_name} forwarder");
                        break;
                    }
                }
            });

            info!("Channel started: {name}");
        }

        drop(tx);

        loop {
            tokio::select! {
                Some(event) = rx.recv() => {
                    let dispatcher = self.clone();
                    tokio::spawn(async move {
                        dispatcher.dispatch_event(event).await;
                    });
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        self.shutdown().await;
        Ok(())
    }

    /// Dispatch an event: buffer if the sender is busy, otherwise process,
    /// then drain anything that queued up meanwhile.
    async fn dispatch_event(self: Arc<Self>, event: InboundEvent) {
        let sender_key = format!("{}:{}", event.channel, event.sender_id);

        {
            let mut active = self.active_senders.lock().await;
            if let Some(buffer) = active.get_mut(&sender_key) {
                buffer.push(event);
                info!("buffered event from {sender_key} (dispatch in progress)");
                return;
            }
            active.insert(sender_key.clone(), Vec::new());
        }

        self.handle_event(event).await;

        loop {
            let next = {
                let mut active = self.active_senders.lock().await;
                match active.get_mut(&sender_key) {
                    Some(buffer) if !buffer.is_empty() => Some(buffer.remove(0)),
                    _ => {
                        active.remove(&sender_key);
                        None
                    }
                }
            };

            match next {
                Some(buffered) => {
                    info!("processing buffered event from {sender_key}");
                    self.handle_event(buffered).await;
                }
                None => break,
            }
        }
    }

    /// Graceful shutdown: stop all channels.
    async fn shutdown(&self) {
        info!("Shutting down...");

        for (name, channel) in &self.channels {
            if let Err(e) = channel.stop().await {
                warn!("failed to stop channel {name}: {e}");
            }
        }

        info!("Shutdown complete.");
    }

    /// Send the reply for an event back through its channel.
    async fn send_reply(&self, event: &InboundEvent, text: &str) {
        let reply = OutboundReply {
            reply_target: event.reply_target,
            text: text.to_string(),
        };

        if let Some(channel) = self.channels.get(&event.channel) {
            if let Err(e) = channel.send(reply).await {
                error!("failed to send reply via {}: {e}", event.channel);
            }
        } else {
            error!("no channel found for '{}'", event.channel);
        }
    }
}
