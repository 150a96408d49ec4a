//! Event processing pipeline — content gate, user resolution, and the
//! state-machine precedence rules.

use super::Dispatcher;
use crate::commands::{self, Command, Interpretation};
use crate::engine;
use crate::replies;
use tally_core::{
    error::TallyError,
    message::{AttachmentKind, InboundEvent},
    model::{AppUser, ConversationState, NewUser, Task},
};
use tracing::{error, info};

impl Dispatcher {
    /// Process a single event and send the reply.
    pub(super) async fn handle_event(&self, event: InboundEvent) {
        let preview = match event.text.as_deref() {
            Some(text) if text.chars().count() > 60 => {
                let truncated: String = text.chars().take(60).collect();
                format!("{truncated}...")
            }
            Some(text) => text.to_string(),
            None => format!("<{:?} attachment>", event.attachment),
        };
        info!("[{}] {} says: {}", event.channel, event.sender_name(), preview);

        let reply = self.respond(&event).await;
        self.send_reply(&event, &reply).await;
    }

    /// Turn an event plus stored state into a store mutation and reply text.
    /// Always produces a non-empty reply, exactly one per event.
    pub(super) async fn respond(&self, event: &InboundEvent) -> String {
        let user = match self.load_or_create_user(event).await {
            Ok(user) => user,
            Err(e) => {
                error!("failed to resolve user {}: {e}", event.sender_id);
                return replies::SOMETHING_WENT_WRONG.to_string();
            }
        };

        // Content gate: document/photo events never reach text dispatch.
        if event.attachment != AttachmentKind::None {
            return content_gate_reply(&user).to_string();
        }

        let Some(text) = event.text.as_deref() else {
            // Neither text nor attachment; nothing to do but point at /help.
            return replies::HELP.to_string();
        };

        // Cancel wins over everything, but only on exact equality: inside a
        // continuation, "/cancel extra words" is payload, not a cancel.
        if text == "/cancel" {
            return self.reset_state_with(&user, replies::CANCELLED).await;
        }

        match user.state {
            ConversationState::AwaitingAddTitle => self.finish_add(&user, text).await,
            ConversationState::AwaitingCompleteTarget => self.finish_complete(&user, text).await,
            ConversationState::AwaitingDeleteTarget => self.finish_delete(&user, text).await,
            ConversationState::Idle => self.respond_idle(&user, text).await,
        }
    }

    /// Look up the sender, lazily creating an active Idle user on first
    /// contact.
    async fn load_or_create_user(&self, event: &InboundEvent) -> Result<AppUser, TallyError> {
        if let Some(user) = self.users.find_by_platform_id(event.sender_id).await? {
            return Ok(user);
        }

        info!("new user {} ({})", event.sender_id, event.sender_name());
        self.users
            .create_user(&NewUser {
                platform_user_id: event.sender_id,
                first_name: event.first_name.clone(),
                last_name: event.last_name.clone(),
                username: event.username.clone(),
            })
            .await
    }

    /// Persist an Idle state, then reply. A failed state write falls back to
    /// the generic failure text so the user retries the same step.
    async fn reset_state_with(&self, user: &AppUser, reply: &str) -> String {
        let mut user = user.clone();
        user.state = ConversationState::Idle;
        match self.users.save_user(&user).await {
            Ok(()) => reply.to_string(),
            Err(e) => {
                error!("failed to reset state for user {}: {e}", user.id);
                replies::SOMETHING_WENT_WRONG.to_string()
            }
        }
    }

    /// Persist an Awaiting state and reply with the prompt for the missing
    /// argument.
    async fn enter_state(
        &self,
        user: &AppUser,
        state: ConversationState,
        prompt: &str,
    ) -> String {
        let mut user = user.clone();
        user.state = state;
        match self.users.save_user(&user).await {
            Ok(()) => prompt.to_string(),
            Err(e) => {
                error!("failed to enter state for user {}: {e}", user.id);
                replies::SOMETHING_WENT_WRONG.to_string()
            }
        }
    }

    /// Continuation of `/add`: the entire text is the title.
    async fn finish_add(&self, user: &AppUser, title: &str) -> String {
        match engine::create_task(self.tasks.as_ref(), user, title).await {
            Ok(task) => {
                self.reset_state_with(user, &replies::task_added(&task.title))
                    .await
            }
            Err(TallyError::InvalidInput(_)) => {
                self.reset_state_with(user, replies::EMPTY_TITLE).await
            }
            Err(e) => {
                error!("create task failed for user {}: {e}", user.id);
                replies::SOMETHING_WENT_WRONG.to_string()
            }
        }
    }

    /// Continuation of `/done`: the entire text is a 0-based position or a
    /// title.
    async fn finish_complete(&self, user: &AppUser, target: &str) -> String {
        match self.complete_target(user, target).await {
            Ok(_) => self.reset_state_with(user, replies::TASK_COMPLETED).await,
            Err(TallyError::NotFound(_)) => {
                self.reset_state_with(user, replies::TASK_NOT_FOUND).await
            }
            Err(e) => {
                error!("complete task failed for user {}: {e}", user.id);
                replies::SOMETHING_WENT_WRONG.to_string()
            }
        }
    }

    /// Continuation of `/delete`: the entire text is the title.
    async fn finish_delete(&self, user: &AppUser, title: &str) -> String {
        match engine::remove_by_title(self.tasks.as_ref(), title).await {
            Ok(()) => self.reset_state_with(user, replies::TASK_DELETED).await,
            Err(e) => {
                error!("delete task failed for user {}: {e}", user.id);
                replies::SOMETHING_WENT_WRONG.to_string()
            }
        }
    }

    /// Idle dispatch: classify once, then either act immediately (argument
    /// present) or enter the matching Awaiting state (argument missing).
    async fn respond_idle(&self, user: &AppUser, text: &str) -> String {
        let interpretation = commands::classify(text);

        let Interpretation::Command { command, arg } = interpretation else {
            return replies::HELP.to_string();
        };

        match (command, arg) {
            (Command::Add, Some(title)) => {
                match engine::create_task(self.tasks.as_ref(), user, title).await {
                    Ok(task) => replies::task_added(&task.title),
                    Err(TallyError::InvalidInput(_)) => replies::EMPTY_TITLE.to_string(),
                    Err(e) => {
                        error!("create task failed for user {}: {e}", user.id);
                        replies::SOMETHING_WENT_WRONG.to_string()
                    }
                }
            }
            (Command::Add, None) => {
                self.enter_state(
                    user,
                    ConversationState::AwaitingAddTitle,
                    replies::PROMPT_ADD_TITLE,
                )
                .await
            }
            (Command::Done, Some(target)) => match self.complete_target(user, target).await {
                Ok(_) => replies::TASK_COMPLETED.to_string(),
                Err(TallyError::NotFound(_)) => replies::TASK_NOT_FOUND.to_string(),
                Err(e) => {
                    error!("complete task failed for user {}: {e}", user.id);
                    replies::SOMETHING_WENT_WRONG.to_string()
                }
            },
            (Command::Done, None) => {
                self.enter_state(
                    user,
                    ConversationState::AwaitingCompleteTarget,
                    replies::PROMPT_COMPLETE_TARGET,
                )
                .await
            }
            (Command::Delete, Some(title)) => {
                match engine::remove_by_title(self.tasks.as_ref(), title).await {
                    Ok(()) => replies::TASK_DELETED.to_string(),
                    Err(e) => {
                        error!("delete task failed for user {}: {e}", user.id);
                        replies::SOMETHING_WENT_WRONG.to_string()
                    }
                }
            }
            (Command::Delete, None) => {
                self.enter_state(
                    user,
                    ConversationState::AwaitingDeleteTarget,
                    replies::PROMPT_DELETE_TITLE,
                )
                .await
            }
            (Command::Tasks, _) => {
                match engine::list_open_tasks(self.tasks.as_ref(), user).await {
                    Ok(tasks) => replies::render_task_list(&tasks),
                    Err(e) => {
                        error!("list tasks failed for user {}: {e}", user.id);
                        replies::SOMETHING_WENT_WRONG.to_string()
                    }
                }
            }
            (Command::Help, _) => replies::HELP.to_string(),
            (Command::Start, _) => replies::WELCOME.to_string(),
            (Command::Registration, _) => replies::REGISTRATION_UNAVAILABLE.to_string(),
            // Reachable only via "/cancel@botname" (exact-equality cancel ran
            // first); state is already Idle, confirm and move on.
            (Command::Cancel, None) => replies::CANCELLED.to_string(),
            // "/cancel extra words" in Idle: not a cancel, not a command.
            (Command::Cancel, Some(_)) => replies::HELP.to_string(),
        }
    }

    /// Complete by 0-based position when the target parses as a non-negative
    /// integer, by exact title otherwise.
    async fn complete_target(&self, user: &AppUser, target: &str) -> Result<Task, TallyError> {
        match target.trim().parse::<usize>() {
            Ok(index) => engine::complete_by_position(self.tasks.as_ref(), user, index).await,
            Err(_) => engine::complete_by_title(self.tasks.as_ref(), user, target).await,
        }
    }
}

/// Reply for document/photo events. Inactive or busy users are turned away;
/// everyone else learns uploads are out of scope.
fn content_gate_reply(user: &AppUser) -> &'static str {
    if !user.is_active {
        replies::CONTENT_NOT_ACTIVE
    } else if user.state != ConversationState::Idle {
        replies::CONTENT_BUSY
    } else {
        replies::UPLOADS_UNAVAILABLE
    }
}
