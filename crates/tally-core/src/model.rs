use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which multi-step command, if any, is awaiting a follow-up message.
///
/// Held on the persisted user record so it survives across separate inbound
/// events and across worker instances — never in process-wide state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    #[default]
    Idle,
    /// `/add` was sent without a title; the next message is the title.
    AwaitingAddTitle,
    /// `/done` was sent without a target; the next message is a title or a
    /// 0-based position into the open-task list.
    AwaitingCompleteTarget,
    /// `/delete` was sent without a title; the next message is the title.
    AwaitingDeleteTarget,
}

impl ConversationState {
    /// TEXT value stored in the `app_users.state` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingAddTitle => "awaiting_add_title",
            Self::AwaitingCompleteTarget => "awaiting_complete_target",
            Self::AwaitingDeleteTarget => "awaiting_delete_target",
        }
    }

    /// Parse the stored TEXT value. Unknown values fall back to `Idle` so a
    /// stale row never wedges a user in an unreachable state.
    pub fn parse(s: &str) -> Self {
        match s {
            "awaiting_add_title" => Self::AwaitingAddTitle,
            "awaiting_complete_target" => Self::AwaitingCompleteTarget,
            "awaiting_delete_target" => Self::AwaitingDeleteTarget,
            _ => Self::Idle,
        }
    }
}

/// A registered chat user. Created lazily on the first observed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppUser {
    /// Store-assigned id.
    pub id: i64,
    /// Platform-assigned numeric user id (stable, unique).
    pub platform_user_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    /// Activation flag. Content uploads are gated on this.
    pub is_active: bool,
    pub state: ConversationState,
    pub created_at: DateTime<Utc>,
}

/// Profile fields for lazily creating an [`AppUser`] from an inbound event.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub platform_user_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

/// A tracked task. Owned by exactly one user; the title never changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Store-assigned id.
    pub id: i64,
    /// Owning `AppUser.id`.
    pub user_id: i64,
    pub title: String,
    /// Flips false → true exactly once; completed tasks are never reopened.
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_round_trip() {
        for state in [
            ConversationState::Idle,
            ConversationState::AwaitingAddTitle,
            ConversationState::AwaitingCompleteTarget,
            ConversationState::AwaitingDeleteTarget,
        ] {
            assert_eq!(ConversationState::parse(state.as_str()), state);
        }
    }

    #[test]
    fn test_state_unknown_falls_back_to_idle() {
        assert_eq!(
            ConversationState::parse("wait_for_email"),
            ConversationState::Idle
        );
        assert_eq!(ConversationState::parse(""), ConversationState::Idle);
    }
}
