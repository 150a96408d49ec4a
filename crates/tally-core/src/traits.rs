use crate::{
    error::TallyError,
    message::{InboundEvent, OutboundReply},
    model::{AppUser, NewUser, Task},
};
use async_trait::async_trait;

/// Messaging Channel trait.
///
/// Every chat platform implements this trait to receive events and send
/// replies. The dispatcher is transport-agnostic and only ever talks to
/// this seam.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name.
    fn name(&self) -> &str;

    /// Start listening for inbound events.
    /// Returns a receiver that yields events in platform arrival order.
    async fn start(&self) -> Result<tokio::sync::mpsc::Receiver<InboundEvent>, TallyError>;

    /// Send a reply back through this channel.
    async fn send(&self, reply: OutboundReply) -> Result<(), TallyError>;

    /// Graceful shutdown.
    async fn stop(&self) -> Result<(), TallyError>;
}

/// Durable mapping from platform identity to user records.
///
/// Reads and writes are scoped to a single user; implementations need
/// row-level isolation only, no global lock.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a user by platform-assigned id.
    async fn find_by_platform_id(&self, platform_user_id: i64)
        -> Result<Option<AppUser>, TallyError>;

    /// Insert a new user record. New users are active and Idle.
    async fn create_user(&self, new_user: &NewUser) -> Result<AppUser, TallyError>;

    /// Persist the mutable fields of an existing user (activation flag and
    /// conversation state).
    async fn save_user(&self, user: &AppUser) -> Result<(), TallyError>;
}

/// Durable mapping from task identity to task records.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert a new open task for a user. The title is stored as given.
    async fn create(&self, user_id: i64, title: &str) -> Result<Task, TallyError>;

    /// Open tasks owned by the user, in insertion order.
    async fn find_open_by_user(&self, user_id: i64) -> Result<Vec<Task>, TallyError>;

    /// First open task of this user whose title matches exactly, in
    /// insertion order (earliest-created duplicate wins).
    async fn find_open_by_title(
        &self,
        user_id: i64,
        title: &str,
    ) -> Result<Option<Task>, TallyError>;

    /// Persist the completed flag of an existing task.
    async fn save(&self, task: &Task) -> Result<(), TallyError>;

    /// Delete every task with this exact title, across all users.
    /// Returns the number of rows deleted; zero matches is not an error.
    async fn delete_by_title(&self, title: &str) -> Result<u64, TallyError>;
}
