//! User lookup, lazy creation, and state persistence.

use super::{parse_timestamp, SqliteStore};
use async_trait::async_trait;
use chrono::Utc;
use tally_core::{
    error::TallyError,
    model::{AppUser, ConversationState, NewUser},
    traits::UserStore,
};

type UserRow = (
    i64,
    i64,
    Option<String>,
    Option<String>,
    Option<String>,
    bool,
    String,
    String,
);

fn row_to_user(row: UserRow) -> Result<AppUser, TallyError> {
    let (id, platform_user_id, first_name, last_name, username, is_active, state, created_at) = row;
    Ok(AppUser {
        id,
        platform_user_id,
        first_name,
        last_name,
        username,
        is_active,
        state: ConversationState::parse(&state),
        created_at: parse_timestamp(&created_at)?,
    })
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn find_by_platform_id(
        &self,
        platform_user_id: i64,
    ) -> Result<Option<AppUser>, TallyError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, platform_user_id, first_name, last_name, username, \
                    is_active, state, created_at \
             FROM app_users WHERE platform_user_id = ?",
        )
        .bind(platform_user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| TallyError::Store(format!("find user failed: {e}")))?;

        row.map(row_to_user).transpose()
    }

    async fn create_user(&self, new_user: &NewUser) -> Result<AppUser, TallyError> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO app_users \
                 (platform_user_id, first_name, last_name, username, is_active, state, created_at) \
             VALUES (?, ?, ?, ?, 1, 'idle', ?)",
        )
        .bind(new_user.platform_user_id)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.username)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| TallyError::Store(format!("create user failed: {e}")))?;

        Ok(AppUser {
            id: result.last_insert_rowid(),
            platform_user_id: new_user.platform_user_id,
            first_name: new_user.first_name.clone(),
            last_name: new_user.last_name.clone(),
            username: new_user.username.clone(),
            is_active: true,
            state: ConversationState::Idle,
            created_at,
        })
    }

    async fn save_user(&self, user: &AppUser) -> Result<(), TallyError> {
        sqlx::query(
            "UPDATE app_users \
             SET first_name = ?, last_name = ?, username = ?, is_active = ?, state = ? \
             WHERE id = ?",
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.username)
        .bind(user.is_active)
        .bind(user.state.as_str())
        .bind(user.id)
        .execute(&self.pool)
        .await
        .map_err(|e| TallyError::Store(format!("save user failed: {e}")))?;

        Ok(())
    }
}
