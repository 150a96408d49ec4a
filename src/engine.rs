//! Task engine — the task operations behind the conversational commands.
//!
//! Pure decision logic over the abstract [`TaskStore`]; the dispatcher owns
//! all conversation-state concerns.

use tally_core::{
    error::TallyError,
    model::{AppUser, Task},
    traits::TaskStore,
};

/// Create a task for the user. The title is trimmed; an empty title is
/// `InvalidInput`. Duplicate titles are allowed.
pub async fn create_task(
    store: &dyn TaskStore,
    user: &AppUser,
    title: &str,
) -> Result<Task, TallyError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(TallyError::InvalidInput("task title is empty".into()));
    }
    store.create(user.id, title).await
}

/// Open tasks owned by the user, in insertion order. An empty list is not
/// an error.
pub async fn list_open_tasks(
    store: &dyn TaskStore,
    user: &AppUser,
) -> Result<Vec<Task>, TallyError> {
    store.find_open_by_user(user.id).await
}

/// Complete the user's first open task with this exact title.
///
/// The lookup only sees open tasks, so completing an already-completed
/// title is `NotFound`. Among duplicates the earliest-created task wins.
pub async fn complete_by_title(
    store: &dyn TaskStore,
    user: &AppUser,
    title: &str,
) -> Result<Task, TallyError> {
    let Some(mut task) = store.find_open_by_title(user.id, title).await? else {
        return Err(TallyError::NotFound(format!("no open task titled '{title}'")));
    };
    task.completed = true;
    store.save(&task).await?;
    Ok(task)
}

/// Complete the user's open task at `index`, a 0-based offset into the
/// freshly recomputed open-task list.
///
/// The offset does not refer to a persisted ordinal: any completion or
/// deletion between two calls shifts every later offset down by one.
pub async fn complete_by_position(
    store: &dyn TaskStore,
    user: &AppUser,
    index: usize,
) -> Result<Task, TallyError> {
    let open = store.find_open_by_user(user.id).await?;
    let Some(mut task) = open.into_iter().nth(index) else {
        return Err(TallyError::NotFound(format!(
            "no open task at position {index}"
        )));
    };
    task.completed = true;
    store.save(&task).await?;
    Ok(task)
}

/// Delete every task with this exact title, across all users. A title with
/// no matches is a no-op, not an error.
pub async fn remove_by_title(store: &dyn TaskStore, title: &str) -> Result<(), TallyError> {
    let deleted = store.delete_by_title(title).await?;
    tracing::debug!("removed {deleted} task(s) titled '{title}'");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::config::StoreConfig;
    use tally_core::model::NewUser;
    use tally_core::traits::UserStore;
    use tally_store::SqliteStore;

    async fn test_store() -> SqliteStore {
        let config = StoreConfig {
            db_path: ":memory:".to_string(),
        };
        SqliteStore::new(&config).await.unwrap()
    }

    async fn test_user(store: &SqliteStore, platform_user_id: i64) -> AppUser {
        store
            .create_user(&NewUser {
                platform_user_id,
                first_name: Some("Test".to_string()),
                last_name: None,
                username: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_then_list_includes_open_task() {
        let store = test_store().await;
        let user = test_user(&store, 1).await;

        let task = create_task(&store, &user, "Buy milk").await.unwrap();
        assert!(!task.completed);

        let open = list_open_tasks(&store, &user).await.unwrap();
        assert!(open.iter().any(|t| t.title == "Buy milk" && !t.completed));
    }

    #[tokio::test]
    async fn test_create_trims_title() {
        let store = test_store().await;
        let user = test_user(&store, 1).await;

        let task = create_task(&store, &user, "  Buy milk  ").await.unwrap();
        assert_eq!(task.title, "Buy milk");
    }

    #[tokio::test]
    async fn test_create_empty_title_is_invalid_input() {
        let store = test_store().await;
        let user = test_user(&store, 1).await;

        let err = create_task(&store, &user, "   ").await.unwrap_err();
        assert!(matches!(err, TallyError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_complete_by_title_marks_done() {
        let store = test_store().await;
        let user = test_user(&store, 1).await;
        create_task(&store, &user, "Buy milk").await.unwrap();

        let done = complete_by_title(&store, &user, "Buy milk").await.unwrap();
        assert!(done.completed);
        assert!(list_open_tasks(&store, &user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_complete_already_completed_title_is_not_found() {
        let store = test_store().await;
        let user = test_user(&store, 1).await;
        create_task(&store, &user, "Buy milk").await.unwrap();
        complete_by_title(&store, &user, "Buy milk").await.unwrap();

        // The lookup is restricted to open tasks.
        let err = complete_by_title(&store, &user, "Buy milk")
            .await
            .unwrap_err();
        assert!(matches!(err, TallyError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_complete_by_title_prefers_earliest_duplicate() {
        let store = test_store().await;
        let user = test_user(&store, 1).await;
        let older = create_task(&store, &user, "Buy milk").await.unwrap();
        let newer = create_task(&store, &user, "Buy milk").await.unwrap();

        let done = complete_by_title(&store, &user, "Buy milk").await.unwrap();
        assert_eq!(done.id, older.id);

        // The newer duplicate is still open.
        let open = list_open_tasks(&store, &user).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, newer.id);
    }

    #[tokio::test]
    async fn test_complete_by_position_targets_fresh_offset() {
        let store = test_store().await;
        let user = test_user(&store, 1).await;
        create_task(&store, &user, "first").await.unwrap();
        create_task(&store, &user, "second").await.unwrap();

        let done = complete_by_position(&store, &user, 0).await.unwrap();
        assert_eq!(done.title, "first");
    }

    #[tokio::test]
    async fn test_complete_by_position_is_recomputed_per_call() {
        let store = test_store().await;
        let user = test_user(&store, 1).await;
        create_task(&store, &user, "first").await.unwrap();
        create_task(&store, &user, "second").await.unwrap();

        // Removing the task at offset 0 shifts "second" into offset 0:
        // the offset is recomputed on every call, not persisted.
        remove_by_title(&store, "first").await.unwrap();
        let done = complete_by_position(&store, &user, 0).await.unwrap();
        assert_eq!(done.title, "second");
    }

    #[tokio::test]
    async fn test_complete_by_position_out_of_range_is_not_found() {
        let store = test_store().await;
        let user = test_user(&store, 1).await;
        create_task(&store, &user, "only").await.unwrap();

        let err = complete_by_position(&store, &user, 1).await.unwrap_err();
        assert!(matches!(err, TallyError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_remove_by_title_spans_users_and_repeats_silently() {
        let store = test_store().await;
        let alice = test_user(&store, 1).await;
        let bob = test_user(&store, 2).await;
        create_task(&store, &alice, "shared").await.unwrap();
        create_task(&store, &bob, "shared").await.unwrap();

        remove_by_title(&store, "shared").await.unwrap();
        assert!(list_open_tasks(&store, &alice).await.unwrap().is_empty());
        assert!(list_open_tasks(&store, &bob).await.unwrap().is_empty());

        // No matches left -- still Ok.
        remove_by_title(&store, "shared").await.unwrap();
    }
}
