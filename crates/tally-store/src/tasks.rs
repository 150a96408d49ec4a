//! Task CRUD and the global delete-by-title.

use super::{parse_timestamp, SqliteStore};
use async_trait::async_trait;
use chrono::Utc;
use tally_core::{error::TallyError, model::Task, traits::TaskStore};

type TaskRow = (i64, i64, String, bool, String);

fn row_to_task(row: TaskRow) -> Result<Task, TallyError> {
    let (id, user_id, title, completed, created_at) = row;
    Ok(Task {
        id,
        user_id,
        title,
        completed,
        created_at: parse_timestamp(&created_at)?,
    })
}

#[async_trait]
impl TaskStore for SqliteStore {
    async fn create(&self, user_id: i64, title: &str) -> Result<Task, TallyError> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO tasks (user_id, title, completed, created_at) VALUES (?, ?, 0, ?)",
        )
        .bind(user_id)
        .bind(title)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| TallyError::Store(format!("create task failed: {e}")))?;

        Ok(Task {
            id: result.last_insert_rowid(),
            user_id,
            title: title.to_string(),
            completed: false,
            created_at,
        })
    }

    async fn find_open_by_user(&self, user_id: i64) -> Result<Vec<Task>, TallyError> {
        let rows: Vec<TaskRow> = sqlx::query_as(
            "SELECT id, user_id, title, completed, created_at \
             FROM tasks WHERE user_id = ? AND completed = 0 \
             ORDER BY id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| TallyError::Store(format!("list open tasks failed: {e}")))?;

        rows.into_iter().map(row_to_task).collect()
    }

    async fn find_open_by_title(
        &self,
        user_id: i64,
        title: &str,
    ) -> Result<Option<Task>, TallyError> {
        // Earliest-created duplicate wins: insertion order, first match.
        let row: Option<TaskRow> = sqlx::query_as(
            "SELECT id, user_id, title, completed, created_at \
             FROM tasks WHERE user_id = ? AND title = ? AND completed = 0 \
             ORDER BY id ASC LIMIT 1",
        )
        .bind(user_id)
        .bind(title)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| TallyError::Store(format!("find task by title failed: {e}")))?;

        row.map(row_to_task).transpose()
    }

    async fn save(&self, task: &Task) -> Result<(), TallyError> {
        sqlx::query("UPDATE tasks SET completed = ? WHERE id = ?")
            .bind(task.completed)
            .bind(task.id)
            .execute(&self.pool)
            .await
            .map_err(|e| TallyError::Store(format!("save task failed: {e}")))?;

        Ok(())
    }

    async fn delete_by_title(&self, title: &str) -> Result<u64, TallyError> {
        let result = sqlx::query("DELETE FROM tasks WHERE title = ?")
            .bind(title)
            .execute(&self.pool)
            .await
            .map_err(|e| TallyError::Store(format!("delete by title failed: {e}")))?;

        Ok(result.rows_affected())
    }
}
