use chrono::NaiveDate;
use sqlx::PgPool;
use teamgrid_core::models::{Task, TaskStatus, TaskWithAssignee};
use teamgrid_core::AppError;
use uuid::Uuid;

#[derive(Clone)]
pub struct TaskRepository {
    pool: PgPool,
}

impl TaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_task(
        &self,
        team_id: Uuid,
        assignee: Option<Uuid>,
        task_name: &str,
        task_desc: Option<&str>,
        task_status: TaskStatus,
        task_deadline: Option<NaiveDate>,
    ) -> Result<Task, AppError> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (team_id, user_id, task_name, task_desc, task_status, task_deadline)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING task_id, team_id, user_id, task_name, task_desc, task_status,
                      task_deadline, created_at, updated_at
            "#,
        )
        .bind(team_id)
        .bind(assignee)
        .bind(task_name)
        .bind(task_desc)
        .bind(task_status)
        .bind(task_deadline)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, team_id = %team_id, "Failed to create task");
            AppError::Database(e)
        })?;

        Ok(task)
    }

    /// Tasks for a team board, joined with assignee usernames.
    pub async fn list_tasks(&self, team_id: Uuid) -> Result<Vec<TaskWithAssignee>, AppError> {
        let tasks = sqlx::query_as::<_, TaskWithAssignee>(
            r#"
            SELECT t.task_id, t.task_name, t.task_desc, t.task_status, t.task_deadline,
                   t.user_id, u.username, t.created_at
            FROM tasks t
            LEFT JOIN users u ON u.user_id = t.user_id
            WHERE t.team_id = $1
            ORDER BY t.created_at ASC
            "#,
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(tasks)
    }

    /// Update task fields; `None` leaves a field unchanged. The task must
    /// belong to the team scoped by the caller's route.
    #[allow(clippy::too_many_arguments)]
    pub async fn update_task(
        &self,
        team_id: Uuid,
        task_id: Uuid,
        assignee: Option<Uuid>,
        task_name: Option<&str>,
        task_desc: Option<&str>,
        task_status: Option<TaskStatus>,
        task_deadline: Option<NaiveDate>,
    ) -> Result<Task, AppError> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET user_id = COALESCE($3, user_id),
                task_name = COALESCE($4, task_name),
                task_desc = COALESCE($5, task_desc),
                task_status = COALESCE($6, task_status),
                task_deadline = COALESCE($7, task_deadline),
                updated_at = NOW()
            WHERE team_id = $1 AND task_id = $2
            RETURNING task_id, team_id, user_id, task_name, task_desc, task_status,
                      task_deadline, created_at, updated_at
            "#,
        )
        .bind(team_id)
        .bind(task_id)
        .bind(assignee)
        .bind(task_name)
        .bind(task_desc)
        .bind(task_status)
        .bind(task_deadline)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::RowNotFound = e {
                AppError::NotFound("Task not found".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(task)
    }

    pub async fn delete_task(&self, team_id: Uuid, task_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(r#"DELETE FROM tasks WHERE team_id = $1 AND task_id = $2"#)
            .bind(team_id)
            .bind(task_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Task not found".to_string()));
        }
        Ok(())
    }
}
