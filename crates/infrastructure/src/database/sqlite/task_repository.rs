use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use taskgenie_domain::entities::{JsonMap, Task, TaskFilter};
use taskgenie_domain::repositories::TaskRepository;
use taskgenie_domain::task_query_builder::{TaskQueryBuilder, TaskQueryParam, TASK_COLUMNS};
use taskgenie_domain::update::TaskPatch;
use taskgenie_errors::TaskGenieResult;
use tracing::{debug, instrument};

pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_task(row: &sqlx::sqlite::SqliteRow) -> TaskGenieResult<Task> {
        let tags: Option<String> = row.try_get("tags")?;
        let tags: Option<Vec<String>> = tags
            .map(|raw| serde_json::from_str(&raw))
            .transpose()?;

        let metadata: Option<String> = row.try_get("metadata")?;
        let metadata: Option<JsonMap> = metadata
            .map(|raw| serde_json::from_str(&raw))
            .transpose()?;

        Ok(Task {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            status: row.try_get("status")?,
            priority: row.try_get("priority")?,
            eta: row.try_get("eta")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            tags,
            metadata,
        })
    }

    fn tags_json(task: &Task) -> TaskGenieResult<Option<String>> {
        task.tags
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(Into::into)
    }

    fn metadata_json(task: &Task) -> TaskGenieResult<Option<String>> {
        task.metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(Into::into)
    }

    fn bind_params<'q>(
        mut query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
        params: &'q [TaskQueryParam],
    ) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
        for param in params {
            query = match param {
                TaskQueryParam::Status(status) => query.bind(*status),
                TaskQueryParam::Priority(priority) => query.bind(*priority),
                TaskQueryParam::Timestamp(ts) => query.bind(*ts),
                TaskQueryParam::Int64(n) => query.bind(*n),
            };
        }
        query
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    #[instrument(skip(self, task), fields(task_id = %task.id))]
    async fn create(&self, task: &Task) -> TaskGenieResult<Task> {
        let sql = format!(
            r#"
            INSERT INTO tasks (id, title, description, status, priority, eta, created_at, updated_at, tags, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {TASK_COLUMNS}
            "#,
        );
        let row = sqlx::query(&sql)
            .bind(&task.id)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.status)
            .bind(task.priority)
            .bind(task.eta)
            .bind(task.created_at)
            .bind(task.updated_at)
            .bind(Self::tags_json(task)?)
            .bind(Self::metadata_json(task)?)
            .fetch_one(&self.pool)
            .await?;

        let created = Self::row_to_task(&row)?;
        debug!(task_id = %created.id, "Task created");
        Ok(created)
    }

    async fn get_by_id(&self, id: &str) -> TaskGenieResult<Option<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_task).transpose()
    }

    /// Read-apply-write in one transaction so a concurrent delete cannot
    /// leave a half-applied row behind.
    #[instrument(skip(self, patch), fields(task_id = %id))]
    async fn update(&self, id: &str, patch: &TaskPatch) -> TaskGenieResult<Option<Task>> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let mut task = Self::row_to_task(&row)?;
        patch.apply_to(&mut task, Utc::now());

        sqlx::query(
            r#"
            UPDATE tasks
            SET title = $2, description = $3, status = $4, priority = $5,
                eta = $6, updated_at = $7, tags = $8, metadata = $9
            WHERE id = $1
            "#,
        )
        .bind(&task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(task.priority)
        .bind(task.eta)
        .bind(task.updated_at)
        .bind(Self::tags_json(&task)?)
        .bind(Self::metadata_json(&task)?)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(task_id = %task.id, "Task updated");
        Ok(Some(task))
    }

    #[instrument(skip(self), fields(task_id = %id))]
    async fn delete(&self, id: &str) -> TaskGenieResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(
        &self,
        filter: &TaskFilter,
        limit: i64,
        offset: i64,
    ) -> TaskGenieResult<Vec<Task>> {
        let (sql, params) = TaskQueryBuilder::build_select_query(filter, limit, offset);
        let rows = Self::bind_params(sqlx::query(&sql), &params)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_task).collect()
    }

    async fn count(&self, filter: &TaskFilter) -> TaskGenieResult<i64> {
        let (sql, params) = TaskQueryBuilder::build_count_query(filter);
        let row = Self::bind_params(sqlx::query(&sql), &params)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get(0)?)
    }
}
