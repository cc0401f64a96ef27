use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use taskgenie_domain::entities::Notification;
use taskgenie_domain::repositories::NotificationRepository;
use taskgenie_errors::TaskGenieResult;

const NOTIFICATION_COLUMNS: &str =
    "id, task_id, kind, scheduled_at, sent_at, status, clicked_at, action_taken, retry_count";

pub struct SqliteNotificationRepository {
    pool: SqlitePool,
}

impl SqliteNotificationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_notification(row: &sqlx::sqlite::SqliteRow) -> TaskGenieResult<Notification> {
        Ok(Notification {
            id: row.try_get("id")?,
            task_id: row.try_get("task_id")?,
            kind: row.try_get("kind")?,
            scheduled_at: row.try_get("scheduled_at")?,
            sent_at: row.try_get("sent_at")?,
            status: row.try_get("status")?,
            clicked_at: row.try_get("clicked_at")?,
            action_taken: row.try_get("action_taken")?,
            retry_count: row.try_get("retry_count")?,
        })
    }
}

#[async_trait]
impl NotificationRepository for SqliteNotificationRepository {
    async fn create(&self, notification: &Notification) -> TaskGenieResult<Notification> {
        let sql = format!(
            r#"
            INSERT INTO notifications (id, task_id, kind, scheduled_at, sent_at, status, clicked_at, action_taken, retry_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {NOTIFICATION_COLUMNS}
            "#,
        );
        let row = sqlx::query(&sql)
            .bind(&notification.id)
            .bind(&notification.task_id)
            .bind(&notification.kind)
            .bind(notification.scheduled_at)
            .bind(notification.sent_at)
            .bind(notification.status)
            .bind(notification.clicked_at)
            .bind(&notification.action_taken)
            .bind(notification.retry_count)
            .fetch_one(&self.pool)
            .await?;

        Self::row_to_notification(&row)
    }

    async fn list_for_task(&self, task_id: &str) -> TaskGenieResult<Vec<Notification>> {
        let sql = format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE task_id = $1 ORDER BY scheduled_at ASC, id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(task_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_notification).collect()
    }

    async fn count_for_task(&self, task_id: &str) -> TaskGenieResult<i64> {
        let row = sqlx::query("SELECT COUNT(id) FROM notifications WHERE task_id = $1")
            .bind(task_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get(0)?)
    }
}
