use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use taskgenie_domain::entities::{Attachment, JsonMap};
use taskgenie_domain::repositories::AttachmentRepository;
use taskgenie_errors::TaskGenieResult;

const ATTACHMENT_COLUMNS: &str =
    "id, task_id, kind, reference, title, content, metadata, created_at";

pub struct SqliteAttachmentRepository {
    pool: SqlitePool,
}

impl SqliteAttachmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_attachment(row: &sqlx::sqlite::SqliteRow) -> TaskGenieResult<Attachment> {
        let metadata: Option<String> = row.try_get("metadata")?;
        let metadata: Option<JsonMap> = metadata
            .map(|raw| serde_json::from_str(&raw))
            .transpose()?;

        Ok(Attachment {
            id: row.try_get("id")?,
            task_id: row.try_get("task_id")?,
            kind: row.try_get("kind")?,
            reference: row.try_get("reference")?,
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            metadata,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl AttachmentRepository for SqliteAttachmentRepository {
    async fn create(&self, attachment: &Attachment) -> TaskGenieResult<Attachment> {
        let metadata_json = attachment
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let sql = format!(
            r#"
            INSERT INTO attachments (id, task_id, kind, reference, title, content, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ATTACHMENT_COLUMNS}
            "#,
        );
        let row = sqlx::query(&sql)
            .bind(&attachment.id)
            .bind(&attachment.task_id)
            .bind(attachment.kind)
            .bind(&attachment.reference)
            .bind(&attachment.title)
            .bind(&attachment.content)
            .bind(metadata_json)
            .bind(attachment.created_at)
            .fetch_one(&self.pool)
            .await?;

        Self::row_to_attachment(&row)
    }

    async fn list_for_task(&self, task_id: &str) -> TaskGenieResult<Vec<Attachment>> {
        let sql = format!(
            "SELECT {ATTACHMENT_COLUMNS} FROM attachments WHERE task_id = $1 ORDER BY created_at ASC, id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(task_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_attachment).collect()
    }

    async fn count_for_task(&self, task_id: &str) -> TaskGenieResult<i64> {
        let row = sqlx::query("SELECT COUNT(id) FROM attachments WHERE task_id = $1")
            .bind(task_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get(0)?)
    }
}
