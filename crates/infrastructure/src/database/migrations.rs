//! Versioned schema migrations.
//!
//! Each step carries an `apply` and a `revert`; the single-row
//! `schema_version` table records the id of the most recently applied
//! step. A step and its marker update commit in one transaction, so a
//! failed step leaves the store at the previous version.

use async_trait::async_trait;
use sqlx::{Sqlite, SqlitePool, Transaction};
use taskgenie_errors::{TaskGenieError, TaskGenieResult};
use tracing::{debug, info};

const VERSION_TABLE: &str = "schema_version";

/// Lifecycle of the store as seen by the bootstrap sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Uninitialized,
    Migrating,
    Ready,
    /// A migration failed under the permissive policy; the schema may be
    /// stale but the service keeps running.
    Degraded,
}

impl StoreState {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreState::Uninitialized => "uninitialized",
            StoreState::Migrating => "migrating",
            StoreState::Ready => "ready",
            StoreState::Degraded => "degraded",
        }
    }
}

#[async_trait]
pub trait MigrationStep: Send + Sync {
    fn id(&self) -> &'static str;

    async fn apply(&self, tx: &mut Transaction<'_, Sqlite>) -> TaskGenieResult<()>;

    async fn revert(&self, tx: &mut Transaction<'_, Sqlite>) -> TaskGenieResult<()>;
}

pub struct Migrator {
    pool: SqlitePool,
}

impl Migrator {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All known steps, in apply order.
    pub fn steps() -> Vec<Box<dyn MigrationStep>> {
        vec![Box::new(InitialSchema), Box::new(NotificationTracking)]
    }

    pub fn latest_version() -> &'static str {
        "002_notification_tracking"
    }

    /// Version recorded in the store, `None` when the version table itself
    /// does not exist yet (fresh or pre-migration database).
    pub async fn current_version(&self) -> TaskGenieResult<Option<String>> {
        let table: Option<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = $1",
        )
        .bind(VERSION_TABLE)
        .fetch_optional(&self.pool)
        .await?;

        if table.is_none() {
            return Ok(None);
        }

        let row: Option<(String,)> =
            sqlx::query_as(&format!("SELECT version FROM {VERSION_TABLE} LIMIT 1"))
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(version,)| version))
    }

    /// Whether the store is behind the latest registered step. An
    /// in-memory database always starts fresh, so the version check itself
    /// answers this correctly for ephemeral stores too.
    pub async fn needs_migration(&self) -> TaskGenieResult<bool> {
        Ok(self.current_version().await?.as_deref() != Some(Self::latest_version()))
    }

    /// Step ids newer than the stored version, in apply order.
    pub async fn pending(&self) -> TaskGenieResult<Vec<&'static str>> {
        let steps = Self::steps();
        let next = self.next_index(&steps).await?;
        Ok(steps[next..].iter().map(|s| s.id()).collect())
    }

    /// Apply pending steps up to `target` (default: latest). Returns the
    /// ids of the steps that ran; re-running at head is a no-op.
    pub async fn upgrade(&self, target: Option<&str>) -> TaskGenieResult<Vec<&'static str>> {
        let steps = Self::steps();
        let target_index = match target {
            None | Some("head") => steps.len(),
            Some(rev) => Self::index_of(&steps, rev)? + 1,
        };
        let next = self.next_index(&steps).await?;

        if next > target_index {
            return Err(TaskGenieError::migration(format!(
                "target revision {} is older than the current schema; use downgrade",
                target.unwrap_or_default()
            )));
        }

        let mut applied = Vec::new();
        for step in &steps[next..target_index] {
            debug!(step = step.id(), "Applying migration step");
            let mut tx = self.pool.begin().await?;
            step.apply(&mut tx).await?;
            Self::set_version(&mut tx, Some(step.id())).await?;
            tx.commit().await?;
            info!(step = step.id(), "Migration step applied");
            applied.push(step.id());
        }
        Ok(applied)
    }

    /// Revert applied steps down to `target`: `None` reverts one step,
    /// `"base"` reverts everything. The target revision itself stays
    /// applied.
    pub async fn downgrade(&self, target: Option<&str>) -> TaskGenieResult<Vec<&'static str>> {
        let steps = Self::steps();
        let next = self.next_index(&steps).await?;
        if next == 0 {
            return Err(TaskGenieError::migration(
                "nothing to downgrade: no migration has been applied",
            ));
        }

        let keep = match target {
            None | Some("-1") => next - 1,
            Some("base") => 0,
            Some(rev) => Self::index_of(&steps, rev)? + 1,
        };
        if keep >= next {
            return Err(TaskGenieError::migration(format!(
                "target revision {} is not older than the current schema",
                target.unwrap_or_default()
            )));
        }

        let mut reverted = Vec::new();
        for index in (keep..next).rev() {
            let step = &steps[index];
            debug!(step = step.id(), "Reverting migration step");
            let mut tx = self.pool.begin().await?;
            step.revert(&mut tx).await?;
            let new_version = if index == 0 {
                None
            } else {
                Some(steps[index - 1].id())
            };
            Self::set_version(&mut tx, new_version).await?;
            tx.commit().await?;
            info!(step = step.id(), "Migration step reverted");
            reverted.push(step.id());
        }
        Ok(reverted)
    }

    /// Index of the first step that has not been applied yet.
    async fn next_index(&self, steps: &[Box<dyn MigrationStep>]) -> TaskGenieResult<usize> {
        match self.current_version().await? {
            None => Ok(0),
            Some(version) => Ok(Self::index_of(steps, &version)? + 1),
        }
    }

    fn index_of(steps: &[Box<dyn MigrationStep>], revision: &str) -> TaskGenieResult<usize> {
        steps
            .iter()
            .position(|s| s.id() == revision)
            .ok_or_else(|| {
                TaskGenieError::migration(format!("unknown schema revision: {revision}"))
            })
    }

    async fn set_version(
        tx: &mut Transaction<'_, Sqlite>,
        version: Option<&str>,
    ) -> TaskGenieResult<()> {
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {VERSION_TABLE} (version TEXT NOT NULL)"
        ))
        .execute(&mut **tx)
        .await?;
        sqlx::query(&format!("DELETE FROM {VERSION_TABLE}"))
            .execute(&mut **tx)
            .await?;
        if let Some(version) = version {
            sqlx::query(&format!("INSERT INTO {VERSION_TABLE} (version) VALUES ($1)"))
                .bind(version)
                .execute(&mut **tx)
                .await?;
        }
        Ok(())
    }
}

/// 001: tasks, attachments, notifications, chat_history, config tables
/// plus their indexes.
struct InitialSchema;

#[async_trait]
impl MigrationStep for InitialSchema {
    fn id(&self) -> &'static str {
        "001_initial"
    }

    async fn apply(&self, tx: &mut Transaction<'_, Sqlite>) -> TaskGenieResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE tasks (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT,
                status TEXT NOT NULL DEFAULT 'pending',
                priority TEXT NOT NULL DEFAULT 'medium',
                eta DATETIME,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                tags TEXT,
                metadata TEXT
            )
            "#,
        )
        .execute(&mut **tx)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE attachments (
                id TEXT PRIMARY KEY,
                task_id TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
                kind TEXT NOT NULL,
                reference TEXT NOT NULL,
                title TEXT,
                content TEXT,
                metadata TEXT,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&mut **tx)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE notifications (
                id TEXT PRIMARY KEY,
                task_id TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
                kind TEXT NOT NULL,
                scheduled_at DATETIME NOT NULL,
                sent_at DATETIME,
                status TEXT NOT NULL DEFAULT 'pending'
            )
            "#,
        )
        .execute(&mut **tx)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE chat_history (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                timestamp DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&mut **tx)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE config (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&mut **tx)
        .await?;

        let indexes = [
            "CREATE INDEX idx_tasks_status ON tasks(status)",
            "CREATE INDEX idx_tasks_priority ON tasks(priority)",
            "CREATE INDEX idx_tasks_eta ON tasks(eta)",
            "CREATE INDEX idx_tasks_created ON tasks(created_at)",
            "CREATE INDEX idx_attachments_task_id ON attachments(task_id)",
            "CREATE INDEX idx_attachments_kind ON attachments(kind)",
            "CREATE INDEX idx_notifications_task_id ON notifications(task_id)",
            "CREATE INDEX idx_notifications_scheduled ON notifications(scheduled_at)",
            "CREATE INDEX idx_notifications_status ON notifications(status)",
        ];
        for index_sql in indexes {
            sqlx::query(index_sql).execute(&mut **tx).await?;
        }

        Ok(())
    }

    async fn revert(&self, tx: &mut Transaction<'_, Sqlite>) -> TaskGenieResult<()> {
        // Reverse order of creation because of the foreign keys.
        for table in ["config", "chat_history", "notifications", "attachments", "tasks"] {
            sqlx::query(&format!("DROP TABLE IF EXISTS {table}"))
                .execute(&mut **tx)
                .await?;
        }
        Ok(())
    }
}

/// 002: delivery tracking columns on notifications.
struct NotificationTracking;

#[async_trait]
impl MigrationStep for NotificationTracking {
    fn id(&self) -> &'static str {
        "002_notification_tracking"
    }

    async fn apply(&self, tx: &mut Transaction<'_, Sqlite>) -> TaskGenieResult<()> {
        let statements = [
            "ALTER TABLE notifications ADD COLUMN clicked_at DATETIME",
            "ALTER TABLE notifications ADD COLUMN action_taken TEXT",
            "ALTER TABLE notifications ADD COLUMN retry_count INTEGER NOT NULL DEFAULT 0",
        ];
        for statement in statements {
            sqlx::query(statement).execute(&mut **tx).await?;
        }
        Ok(())
    }

    async fn revert(&self, tx: &mut Transaction<'_, Sqlite>) -> TaskGenieResult<()> {
        let statements = [
            "ALTER TABLE notifications DROP COLUMN retry_count",
            "ALTER TABLE notifications DROP COLUMN action_taken",
            "ALTER TABLE notifications DROP COLUMN clicked_at",
        ];
        for statement in statements {
            sqlx::query(statement).execute(&mut **tx).await?;
        }
        Ok(())
    }
}
