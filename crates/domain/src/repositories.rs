use async_trait::async_trait;
use taskgenie_errors::TaskGenieResult;

use crate::entities::{Attachment, Notification, Task, TaskFilter};
use crate::update::TaskPatch;

/// Persistence port for tasks. Implementations own their transactions:
/// `update` runs its read-apply-write cycle atomically.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create(&self, task: &Task) -> TaskGenieResult<Task>;

    async fn get_by_id(&self, id: &str) -> TaskGenieResult<Option<Task>>;

    /// Apply a validated patch to the stored row. Returns `None` when the
    /// id does not exist; nothing is written in that case.
    async fn update(&self, id: &str, patch: &TaskPatch) -> TaskGenieResult<Option<Task>>;

    /// Delete the row. Returns whether a row was removed; child rows go
    /// with it via foreign-key cascade.
    async fn delete(&self, id: &str) -> TaskGenieResult<bool>;

    async fn list(
        &self,
        filter: &TaskFilter,
        limit: i64,
        offset: i64,
    ) -> TaskGenieResult<Vec<Task>>;

    async fn count(&self, filter: &TaskFilter) -> TaskGenieResult<i64>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttachmentRepository: Send + Sync {
    async fn create(&self, attachment: &Attachment) -> TaskGenieResult<Attachment>;

    async fn list_for_task(&self, task_id: &str) -> TaskGenieResult<Vec<Attachment>>;

    async fn count_for_task(&self, task_id: &str) -> TaskGenieResult<i64>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: &Notification) -> TaskGenieResult<Notification>;

    async fn list_for_task(&self, task_id: &str) -> TaskGenieResult<Vec<Notification>>;

    async fn count_for_task(&self, task_id: &str) -> TaskGenieResult<i64>;
}
