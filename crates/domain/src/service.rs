use std::sync::Arc;

use taskgenie_errors::{TaskGenieError, TaskGenieResult};

use crate::entities::{Attachment, AttachmentDraft, Task, TaskDraft, TaskFilter};
use crate::repositories::{AttachmentRepository, TaskRepository};
use crate::update::TaskPatch;
use crate::validation::validate_title;

pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Listing parameters: filter predicates plus pagination window.
#[derive(Debug, Clone)]
pub struct TaskQuery {
    pub filter: TaskFilter,
    pub limit: i64,
    pub offset: i64,
}

impl Default for TaskQuery {
    fn default() -> Self {
        Self {
            filter: TaskFilter::default(),
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

/// One page of a filtered listing. `total` counts the full filtered set;
/// `page`/`page_size` reflect the caller's pagination request.
#[derive(Debug, Clone)]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

/// A task together with its attachments.
#[derive(Debug, Clone)]
pub struct TaskDetail {
    pub task: Task,
    pub attachments: Vec<Attachment>,
}

/// Query/update core over the task aggregate. Holds injected repository
/// handles; all store access goes through them.
pub struct TaskService {
    tasks: Arc<dyn TaskRepository>,
    attachments: Arc<dyn AttachmentRepository>,
}

impl TaskService {
    pub fn new(tasks: Arc<dyn TaskRepository>, attachments: Arc<dyn AttachmentRepository>) -> Self {
        Self { tasks, attachments }
    }

    pub async fn create_task(&self, draft: TaskDraft) -> TaskGenieResult<TaskDetail> {
        validate_title(&draft.title)?;
        let task = Task::from_draft(draft);
        let created = self.tasks.create(&task).await?;
        Ok(TaskDetail {
            task: created,
            attachments: Vec::new(),
        })
    }

    pub async fn get_task(&self, id: &str) -> TaskGenieResult<TaskDetail> {
        let task = self
            .tasks
            .get_by_id(id)
            .await?
            .ok_or_else(|| TaskGenieError::task_not_found(id))?;
        let attachments = self.attachments.list_for_task(id).await?;
        Ok(TaskDetail { task, attachments })
    }

    pub async fn list_tasks(&self, query: TaskQuery) -> TaskGenieResult<TaskPage> {
        if query.limit < 1 {
            return Err(TaskGenieError::validation("limit must be at least 1"));
        }
        if query.offset < 0 {
            return Err(TaskGenieError::validation("offset cannot be negative"));
        }

        let total = self.tasks.count(&query.filter).await?;
        let tasks = self
            .tasks
            .list(&query.filter, query.limit, query.offset)
            .await?;

        // Integer floor division on purpose: limit=3, offset=7 -> page 3.
        let page = query.offset / query.limit + 1;

        Ok(TaskPage {
            tasks,
            total,
            page,
            page_size: query.limit,
        })
    }

    pub async fn update_task(&self, id: &str, patch: TaskPatch) -> TaskGenieResult<TaskDetail> {
        patch.validate()?;

        // An empty document is a pure no-op: do not touch updated_at.
        if !patch.has_changes() {
            return self.get_task(id).await;
        }

        let task = self
            .tasks
            .update(id, &patch)
            .await?
            .ok_or_else(|| TaskGenieError::task_not_found(id))?;
        let attachments = self.attachments.list_for_task(id).await?;
        Ok(TaskDetail { task, attachments })
    }

    pub async fn delete_task(&self, id: &str) -> TaskGenieResult<()> {
        if !self.tasks.delete(id).await? {
            return Err(TaskGenieError::task_not_found(id));
        }
        Ok(())
    }

    /// Create an attachment under an existing task.
    pub async fn add_attachment(&self, draft: AttachmentDraft) -> TaskGenieResult<Attachment> {
        self.tasks
            .get_by_id(&draft.task_id)
            .await?
            .ok_or_else(|| TaskGenieError::task_not_found(&draft.task_id))?;
        let attachment = Attachment::from_draft(draft);
        self.attachments.create(&attachment).await
    }
}
