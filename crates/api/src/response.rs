use chrono::{DateTime, Utc};
use serde::Serialize;
use taskgenie_domain::entities::{Attachment, JsonMap, Task, TaskPriority, TaskStatus};
use taskgenie_domain::service::{TaskDetail, TaskPage};

/// Standard error body: `{"error": "...", "code": "TASK_NOT_FOUND"}`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskResponse {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub eta: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tags: Option<Vec<String>>,
    pub metadata: Option<JsonMap>,
    pub attachments: Vec<Attachment>,
}

impl TaskResponse {
    /// Shape a bare task; list responses leave attachments empty rather
    /// than fetching them per row.
    pub fn from_task(task: Task) -> Self {
        Self::new(task, Vec::new())
    }

    fn new(task: Task, attachments: Vec<Attachment>) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority,
            eta: task.eta,
            created_at: task.created_at,
            updated_at: task.updated_at,
            tags: task.tags,
            metadata: task.metadata,
            attachments,
        }
    }
}

impl From<TaskDetail> for TaskResponse {
    fn from(detail: TaskDetail) -> Self {
        Self::new(detail.task, detail.attachments)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<TaskResponse>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

impl From<TaskPage> for TaskListResponse {
    fn from(page: TaskPage) -> Self {
        Self {
            tasks: page.tasks.into_iter().map(TaskResponse::from_task).collect(),
            total: page.total,
            page: page.page,
            page_size: page.page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskgenie_domain::entities::TaskDraft;

    #[test]
    fn test_task_response_serializes_expected_fields() {
        let task = Task::from_draft(TaskDraft {
            title: "T".to_string(),
            ..Default::default()
        });
        let response = TaskResponse::from_task(task);
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["status"], "pending");
        assert_eq!(value["priority"], "medium");
        assert!(value["attachments"].as_array().unwrap().is_empty());
        assert!(value["metadata"].is_null());
        assert!(value.get("meta_data").is_none());
    }

    #[test]
    fn test_attachment_kind_serializes_as_type() {
        use taskgenie_domain::entities::{AttachmentDraft, AttachmentKind};

        let attachment = Attachment::from_draft(AttachmentDraft {
            task_id: "t".to_string(),
            kind: AttachmentKind::Gmail,
            reference: "msg-1".to_string(),
            title: None,
            content: None,
            metadata: None,
        });
        let value = serde_json::to_value(&attachment).unwrap();
        assert_eq!(value["type"], "gmail");
        assert!(value.get("kind").is_none());
    }

    #[test]
    fn test_list_response_carries_pagination_metadata() {
        let page = TaskPage {
            tasks: Vec::new(),
            total: 12,
            page: 3,
            page_size: 5,
        };
        let response = TaskListResponse::from(page);
        assert_eq!(response.total, 12);
        assert_eq!(response.page, 3);
        assert_eq!(response.page_size, 5);
    }
}
