use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use taskgenie_errors::TaskGenieError;
use uuid::Uuid;

/// Open key-value map stored as a JSON text column.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
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
}

/// Input for creating a task. Status and priority fall back to
/// `pending`/`medium` when omitted.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub eta: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
    pub metadata: Option<JsonMap>,
}

impl Task {
    pub fn from_draft(draft: TaskDraft) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: draft.title,
            description: draft.description,
            status: draft.status.unwrap_or(TaskStatus::Pending),
            priority: draft.priority.unwrap_or(TaskPriority::Medium),
            eta: draft.eta,
            created_at: now,
            updated_at: now,
            tags: draft.tags,
            metadata: draft.metadata,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaskStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "in_progress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = TaskGenieError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "in_progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            _ => Err(TaskGenieError::validation(format!(
                "invalid task status: {s}, expected one of pending, in_progress, completed"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaskPriority {
    #[serde(rename = "low")]
    Low,
    #[serde(rename = "medium")]
    Medium,
    #[serde(rename = "high")]
    High,
    #[serde(rename = "critical")]
    Critical,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Critical => "critical",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = TaskGenieError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            "critical" => Ok(TaskPriority::Critical),
            _ => Err(TaskGenieError::validation(format!(
                "invalid task priority: {s}, expected one of low, medium, high, critical"
            ))),
        }
    }
}

macro_rules! sqlite_text_enum {
    ($name:ident) => {
        impl sqlx::Type<sqlx::Sqlite> for $name {
            fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
                <str as sqlx::Type<sqlx::Sqlite>>::type_info()
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for $name {
            fn decode(
                value: sqlx::sqlite::SqliteValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let s = <&str as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
                s.parse::<$name>().map_err(|e| e.to_string().into())
            }
        }

        impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
            ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
                <&str as sqlx::Encode<sqlx::Sqlite>>::encode(self.as_str(), buf)
            }
        }
    };
}

sqlite_text_enum!(TaskStatus);
sqlite_text_enum!(TaskPriority);
sqlite_text_enum!(NotificationStatus);
sqlite_text_enum!(AttachmentKind);

/// Filter predicates for task listing. All supplied predicates are ANDed;
/// a task with null `eta` never matches either due bound.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_before: Option<DateTime<Utc>>,
    pub due_after: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AttachmentKind {
    #[serde(rename = "gmail")]
    Gmail,
    #[serde(rename = "github")]
    Github,
    #[serde(rename = "url")]
    Url,
    #[serde(rename = "doc")]
    Doc,
}

impl AttachmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentKind::Gmail => "gmail",
            AttachmentKind::Github => "github",
            AttachmentKind::Url => "url",
            AttachmentKind::Doc => "doc",
        }
    }
}

impl FromStr for AttachmentKind {
    type Err = TaskGenieError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gmail" => Ok(AttachmentKind::Gmail),
            "github" => Ok(AttachmentKind::Github),
            "url" => Ok(AttachmentKind::Url),
            "doc" => Ok(AttachmentKind::Doc),
            _ => Err(TaskGenieError::validation(format!(
                "invalid attachment kind: {s}, expected one of gmail, github, url, doc"
            ))),
        }
    }
}

/// External reference bound to exactly one task. No independent existence:
/// deleting the owning task cascades to its attachments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub task_id: String,
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    pub reference: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub metadata: Option<JsonMap>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AttachmentDraft {
    pub task_id: String,
    pub kind: AttachmentKind,
    pub reference: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub metadata: Option<JsonMap>,
}

impl Attachment {
    pub fn from_draft(draft: AttachmentDraft) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            task_id: draft.task_id,
            kind: draft.kind,
            reference: draft.reference,
            title: draft.title,
            content: draft.content,
            metadata: draft.metadata,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NotificationStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "sent")]
    Sent,
    #[serde(rename = "failed")]
    Failed,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Pending => "pending",
            NotificationStatus::Sent => "sent",
            NotificationStatus::Failed => "failed",
        }
    }
}

impl FromStr for NotificationStatus {
    type Err = TaskGenieError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(NotificationStatus::Pending),
            "sent" => Ok(NotificationStatus::Sent),
            "failed" => Ok(NotificationStatus::Failed),
            _ => Err(TaskGenieError::validation(format!(
                "invalid notification status: {s}, expected one of pending, sent, failed"
            ))),
        }
    }
}

/// Scheduled reminder tied to one task. Stored only; dispatch is out of
/// scope. Transitions pending → sent/failed independently of the task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub task_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub scheduled_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub status: NotificationStatus,
    pub clicked_at: Option<DateTime<Utc>>,
    pub action_taken: Option<String>,
    pub retry_count: i64,
}

#[derive(Debug, Clone)]
pub struct NotificationDraft {
    pub task_id: String,
    pub kind: String,
    pub scheduled_at: DateTime<Utc>,
}

impl Notification {
    pub fn from_draft(draft: NotificationDraft) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            task_id: draft.task_id,
            kind: draft.kind,
            scheduled_at: draft.scheduled_at,
            sent_at: None,
            status: NotificationStatus::Pending,
            clicked_at: None,
            action_taken: None,
            retry_count: 0,
        }
    }
}

/// One turn of a chat transcript. Storage only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub session_id: String,
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Free-form application config row. Storage only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_draft_applies_defaults() {
        let task = Task::from_draft(TaskDraft {
            title: "Buy milk".to_string(),
            ..Default::default()
        });

        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.priority, TaskPriority::Medium);
        assert_eq!(task.created_at, task.updated_at);
        assert_eq!(task.id.len(), 36);
    }

    #[test]
    fn test_from_draft_keeps_explicit_values() {
        let task = Task::from_draft(TaskDraft {
            title: "Ship release".to_string(),
            status: Some(TaskStatus::InProgress),
            priority: Some(TaskPriority::Critical),
            ..Default::default()
        });

        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.priority, TaskPriority::Critical);
    }

    #[test]
    fn test_task_status_round_trip() {
        for status in [
            TaskStatus::Pending,
            TaskStatus::InProgress,
            TaskStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), status);
        }
        assert!("done".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_task_priority_round_trip() {
        for priority in [
            TaskPriority::Low,
            TaskPriority::Medium,
            TaskPriority::High,
            TaskPriority::Critical,
        ] {
            assert_eq!(priority.as_str().parse::<TaskPriority>().unwrap(), priority);
        }
        assert!("urgent".parse::<TaskPriority>().is_err());
    }

    #[test]
    fn test_status_serde_uses_snake_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        let back: TaskStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(back, TaskStatus::InProgress);
    }

    #[test]
    fn test_notification_from_draft() {
        let n = Notification::from_draft(NotificationDraft {
            task_id: "t-1".to_string(),
            kind: "reminder".to_string(),
            scheduled_at: Utc::now(),
        });
        assert_eq!(n.status, NotificationStatus::Pending);
        assert_eq!(n.retry_count, 0);
        assert!(n.sent_at.is_none());
        assert!(n.clicked_at.is_none());
    }
}
