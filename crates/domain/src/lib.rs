pub mod entities;
pub mod repositories;
pub mod service;
pub mod task_query_builder;
pub mod update;
pub mod validation;

pub use entities::{
    Attachment, AttachmentDraft, AttachmentKind, ChatMessage, ConfigEntry, JsonMap, Notification,
    NotificationDraft, NotificationStatus, Task, TaskDraft, TaskFilter, TaskPriority, TaskStatus,
};
pub use repositories::{AttachmentRepository, NotificationRepository, TaskRepository};
pub use service::{TaskDetail, TaskPage, TaskQuery, TaskService, DEFAULT_PAGE_SIZE};
pub use update::{TaskPatch, UpdateValue};
