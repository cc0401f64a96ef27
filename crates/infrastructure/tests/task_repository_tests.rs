use std::collections::HashSet;

use chrono::{DateTime, TimeZone, Utc};
use sqlx::SqlitePool;
use taskgenie_config::DatabaseConfig;
use taskgenie_domain::entities::{
    Attachment, AttachmentDraft, AttachmentKind, Notification, NotificationDraft, Task, TaskDraft,
    TaskFilter, TaskPriority, TaskStatus,
};
use taskgenie_domain::repositories::{
    AttachmentRepository, NotificationRepository, TaskRepository,
};
use taskgenie_domain::update::TaskPatch;
use taskgenie_infrastructure::{
    DatabaseManager, Migrator, SqliteAttachmentRepository, SqliteNotificationRepository,
    SqliteTaskRepository,
};

async fn setup_pool() -> SqlitePool {
    let config = DatabaseConfig {
        url: Some("sqlite::memory:".to_string()),
        max_connections: 5,
        min_connections: 1,
        connection_timeout_seconds: 5,
    };
    let manager = DatabaseManager::connect("sqlite::memory:", &config)
        .await
        .unwrap();
    let pool = manager.pool().clone();
    Migrator::new(pool.clone()).upgrade(None).await.unwrap();
    pool
}

fn draft(title: &str) -> TaskDraft {
    TaskDraft {
        title: title.to_string(),
        ..Default::default()
    }
}

fn ts(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, hour, 0, 0).unwrap()
}

#[tokio::test]
async fn test_create_then_get_round_trip() {
    let pool = setup_pool().await;
    let repo = SqliteTaskRepository::new(pool);

    let mut metadata = taskgenie_domain::entities::JsonMap::new();
    metadata.insert("source".to_string(), serde_json::json!("email"));

    let task = Task::from_draft(TaskDraft {
        title: "Review PR".to_string(),
        description: Some("the big one".to_string()),
        status: Some(TaskStatus::InProgress),
        priority: Some(TaskPriority::High),
        eta: Some(ts(10)),
        tags: Some(vec!["work".to_string(), "code".to_string()]),
        metadata: Some(metadata),
    });
    let created = repo.create(&task).await.unwrap();
    assert_eq!(created, task);

    let fetched = repo.get_by_id(&task.id).await.unwrap().unwrap();
    assert_eq!(fetched, task);
}

#[tokio::test]
async fn test_get_missing_returns_none() {
    let pool = setup_pool().await;
    let repo = SqliteTaskRepository::new(pool);
    assert!(repo.get_by_id("no-such-id").await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_applies_patch_fields_only() {
    let pool = setup_pool().await;
    let repo = SqliteTaskRepository::new(pool);

    let task = Task::from_draft(TaskDraft {
        title: "Original".to_string(),
        description: Some("keep me?".to_string()),
        eta: Some(ts(9)),
        ..Default::default()
    });
    repo.create(&task).await.unwrap();

    let patch: TaskPatch = serde_json::from_str(
        r#"{"title": "Renamed", "description": null, "status": "completed"}"#,
    )
    .unwrap();
    let updated = repo.update(&task.id, &patch).await.unwrap().unwrap();

    assert_eq!(updated.title, "Renamed");
    assert_eq!(updated.description, None);
    assert_eq!(updated.status, TaskStatus::Completed);
    // untouched fields survive
    assert_eq!(updated.eta, task.eta);
    assert_eq!(updated.priority, task.priority);
    assert_eq!(updated.created_at, task.created_at);
    assert!(updated.updated_at >= task.updated_at);

    let fetched = repo.get_by_id(&task.id).await.unwrap().unwrap();
    assert_eq!(fetched, updated);
}

#[tokio::test]
async fn test_update_missing_returns_none() {
    let pool = setup_pool().await;
    let repo = SqliteTaskRepository::new(pool);

    let patch: TaskPatch = serde_json::from_str(r#"{"title": "x"}"#).unwrap();
    assert!(repo.update("ghost", &patch).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_then_get() {
    let pool = setup_pool().await;
    let repo = SqliteTaskRepository::new(pool);

    let task = Task::from_draft(draft("Short lived"));
    repo.create(&task).await.unwrap();

    assert!(repo.delete(&task.id).await.unwrap());
    assert!(repo.get_by_id(&task.id).await.unwrap().is_none());
    // a second delete finds nothing
    assert!(!repo.delete(&task.id).await.unwrap());
}

#[tokio::test]
async fn test_delete_cascades_to_children() {
    let pool = setup_pool().await;
    let tasks = SqliteTaskRepository::new(pool.clone());
    let attachments = SqliteAttachmentRepository::new(pool.clone());
    let notifications = SqliteNotificationRepository::new(pool);

    let task = Task::from_draft(draft("Parent"));
    tasks.create(&task).await.unwrap();

    for reference in ["https://a.example", "https://b.example"] {
        let attachment = Attachment::from_draft(AttachmentDraft {
            task_id: task.id.clone(),
            kind: AttachmentKind::Url,
            reference: reference.to_string(),
            title: None,
            content: None,
            metadata: None,
        });
        attachments.create(&attachment).await.unwrap();
    }
    for _ in 0..3 {
        let notification = Notification::from_draft(NotificationDraft {
            task_id: task.id.clone(),
            kind: "reminder".to_string(),
            scheduled_at: ts(8),
        });
        notifications.create(&notification).await.unwrap();
    }

    assert_eq!(attachments.count_for_task(&task.id).await.unwrap(), 2);
    assert_eq!(notifications.count_for_task(&task.id).await.unwrap(), 3);

    assert!(tasks.delete(&task.id).await.unwrap());

    assert_eq!(attachments.count_for_task(&task.id).await.unwrap(), 0);
    assert_eq!(notifications.count_for_task(&task.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_attachment_round_trip() {
    let pool = setup_pool().await;
    let tasks = SqliteTaskRepository::new(pool.clone());
    let attachments = SqliteAttachmentRepository::new(pool);

    let task = Task::from_draft(draft("With attachment"));
    tasks.create(&task).await.unwrap();

    let attachment = Attachment::from_draft(AttachmentDraft {
        task_id: task.id.clone(),
        kind: AttachmentKind::Github,
        reference: "org/repo#42".to_string(),
        title: Some("the issue".to_string()),
        content: None,
        metadata: None,
    });
    let created = attachments.create(&attachment).await.unwrap();
    assert_eq!(created, attachment);

    let listed = attachments.list_for_task(&task.id).await.unwrap();
    assert_eq!(listed, vec![attachment]);
}

#[tokio::test]
async fn test_notification_round_trip_with_tracking_fields() {
    let pool = setup_pool().await;
    let tasks = SqliteTaskRepository::new(pool.clone());
    let notifications = SqliteNotificationRepository::new(pool);

    let task = Task::from_draft(draft("With notification"));
    tasks.create(&task).await.unwrap();

    let notification = Notification::from_draft(NotificationDraft {
        task_id: task.id.clone(),
        kind: "due_soon".to_string(),
        scheduled_at: ts(12),
    });
    let created = notifications.create(&notification).await.unwrap();
    assert_eq!(created, notification);
    assert_eq!(created.retry_count, 0);
    assert!(created.clicked_at.is_none());

    let listed = notifications.list_for_task(&task.id).await.unwrap();
    assert_eq!(listed, vec![notification]);
}

#[tokio::test]
async fn test_list_orders_by_created_desc_then_id_asc() {
    let pool = setup_pool().await;
    let repo = SqliteTaskRepository::new(pool.clone());

    // Rows share timestamps on purpose; the id tie-break keeps the order
    // deterministic. Inserted out of id order.
    for (id, created) in [
        ("b", "2025-01-02 10:00:00+00:00"),
        ("c", "2025-01-01 10:00:00+00:00"),
        ("a", "2025-01-02 10:00:00+00:00"),
    ] {
        sqlx::query(
            "INSERT INTO tasks (id, title, status, priority, created_at, updated_at)
             VALUES ($1, 'T', 'pending', 'medium', $2, $2)",
        )
        .bind(id)
        .bind(created)
        .execute(&pool)
        .await
        .unwrap();
    }

    let listed = repo.list(&TaskFilter::default(), 50, 0).await.unwrap();
    let ids: Vec<&str> = listed.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_pagination_union_covers_all_rows() {
    let pool = setup_pool().await;
    let repo = SqliteTaskRepository::new(pool);

    let mut created_ids = HashSet::new();
    for i in 0..7 {
        let task = Task::from_draft(draft(&format!("Task {i}")));
        repo.create(&task).await.unwrap();
        created_ids.insert(task.id);
    }

    let filter = TaskFilter::default();
    assert_eq!(repo.count(&filter).await.unwrap(), 7);

    let limit = 3;
    let mut seen = Vec::new();
    let mut offset = 0;
    loop {
        let page = repo.list(&filter, limit, offset).await.unwrap();
        if page.is_empty() {
            break;
        }
        seen.extend(page.into_iter().map(|t| t.id));
        offset += limit;
    }

    assert_eq!(seen.len(), 7);
    let distinct: HashSet<String> = seen.into_iter().collect();
    assert_eq!(distinct, created_ids);
}

#[tokio::test]
async fn test_filters_and_counts_agree() {
    let pool = setup_pool().await;
    let repo = SqliteTaskRepository::new(pool);

    let t1 = Task::from_draft(TaskDraft {
        title: "T1".to_string(),
        priority: Some(TaskPriority::High),
        eta: Some(ts(10)),
        ..Default::default()
    });
    let t2 = Task::from_draft(TaskDraft {
        title: "T2".to_string(),
        priority: Some(TaskPriority::Low),
        eta: Some(ts(14)),
        ..Default::default()
    });
    let t3 = Task::from_draft(TaskDraft {
        title: "T3".to_string(),
        priority: Some(TaskPriority::High),
        eta: None,
        ..Default::default()
    });
    for task in [&t1, &t2, &t3] {
        repo.create(task).await.unwrap();
    }

    // the worked example: priority=high AND eta <= 12:00 matches only T1
    let filter = TaskFilter {
        priority: Some(TaskPriority::High),
        due_before: Some(ts(12)),
        ..Default::default()
    };
    let listed = repo.list(&filter, 50, 0).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "T1");
    assert_eq!(repo.count(&filter).await.unwrap(), 1);

    // null eta never matches a due bound
    let filter = TaskFilter {
        due_after: Some(ts(0)),
        ..Default::default()
    };
    let titles: Vec<String> = repo
        .list(&filter, 50, 0)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(titles.len(), 2);
    assert!(!titles.contains(&"T3".to_string()));

    // inclusive bounds
    let filter = TaskFilter {
        due_before: Some(ts(10)),
        due_after: Some(ts(10)),
        ..Default::default()
    };
    assert_eq!(repo.count(&filter).await.unwrap(), 1);

    // status filter combines with the rest
    let filter = TaskFilter {
        status: Some(TaskStatus::Completed),
        priority: Some(TaskPriority::High),
        ..Default::default()
    };
    assert_eq!(repo.count(&filter).await.unwrap(), 0);
}

#[tokio::test]
async fn test_dump_and_restore_round_trip() {
    let pool = setup_pool().await;
    let repo = SqliteTaskRepository::new(pool.clone());

    let task = Task::from_draft(TaskDraft {
        title: "Keep 'quoted' text".to_string(),
        tags: Some(vec!["x".to_string()]),
        ..Default::default()
    });
    repo.create(&task).await.unwrap();

    let script = taskgenie_infrastructure::database::dump::dump_database(&pool)
        .await
        .unwrap();
    assert!(script.contains("CREATE TABLE tasks"));
    assert!(script.contains("INSERT INTO \"tasks\""));

    let config = DatabaseConfig {
        url: Some("sqlite::memory:".to_string()),
        max_connections: 1,
        min_connections: 1,
        connection_timeout_seconds: 5,
    };
    let restored = DatabaseManager::connect("sqlite::memory:", &config)
        .await
        .unwrap();
    taskgenie_infrastructure::database::dump::restore_database(restored.pool(), &script)
        .await
        .unwrap();

    let restored_repo = SqliteTaskRepository::new(restored.pool().clone());
    let fetched = restored_repo.get_by_id(&task.id).await.unwrap().unwrap();
    assert_eq!(fetched.title, task.title);
    assert_eq!(fetched.tags, task.tags);

    // the version marker travels with the dump
    let migrator = Migrator::new(restored.pool().clone());
    assert_eq!(
        migrator.current_version().await.unwrap().as_deref(),
        Some(Migrator::latest_version())
    );
}
