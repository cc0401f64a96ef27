use super::*;

#[test]
fn test_task_not_found_display() {
    let err = TaskGenieError::task_not_found("abc-123");
    assert_eq!(err.to_string(), "Task not found: abc-123");
    assert_eq!(err.code(), "TASK_NOT_FOUND");
}

#[test]
fn test_validation_error() {
    let err = TaskGenieError::validation("title cannot be null");
    assert_eq!(err.to_string(), "Validation error: title cannot be null");
    assert_eq!(err.code(), "VALIDATION_ERROR");
    assert!(!err.is_retryable());
}

#[test]
fn test_database_operation_error_is_retryable() {
    let err = TaskGenieError::database_error("connection reset");
    assert!(err.is_retryable());
    assert_eq!(err.code(), "INTERNAL_ERROR");
}

#[test]
fn test_migration_error_code() {
    let err = TaskGenieError::migration("step 002 failed");
    assert_eq!(err.code(), "MIGRATION_ERROR");
    assert!(!err.is_retryable());
}

#[test]
fn test_configuration_error_code() {
    let err = TaskGenieError::config_error("missing database url");
    assert_eq!(err.code(), "CONFIGURATION_ERROR");
}

#[test]
fn test_serde_json_error_conversion() {
    let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    let err: TaskGenieError = json_err.into();
    assert!(matches!(err, TaskGenieError::Serialization(_)));
    assert_eq!(err.code(), "INTERNAL_ERROR");
}

#[test]
fn test_anyhow_error_conversion() {
    let err: TaskGenieError = anyhow::anyhow!("boom").into();
    assert!(matches!(err, TaskGenieError::Internal(_)));
    assert_eq!(err.to_string(), "Internal error: boom");
}

#[test]
fn test_sqlx_error_conversion() {
    let err: TaskGenieError = sqlx::Error::RowNotFound.into();
    assert!(matches!(err, TaskGenieError::Database(_)));
    assert!(err.is_retryable());
}
