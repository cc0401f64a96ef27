use thiserror::Error;

#[cfg(test)]
mod tests;

#[derive(Debug, Error)]
pub enum TaskGenieError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Database operation error: {0}")]
    DatabaseOperation(String),
    #[error("Task not found: {id}")]
    TaskNotFound { id: String },
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type TaskGenieResult<T> = Result<T, TaskGenieError>;

impl TaskGenieError {
    pub fn task_not_found<S: Into<String>>(id: S) -> Self {
        Self::TaskNotFound { id: id.into() }
    }
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }
    pub fn database_error<S: Into<String>>(msg: S) -> Self {
        Self::DatabaseOperation(msg.into())
    }
    pub fn migration<S: Into<String>>(msg: S) -> Self {
        Self::Migration(msg.into())
    }
    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// Stable machine-readable code, surfaced in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            TaskGenieError::TaskNotFound { .. } => "TASK_NOT_FOUND",
            TaskGenieError::Validation(_) => "VALIDATION_ERROR",
            TaskGenieError::Migration(_) => "MIGRATION_ERROR",
            TaskGenieError::Configuration(_) => "CONFIGURATION_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TaskGenieError::Database(_) | TaskGenieError::DatabaseOperation(_)
        )
    }
}

impl From<serde_json::Error> for TaskGenieError {
    fn from(err: serde_json::Error) -> Self {
        TaskGenieError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for TaskGenieError {
    fn from(err: anyhow::Error) -> Self {
        TaskGenieError::Internal(err.to_string())
    }
}
