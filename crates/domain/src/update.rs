//! Patch types for precise PATCH semantics.
//!
//! A partial update must distinguish "set to value", "set to null", and
//! "field not supplied". Representing each field as an [`UpdateValue`]
//! makes the distinction type-level instead of relying on runtime
//! introspection of a struct with nullable fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use std::fmt;
use taskgenie_errors::{TaskGenieError, TaskGenieResult};

use crate::entities::{JsonMap, Task, TaskPriority, TaskStatus};
use crate::validation::validate_title;

/// One field of an update document.
///
/// - `Set(T)`: set the field to the value
/// - `Unset`: explicit `null` in the document, clears a nullable field
/// - `NoChange`: field absent from the document, leave untouched
#[derive(Debug, Clone, PartialEq, Default)]
pub enum UpdateValue<T> {
    Set(T),
    Unset,
    #[default]
    NoChange,
}

impl<T> UpdateValue<T> {
    pub fn is_change(&self) -> bool {
        !matches!(self, UpdateValue::NoChange)
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, UpdateValue::Unset)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            UpdateValue::Set(value) => Some(value),
            _ => None,
        }
    }

    /// Apply this update to an existing value.
    pub fn apply_to(self, existing: Option<T>) -> Option<T> {
        match self {
            UpdateValue::Set(value) => Some(value),
            UpdateValue::Unset => None,
            UpdateValue::NoChange => existing,
        }
    }
}

impl<'de, T> Deserialize<'de> for UpdateValue<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Only invoked when the field is present in the document; an absent
        // field falls back to Default (NoChange) via `#[serde(default)]`.
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => UpdateValue::Set(value),
            None => UpdateValue::Unset,
        })
    }
}

impl<T> fmt::Display for UpdateValue<T>
where
    T: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateValue::Set(value) => write!(f, "Set({value})"),
            UpdateValue::Unset => write!(f, "Unset"),
            UpdateValue::NoChange => write!(f, "NoChange"),
        }
    }
}

/// Partial update document for a task. Every field is optional and absence
/// is distinguished from explicit null.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPatch {
    #[serde(default)]
    pub title: UpdateValue<String>,
    #[serde(default)]
    pub description: UpdateValue<String>,
    #[serde(default)]
    pub status: UpdateValue<TaskStatus>,
    #[serde(default)]
    pub priority: UpdateValue<TaskPriority>,
    #[serde(default)]
    pub eta: UpdateValue<DateTime<Utc>>,
    #[serde(default)]
    pub tags: UpdateValue<Vec<String>>,
    #[serde(default)]
    pub metadata: UpdateValue<JsonMap>,
}

impl TaskPatch {
    pub fn has_changes(&self) -> bool {
        self.title.is_change()
            || self.description.is_change()
            || self.status.is_change()
            || self.priority.is_change()
            || self.eta.is_change()
            || self.tags.is_change()
            || self.metadata.is_change()
    }

    /// Reject documents that would break integrity guarantees: the title
    /// must never become null or empty, and enum fields cannot be nulled.
    pub fn validate(&self) -> TaskGenieResult<()> {
        match &self.title {
            UpdateValue::Unset => {
                return Err(TaskGenieError::validation("title cannot be null"));
            }
            UpdateValue::Set(title) => validate_title(title)?,
            UpdateValue::NoChange => {}
        }
        if self.status.is_unset() {
            return Err(TaskGenieError::validation("status cannot be null"));
        }
        if self.priority.is_unset() {
            return Err(TaskGenieError::validation("priority cannot be null"));
        }
        Ok(())
    }

    /// Apply the patch to a task in place. Assumes the patch already passed
    /// [`TaskPatch::validate`]. `updated_at` is refreshed only when the
    /// document carries at least one change.
    pub fn apply_to(&self, task: &mut Task, now: DateTime<Utc>) {
        if !self.has_changes() {
            return;
        }
        if let UpdateValue::Set(title) = &self.title {
            task.title = title.clone();
        }
        task.description = self.description.clone().apply_to(task.description.take());
        if let UpdateValue::Set(status) = &self.status {
            task.status = *status;
        }
        if let UpdateValue::Set(priority) = &self.priority {
            task.priority = *priority;
        }
        task.eta = self.eta.clone().apply_to(task.eta.take());
        task.tags = self.tags.clone().apply_to(task.tags.take());
        task.metadata = self.metadata.clone().apply_to(task.metadata.take());
        task.updated_at = now;
    }
}
