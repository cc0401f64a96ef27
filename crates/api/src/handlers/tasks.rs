use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use taskgenie_domain::entities::{JsonMap, TaskDraft, TaskFilter, TaskPriority, TaskStatus};
use taskgenie_domain::service::{TaskQuery, DEFAULT_PAGE_SIZE};
use taskgenie_domain::update::TaskPatch;

use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::response::{TaskListResponse, TaskResponse};
use crate::routes::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub eta: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub metadata: Option<JsonMap>,
}

impl CreateTaskRequest {
    fn into_draft(self) -> TaskDraft {
        TaskDraft {
            title: self.title,
            description: self.description,
            status: self.status,
            priority: self.priority,
            eta: self.eta,
            tags: self.tags,
            metadata: self.metadata,
        }
    }
}

/// Raw listing parameters. Everything arrives as a string so invalid
/// values can be answered with a 422 body instead of a bare rejection.
#[derive(Debug, Default, Deserialize)]
pub struct TaskQueryParams {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_before: Option<String>,
    pub due_after: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl TaskQueryParams {
    fn into_query(self) -> ApiResult<TaskQuery> {
        let status = self
            .status
            .as_deref()
            .map(str::parse::<TaskStatus>)
            .transpose()?;
        let priority = self
            .priority
            .as_deref()
            .map(str::parse::<TaskPriority>)
            .transpose()?;
        let due_before = self
            .due_before
            .as_deref()
            .map(|raw| parse_datetime("due_before", raw))
            .transpose()?;
        let due_after = self
            .due_after
            .as_deref()
            .map(|raw| parse_datetime("due_after", raw))
            .transpose()?;

        let limit = match self.limit.as_deref() {
            None => DEFAULT_PAGE_SIZE,
            Some(raw) => parse_integer("limit", raw)?,
        };
        let offset = match self.offset.as_deref() {
            None => 0,
            Some(raw) => parse_integer("offset", raw)?,
        };

        Ok(TaskQuery {
            filter: TaskFilter {
                status,
                priority,
                due_before,
                due_after,
            },
            limit,
            offset,
        })
    }
}

fn parse_datetime(name: &str, raw: &str) -> ApiResult<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    // Naive timestamps are read as UTC.
    if let Ok(parsed) = raw.parse::<NaiveDateTime>() {
        return Ok(parsed.and_utc());
    }
    Err(ApiError::BadRequest(format!(
        "invalid {name}: expected an RFC 3339 timestamp, got {raw:?}"
    )))
}

fn parse_integer(name: &str, raw: &str) -> ApiResult<i64> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::BadRequest(format!("invalid {name}: expected an integer, got {raw:?}")))
}

pub async fn create_task(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateTaskRequest>,
) -> ApiResult<impl IntoResponse> {
    let detail = state.service.create_task(request.into_draft()).await?;
    Ok((StatusCode::CREATED, Json(TaskResponse::from(detail))))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Query(params): Query<TaskQueryParams>,
) -> ApiResult<Json<TaskListResponse>> {
    let page = state.service.list_tasks(params.into_query()?).await?;
    Ok(Json(TaskListResponse::from(page)))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TaskResponse>> {
    let detail = state.service.get_task(&id).await?;
    Ok(Json(TaskResponse::from(detail)))
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<TaskPatch>,
) -> ApiResult<Json<TaskResponse>> {
    let detail = state.service.update_task(&id, patch).await?;
    Ok(Json(TaskResponse::from(detail)))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.service.delete_task(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use taskgenie_errors::TaskGenieError;

    fn params(pairs: &[(&str, &str)]) -> TaskQueryParams {
        let mut params = TaskQueryParams::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "status" => params.status = value,
                "priority" => params.priority = value,
                "due_before" => params.due_before = value,
                "due_after" => params.due_after = value,
                "limit" => params.limit = value,
                "offset" => params.offset = value,
                other => panic!("unknown param {other}"),
            }
        }
        params
    }

    #[test]
    fn test_into_query_defaults() {
        let query = TaskQueryParams::default().into_query().unwrap();
        assert_eq!(query.limit, DEFAULT_PAGE_SIZE);
        assert_eq!(query.offset, 0);
        assert!(query.filter.status.is_none());
    }

    #[test]
    fn test_into_query_parses_filters() {
        let query = params(&[
            ("status", "in_progress"),
            ("priority", "critical"),
            ("due_before", "2025-01-01T12:00:00Z"),
            ("limit", "10"),
            ("offset", "20"),
        ])
        .into_query()
        .unwrap();

        assert_eq!(query.filter.status, Some(TaskStatus::InProgress));
        assert_eq!(query.filter.priority, Some(TaskPriority::Critical));
        assert!(query.filter.due_before.is_some());
        assert_eq!(query.limit, 10);
        assert_eq!(query.offset, 20);
    }

    #[test]
    fn test_into_query_rejects_invalid_enum() {
        let err = params(&[("status", "done")]).into_query().unwrap_err();
        assert!(matches!(
            err,
            ApiError::Core(TaskGenieError::Validation(_))
        ));
    }

    #[test]
    fn test_into_query_rejects_invalid_datetime() {
        let err = params(&[("due_after", "tomorrow")]).into_query().unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_into_query_rejects_non_numeric_limit() {
        let err = params(&[("limit", "many")]).into_query().unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_naive_datetime_read_as_utc() {
        let parsed = parse_datetime("due_before", "2025-01-01T10:00:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap());
    }
}
