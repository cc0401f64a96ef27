use chrono::{DateTime, Utc};

use crate::entities::{TaskFilter, TaskPriority, TaskStatus};

pub const TASK_COLUMNS: &str =
    "id, title, description, status, priority, eta, created_at, updated_at, tags, metadata";

/// Business logic for building task listing queries. Keeps the SQL
/// generation out of the repository implementation so the filter and
/// ordering rules stay unit-testable without a database.
pub struct TaskQueryBuilder;

impl TaskQueryBuilder {
    /// Build the SELECT for a filtered, paginated task page.
    ///
    /// Ordering is `created_at DESC, id ASC` so pagination across equal
    /// timestamps stays deterministic. Due bounds are inclusive; rows with
    /// null `eta` fall out of either bound by SQL NULL semantics.
    pub fn build_select_query(
        filter: &TaskFilter,
        limit: i64,
        offset: i64,
    ) -> (String, Vec<TaskQueryParam>) {
        let (mut query, mut params) = Self::filtered_query(
            &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE 1=1"),
            filter,
        );

        query.push_str(" ORDER BY created_at DESC, id ASC");

        params.push(TaskQueryParam::Int64(limit));
        query.push_str(&format!(" LIMIT ${}", params.len()));

        params.push(TaskQueryParam::Int64(offset));
        query.push_str(&format!(" OFFSET ${}", params.len()));

        (query, params)
    }

    /// Build the COUNT over the same filters, without pagination, so the
    /// reported total always reflects the full filtered set.
    pub fn build_count_query(filter: &TaskFilter) -> (String, Vec<TaskQueryParam>) {
        Self::filtered_query("SELECT COUNT(id) FROM tasks WHERE 1=1", filter)
    }

    fn filtered_query(base: &str, filter: &TaskFilter) -> (String, Vec<TaskQueryParam>) {
        let mut query = base.to_string();
        let mut params = Vec::new();

        if let Some(status) = filter.status {
            params.push(TaskQueryParam::Status(status));
            query.push_str(&format!(" AND status = ${}", params.len()));
        }

        if let Some(priority) = filter.priority {
            params.push(TaskQueryParam::Priority(priority));
            query.push_str(&format!(" AND priority = ${}", params.len()));
        }

        if let Some(due_before) = filter.due_before {
            params.push(TaskQueryParam::Timestamp(due_before));
            query.push_str(&format!(" AND eta <= ${}", params.len()));
        }

        if let Some(due_after) = filter.due_after {
            params.push(TaskQueryParam::Timestamp(due_after));
            query.push_str(&format!(" AND eta >= ${}", params.len()));
        }

        (query, params)
    }
}

/// Query parameter types for type-safe parameter binding.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskQueryParam {
    Status(TaskStatus),
    Priority(TaskPriority),
    Timestamp(DateTime<Utc>),
    Int64(i64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_select_query_no_filter() {
        let filter = TaskFilter::default();
        let (query, params) = TaskQueryBuilder::build_select_query(&filter, 50, 0);

        assert!(query.starts_with("SELECT id, title, description"));
        assert!(query.contains("ORDER BY created_at DESC, id ASC"));
        assert!(query.contains("LIMIT $1"));
        assert!(query.contains("OFFSET $2"));
        assert_eq!(
            params,
            vec![TaskQueryParam::Int64(50), TaskQueryParam::Int64(0)]
        );
    }

    #[test]
    fn test_build_select_query_with_status() {
        let filter = TaskFilter {
            status: Some(TaskStatus::Pending),
            ..Default::default()
        };
        let (query, params) = TaskQueryBuilder::build_select_query(&filter, 10, 5);

        assert!(query.contains("AND status = $1"));
        assert!(query.contains("LIMIT $2"));
        assert!(query.contains("OFFSET $3"));
        assert_eq!(params.len(), 3);
        assert_eq!(params[0], TaskQueryParam::Status(TaskStatus::Pending));
    }

    #[test]
    fn test_build_select_query_with_all_filters() {
        let now = Utc::now();
        let filter = TaskFilter {
            status: Some(TaskStatus::InProgress),
            priority: Some(TaskPriority::High),
            due_before: Some(now),
            due_after: Some(now),
        };
        let (query, params) = TaskQueryBuilder::build_select_query(&filter, 20, 0);

        assert!(query.contains("AND status = $1"));
        assert!(query.contains("AND priority = $2"));
        assert!(query.contains("AND eta <= $3"));
        assert!(query.contains("AND eta >= $4"));
        assert!(query.contains("LIMIT $5"));
        assert!(query.contains("OFFSET $6"));
        assert_eq!(params.len(), 6);
    }

    #[test]
    fn test_ordering_comes_before_pagination() {
        let (query, _) = TaskQueryBuilder::build_select_query(&TaskFilter::default(), 10, 0);
        let order_pos = query.find("ORDER BY").unwrap();
        let limit_pos = query.find("LIMIT").unwrap();
        assert!(order_pos < limit_pos);
    }

    #[test]
    fn test_build_count_query_shares_filters() {
        let filter = TaskFilter {
            priority: Some(TaskPriority::Low),
            ..Default::default()
        };
        let (query, params) = TaskQueryBuilder::build_count_query(&filter);

        assert!(query.starts_with("SELECT COUNT(id) FROM tasks"));
        assert!(query.contains("AND priority = $1"));
        assert!(!query.contains("LIMIT"));
        assert!(!query.contains("OFFSET"));
        assert_eq!(params, vec![TaskQueryParam::Priority(TaskPriority::Low)]);
    }
}
