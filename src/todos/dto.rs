use serde::Deserialize;
use time::OffsetDateTime;

use crate::error::ApiError;
use crate::todos::repo::{NewTodo, Priority, Status, TodoPatch};

/// Request body for creating a todo. Every field is optional at the
/// deserialization layer so that a missing field surfaces as field-level
/// validation guidance instead of a deserialization rejection. There is
/// deliberately no owner field: the owner is the authenticated caller.
#[derive(Debug, Deserialize)]
pub struct CreateTodoRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub due_date: Option<OffsetDateTime>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub status: Option<Status>,
}

impl CreateTodoRequest {
    pub fn validate(self) -> Result<NewTodo, ApiError> {
        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ApiError::Validation("name is required".into()))?;
        let due_date = self
            .due_date
            .ok_or_else(|| ApiError::Validation("due_date is required".into()))?;
        let priority = self
            .priority
            .ok_or_else(|| ApiError::Validation("priority is required".into()))?;
        let category = self
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ApiError::Validation("category is required".into()))?;

        Ok(NewTodo {
            name,
            description: self.description.unwrap_or_default(),
            due_date,
            priority,
            category,
            status: self.status.unwrap_or(Status::NotStarted),
        })
    }
}

/// Partial update: absent fields stay untouched, which is distinct from a
/// field the client sent as empty.
#[derive(Debug, Deserialize, Default)]
pub struct UpdateTodoRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub due_date: Option<OffsetDateTime>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub status: Option<Status>,
}

impl UpdateTodoRequest {
    pub fn validate(self) -> Result<TodoPatch, ApiError> {
        if matches!(&self.name, Some(n) if n.trim().is_empty()) {
            return Err(ApiError::Validation("name must not be empty".into()));
        }
        if matches!(&self.category, Some(c) if c.trim().is_empty()) {
            return Err(ApiError::Validation("category must not be empty".into()));
        }
        Ok(TodoPatch {
            name: self.name,
            description: self.description,
            due_date: self.due_date,
            priority: self.priority,
            category: self.category,
            status: self.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_requires_name_due_date_priority_category() {
        let req: CreateTodoRequest = serde_json::from_str(r#"{}"#).unwrap();
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("name"));

        let req: CreateTodoRequest = serde_json::from_str(
            r#"{"name": "Buy milk", "due_date": "2024-01-01T00:00:00Z", "priority": "low"}"#,
        )
        .unwrap();
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("category"));
    }

    #[test]
    fn create_defaults_status_and_description() {
        let req: CreateTodoRequest = serde_json::from_str(
            r#"{
                "name": "Buy milk",
                "due_date": "2024-01-01T00:00:00Z",
                "priority": "low",
                "category": "errand"
            }"#,
        )
        .unwrap();
        let new = req.validate().unwrap();
        assert_eq!(new.status, Status::NotStarted);
        assert_eq!(new.description, "");
        assert_eq!(new.priority, Priority::Low);
    }

    #[test]
    fn create_rejects_empty_name() {
        let req: CreateTodoRequest = serde_json::from_str(
            r#"{
                "name": "   ",
                "due_date": "2024-01-01T00:00:00Z",
                "priority": "low",
                "category": "errand"
            }"#,
        )
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn update_absent_fields_stay_absent() {
        let req: UpdateTodoRequest = serde_json::from_str(r#"{"status": "completed"}"#).unwrap();
        let patch = req.validate().unwrap();
        assert_eq!(patch.status, Some(Status::Completed));
        assert!(patch.name.is_none());
        assert!(patch.due_date.is_none());
    }

    #[test]
    fn update_rejects_emptied_name() {
        let req: UpdateTodoRequest = serde_json::from_str(r#"{"name": ""}"#).unwrap();
        assert!(req.validate().is_err());
    }
}
