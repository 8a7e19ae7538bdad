use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "todo_priority", rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "todo_status", rename_all = "snake_case")]
pub enum Status {
    NotStarted,
    InProgress,
    Completed,
}

impl Status {
    /// Cyclic toggle: not_started -> in_progress -> completed -> not_started.
    pub fn advance(self) -> Self {
        match self {
            Self::NotStarted => Self::InProgress,
            Self::InProgress => Self::Completed,
            Self::Completed => Self::NotStarted,
        }
    }
}

/// Todo record in the database. `owner_id` ties the record to exactly one
/// user; every query below filters on it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Todo {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub due_date: OffsetDateTime,
    pub priority: Priority,
    pub category: String,
    pub status: Status,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Validated input for a new todo. The owner id is not part of this: it
/// comes from the authenticated identity at the call site.
#[derive(Debug, Clone)]
pub struct NewTodo {
    pub name: String,
    pub description: String,
    pub due_date: OffsetDateTime,
    pub priority: Priority,
    pub category: String,
    pub status: Status,
}

/// Partial update. `None` means "leave the column untouched", which is a
/// different state from an empty value the client sent on purpose.
#[derive(Debug, Clone, Default)]
pub struct TodoPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<OffsetDateTime>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub status: Option<Status>,
}

impl Todo {
    pub async fn list(db: &PgPool, owner_id: Uuid) -> Result<Vec<Todo>, sqlx::Error> {
        sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, owner_id, name, description, due_date, priority, category, status,
                   created_at, updated_at
            FROM todos
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(db)
        .await
    }

    /// A todo that exists but belongs to someone else and a todo that does
    /// not exist are both `None`.
    pub async fn get(db: &PgPool, id: Uuid, owner_id: Uuid) -> Result<Option<Todo>, sqlx::Error> {
        sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, owner_id, name, description, due_date, priority, category, status,
                   created_at, updated_at
            FROM todos
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(db)
        .await
    }

    pub async fn create(db: &PgPool, owner_id: Uuid, new: NewTodo) -> Result<Todo, sqlx::Error> {
        sqlx::query_as::<_, Todo>(
            r#"
            INSERT INTO todos (owner_id, name, description, due_date, priority, category, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, owner_id, name, description, due_date, priority, category, status,
                      created_at, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(new.name)
        .bind(new.description)
        .bind(new.due_date)
        .bind(new.priority)
        .bind(new.category)
        .bind(new.status)
        .fetch_one(db)
        .await
    }

    /// Merge the supplied fields into the stored record in a single UPDATE,
    /// so the ownership check and the write cannot race. Returns `None`
    /// when no row matched `(id, owner_id)`.
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        owner_id: Uuid,
        patch: TodoPatch,
    ) -> Result<Option<Todo>, sqlx::Error> {
        sqlx::query_as::<_, Todo>(
            r#"
            UPDATE todos
            SET name        = COALESCE($3, name),
                description = COALESCE($4, description),
                due_date    = COALESCE($5, due_date),
                priority    = COALESCE($6, priority),
                category    = COALESCE($7, category),
                status      = COALESCE($8, status),
                updated_at  = now()
            WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, name, description, due_date, priority, category, status,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(patch.name)
        .bind(patch.description)
        .bind(patch.due_date)
        .bind(patch.priority)
        .bind(patch.category)
        .bind(patch.status)
        .fetch_optional(db)
        .await
    }

    /// Advance the status one step around the cycle. Read and write run in
    /// one transaction with the row locked, so two concurrent toggles
    /// cannot both start from the same state. `None` when no row matched
    /// `(id, owner_id)`.
    pub async fn toggle_status(
        db: &PgPool,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Todo>, sqlx::Error> {
        let mut tx = db.begin().await?;
        let current: Option<Status> = sqlx::query_scalar(
            r#"
            SELECT status
            FROM todos
            WHERE id = $1 AND owner_id = $2
            FOR UPDATE
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(status) = current else {
            return Ok(None);
        };
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            UPDATE todos
            SET status = $3, updated_at = now()
            WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, name, description, due_date, priority, category, status,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(status.advance())
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(Some(todo))
    }

    pub async fn delete(db: &PgPool, id: Uuid, owner_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM todos
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
