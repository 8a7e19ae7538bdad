use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    error::ApiError,
    state::AppState,
    todos::{
        dto::{CreateTodoRequest, UpdateTodoRequest},
        repo::Todo,
    },
};

pub fn todo_routes() -> Router<AppState> {
    Router::new()
        .route("/todos", get(list_todos))
        .route("/todos", post(create_todo))
        .route("/todos/:id", get(get_todo))
        .route("/todos/:id", put(update_todo))
        .route("/todos/:id", delete(delete_todo))
        .route("/todos/:id/toggle", put(toggle_todo))
}

// Every handler below takes the owner id from the verified token, never
// from the path, query or body.

#[instrument(skip(state, auth))]
pub async fn list_todos(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<(HeaderMap, Json<Vec<Todo>>), ApiError> {
    let todos = Todo::list(&state.db, auth.id()).await?;
    Ok((auth.response_headers(), Json(todos)))
}

#[instrument(skip(state, auth))]
pub async fn get_todo(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<(HeaderMap, Json<Todo>), ApiError> {
    let todo = Todo::get(&state.db, id, auth.id())
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok((auth.response_headers(), Json(todo)))
}

#[instrument(skip(state, auth, payload))]
pub async fn create_todo(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateTodoRequest>,
) -> Result<(StatusCode, HeaderMap, Json<Todo>), ApiError> {
    let new = payload.validate()?;
    let todo = Todo::create(&state.db, auth.id(), new).await?;
    info!(todo_id = %todo.id, owner_id = %todo.owner_id, "todo created");
    Ok((StatusCode::CREATED, auth.response_headers(), Json(todo)))
}

#[instrument(skip(state, auth, payload))]
pub async fn update_todo(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTodoRequest>,
) -> Result<(HeaderMap, Json<Todo>), ApiError> {
    let patch = payload.validate()?;
    let todo = Todo::update(&state.db, id, auth.id(), patch)
        .await?
        .ok_or(ApiError::NotFound)?;
    info!(todo_id = %todo.id, owner_id = %todo.owner_id, "todo updated");
    Ok((auth.response_headers(), Json(todo)))
}

#[instrument(skip(state, auth))]
pub async fn toggle_todo(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<(HeaderMap, Json<Todo>), ApiError> {
    let todo = Todo::toggle_status(&state.db, id, auth.id())
        .await?
        .ok_or(ApiError::NotFound)?;
    info!(todo_id = %todo.id, owner_id = %todo.owner_id, status = ?todo.status, "todo status toggled");
    Ok((auth.response_headers(), Json(todo)))
}

#[instrument(skip(state, auth))]
pub async fn delete_todo(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<(HeaderMap, Json<Value>), ApiError> {
    let deleted = Todo::delete(&state.db, id, auth.id()).await?;
    if !deleted {
        return Err(ApiError::NotFound);
    }
    info!(todo_id = %id, owner_id = %auth.id(), "todo deleted");
    Ok((
        auth.response_headers(),
        Json(json!({ "message": "todo deleted" })),
    ))
}
