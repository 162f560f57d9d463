use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{instrument, Span};

use crate::{
    auth::BearerToken,
    error::AppError,
    state::AppState,
    tasks::{
        dto::{CreateTaskRequest, UpdateTaskRequest},
        repo_types::TaskReminder,
        services,
    },
};

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/", get(list_tasks).post(create_task))
        .route(
            "/tasks/:id",
            get(get_task)
                .put(update_task)
                .patch(update_task)
                .delete(delete_task),
        )
}

// Bodies and paths are validated before the caller is identified, so malformed
// requests are rejected without touching auth or ownership.

#[instrument(skip(state, bearer, body), fields(task_id))]
pub async fn create_task(
    State(state): State<AppState>,
    bearer: BearerToken,
    body: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, HeaderMap, Json<TaskReminder>), AppError> {
    let Json(req) = body?;
    req.validate()?;
    let identity = state.identify(&bearer).await?;

    let task = services::create_task(state.tasks.as_ref(), &identity, req).await?;
    Span::current().record("task_id", task.id);

    let mut headers = HeaderMap::new();
    let location = HeaderValue::from_str(&format!("/tasks/{}", task.id))
        .map_err(|e| AppError::Internal(e.into()))?;
    headers.insert(header::LOCATION, location);

    Ok((StatusCode::CREATED, headers, Json(task)))
}

#[instrument(skip(state, bearer))]
pub async fn list_tasks(
    State(state): State<AppState>,
    bearer: BearerToken,
) -> Result<Json<Vec<TaskReminder>>, AppError> {
    let identity = state.identify(&bearer).await?;
    let tasks = services::list_tasks(state.tasks.as_ref(), &identity).await?;
    Ok(Json(tasks))
}

#[instrument(skip(state, bearer, id), fields(task_id))]
pub async fn get_task(
    State(state): State<AppState>,
    bearer: BearerToken,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<TaskReminder>, AppError> {
    let Path(id) = id?;
    Span::current().record("task_id", id);
    let identity = state.identify(&bearer).await?;
    let task = services::get_task(state.tasks.as_ref(), &identity, id).await?;
    Ok(Json(task))
}

#[instrument(skip(state, bearer, id, body), fields(task_id))]
pub async fn update_task(
    State(state): State<AppState>,
    bearer: BearerToken,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<TaskReminder>, AppError> {
    let Path(id) = id?;
    Span::current().record("task_id", id);
    let Json(req) = body?;
    req.validate()?;
    let identity = state.identify(&bearer).await?;

    let task =
        services::update_task(state.tasks.as_ref(), &identity, id, req.into_patch()).await?;
    Ok(Json(task))
}

#[instrument(skip(state, bearer, id), fields(task_id))]
pub async fn delete_task(
    State(state): State<AppState>,
    bearer: BearerToken,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = id?;
    Span::current().record("task_id", id);
    let identity = state.identify(&bearer).await?;
    services::delete_task(state.tasks.as_ref(), &identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
