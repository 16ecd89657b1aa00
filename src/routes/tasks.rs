use crate::{
    auth::AuthenticatedUserId,
    error::AppError,
    models::{TaskInput, TaskUpdate},
    repository::TaskRepository,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use validator::Validate;

/// Same body for "absent" and "owned by someone else".
pub const TASK_NOT_FOUND: &str = "Task not found";

fn not_found() -> AppError {
    AppError::NotFound(TASK_NOT_FOUND.into())
}

/// Lists every task owned by the authenticated user, newest first.
///
/// ## Responses:
/// - `200 OK`: JSON array of `Task` objects (empty when the user has none).
/// - `401 Unauthorized`: missing or invalid bearer token.
#[get("")]
pub async fn get_tasks(
    tasks: web::Data<dyn TaskRepository>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let tasks = tasks.list_by_user(user_id.0).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a new task for the authenticated user.
///
/// The owner always comes from the token; a `user_id` in the body is ignored.
///
/// ## Request Body:
/// - `title`: required, 1-200 characters.
/// - `description` (optional): up to 1000 characters.
/// - `status` (optional): `pending` (default), `in_progress` or `completed`.
///
/// ## Responses:
/// - `201 Created`: the stored `Task`.
/// - `400 Bad Request`: malformed body or failed validation.
/// - `401 Unauthorized`: missing or invalid bearer token.
#[post("")]
pub async fn create_task(
    tasks: web::Data<dyn TaskRepository>,
    user_id: AuthenticatedUserId,
    task_data: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = tasks.create(user_id.0, &task_data).await?;
    log::info!("user {} created task {}", user_id.0, task.id);

    Ok(HttpResponse::Created().json(task))
}

/// Retrieves a task by id, scoped to the authenticated user.
///
/// ## Responses:
/// - `200 OK`: the `Task`.
/// - `400 Bad Request`: non-numeric id.
/// - `404 Not Found`: no such task for this user.
#[get("/{id}")]
pub async fn get_task(
    tasks: web::Data<dyn TaskRepository>,
    user_id: AuthenticatedUserId,
    task_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let task = tasks
        .find_for_user(task_id.into_inner(), user_id.0)
        .await?
        .ok_or_else(not_found)?;

    Ok(HttpResponse::Ok().json(task))
}

/// Applies a partial update to a task the user owns and returns the re-read row.
///
/// ## Request Body:
/// Any subset of `title`, `description`, `status`.
///
/// ## Responses:
/// - `200 OK`: the current `Task` after the update.
/// - `400 Bad Request`: non-numeric id, malformed body or failed validation.
/// - `404 Not Found`: no such task for this user.
#[put("/{id}")]
pub async fn update_task(
    tasks: web::Data<dyn TaskRepository>,
    user_id: AuthenticatedUserId,
    task_id: web::Path<i64>,
    task_data: web::Json<TaskUpdate>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    let task_id = task_id.into_inner();

    if !tasks.update_for_user(task_id, user_id.0, &task_data).await? {
        return Err(not_found());
    }

    let task = tasks
        .find_for_user(task_id, user_id.0)
        .await?
        .ok_or_else(not_found)?;

    Ok(HttpResponse::Ok().json(task))
}

/// Deletes a task the user owns.
///
/// ## Responses:
/// - `204 No Content`: deleted.
/// - `404 Not Found`: no such task for this user.
#[delete("/{id}")]
pub async fn delete_task(
    tasks: web::Data<dyn TaskRepository>,
    user_id: AuthenticatedUserId,
    task_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let task_id = task_id.into_inner();

    if !tasks.delete_for_user(task_id, user_id.0).await? {
        return Err(not_found());
    }

    log::info!("user {} deleted task {}", user_id.0, task_id);
    Ok(HttpResponse::NoContent().finish())
}
