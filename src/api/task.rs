use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::{
    api::load_report,
    auth::auth::AuthUser,
    error::ApiError,
    model::task::{Task, TaskStatus},
    utils::audit,
};

pub const TASK_COLUMNS: &str =
    "id, title, description, assigned_to, assigned_by, status, progress, due_date, created_at";

#[derive(Deserialize, ToSchema)]
pub struct AssignTask {
    #[schema(example = "Prepare Q3 reconciliation")]
    pub title: String,
    pub description: Option<String>,
    #[schema(example = "2026-11-01", format = "date", value_type = Option<String>)]
    pub due_date: Option<NaiveDate>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateTask {
    pub status: Option<TaskStatus>,
    /// 0-100
    #[schema(example = 60)]
    pub progress: Option<i32>,
}

pub fn validate_progress(progress: Option<i32>) -> Result<(), ApiError> {
    match progress {
        Some(p) if !(0..=100).contains(&p) => {
            Err(ApiError::BadRequest("progress must be between 0 and 100".into()))
        }
        _ => Ok(()),
    }
}

/// Assign Task
#[utoipa::path(
    post,
    path = "/api/team/{emp_id}/tasks",
    params(("emp_id" = u64, Path, description = "Reporting employee")),
    request_body = AssignTask,
    responses(
        (status = 201, description = "Task assigned"),
        (status = 400, description = "Title missing"),
        (status = 403, description = "Not a direct report")
    ),
    security(("bearer_auth" = [])),
    tag = "Task"
)]
pub async fn assign_task(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<AssignTask>,
) -> Result<HttpResponse, ApiError> {
    let emp = load_report(pool.get_ref(), &auth, path.into_inner()).await?;

    let title = payload.title.trim();
    if title.is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".into()));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO tasks
            (title, description, assigned_to, assigned_by, status, progress, due_date, created_at)
        VALUES (?, ?, ?, ?, 'pending', 0, ?, UTC_TIMESTAMP())
        "#,
    )
    .bind(title)
    .bind(&payload.description)
    .bind(emp.id)
    .bind(auth.user_id)
    .bind(payload.due_date)
    .execute(pool.get_ref())
    .await?;

    let who = emp.full_name.as_deref().unwrap_or(&emp.username);
    audit::record(
        pool.get_ref(),
        Some(&auth),
        &format!("Assigned task \"{title}\" to {who}"),
    )
    .await;

    Ok(HttpResponse::Created().json(json!({
        "message": "Task assigned successfully!",
        "id": result.last_insert_id(),
    })))
}

/// Tasks of a direct report, soonest due first
#[utoipa::path(
    get,
    path = "/api/team/{emp_id}/tasks",
    params(("emp_id" = u64, Path, description = "Reporting employee")),
    responses(
        (status = 200, description = "Tasks", body = [Task]),
        (status = 403, description = "Not a direct report")
    ),
    security(("bearer_auth" = [])),
    tag = "Task"
)]
pub async fn team_member_tasks(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let emp = load_report(pool.get_ref(), &auth, path.into_inner()).await?;

    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE assigned_to = ? ORDER BY due_date");
    let tasks = sqlx::query_as::<_, Task>(&sql)
        .bind(emp.id)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(tasks))
}

/// Own tasks
#[utoipa::path(
    get,
    path = "/api/tasks/mine",
    responses((status = 200, description = "Tasks", body = [Task])),
    security(("bearer_auth" = [])),
    tag = "Task"
)]
pub async fn my_tasks(auth: AuthUser, pool: web::Data<MySqlPool>) -> Result<HttpResponse, ApiError> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE assigned_to = ? ORDER BY due_date");
    let tasks = sqlx::query_as::<_, Task>(&sql)
        .bind(auth.user_id)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(tasks))
}

/// Update status and/or progress. Only the assigning supervisor may.
#[utoipa::path(
    put,
    path = "/api/tasks/{task_id}",
    params(("task_id" = u64, Path, description = "Task")),
    request_body = UpdateTask,
    responses(
        (status = 200, description = "Task updated"),
        (status = 400, description = "Progress out of range"),
        (status = 403, description = "Not the assigner"),
        (status = 404, description = "Task not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Task"
)]
pub async fn update_task(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateTask>,
) -> Result<HttpResponse, ApiError> {
    auth.require_supervisor()?;
    let task_id = path.into_inner();
    validate_progress(payload.progress)?;

    let assigned_by = sqlx::query_scalar::<_, u64>("SELECT assigned_by FROM tasks WHERE id = ?")
        .bind(task_id)
        .fetch_optional(pool.get_ref())
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".into()))?;

    if assigned_by != auth.user_id {
        return Err(ApiError::forbidden());
    }

    sqlx::query(
        "UPDATE tasks SET status = COALESCE(?, status), progress = COALESCE(?, progress) WHERE id = ?",
    )
    .bind(payload.status.map(|s| s.as_ref().to_string()))
    .bind(payload.progress)
    .bind(task_id)
    .execute(pool.get_ref())
    .await?;

    audit::record(
        pool.get_ref(),
        Some(&auth),
        &format!("Updated task {task_id} status/progress"),
    )
    .await;

    Ok(HttpResponse::Ok().json(json!({ "message": "Task updated successfully!" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_bounds() {
        assert!(validate_progress(None).is_ok());
        assert!(validate_progress(Some(0)).is_ok());
        assert!(validate_progress(Some(100)).is_ok());
        assert!(validate_progress(Some(101)).is_err());
        assert!(validate_progress(Some(-5)).is_err());
    }
}
