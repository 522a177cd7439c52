use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::{
    api::{load_report, today},
    auth::auth::AuthUser,
    error::ApiError,
    model::{
        attendance::Attendance,
        user::{USER_COLUMNS, User, UserView},
    },
    utils::audit,
};

/// Direct reports of a supervisor, resolved through the `manager_id` index.
pub async fn reports_of(pool: &MySqlPool, supervisor_id: u64) -> Result<Vec<User>, sqlx::Error> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE manager_id = ? ORDER BY id");
    sqlx::query_as::<_, User>(&sql)
        .bind(supervisor_id)
        .fetch_all(pool)
        .await
}

#[derive(Serialize, ToSchema)]
pub struct TeamMemberStats {
    pub employee: UserView,
    pub today_attendance: Option<Attendance>,
    pub pending_leaves: i64,
    pub tasks_pending: i64,
    pub tasks_overdue: i64,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateTeamMember {
    pub full_name: Option<String>,
    pub designation: Option<String>,
    pub department: Option<String>,
    #[schema(example = 55000.0)]
    pub salary: Option<f64>,
    pub comment: Option<String>,
}

async fn count(pool: &MySqlPool, sql: &str, user_id: u64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(sql)
        .bind(user_id)
        .fetch_one(pool)
        .await
}

/// Team list with per-member stats
#[utoipa::path(
    get,
    path = "/api/team",
    responses(
        (status = 200, description = "Direct reports with today's stats", body = [TeamMemberStats]),
        (status = 403, description = "Supervisor only")
    ),
    security(("bearer_auth" = [])),
    tag = "Team"
)]
pub async fn team_list(auth: AuthUser, pool: web::Data<MySqlPool>) -> Result<HttpResponse, ApiError> {
    auth.require_supervisor()?;
    let pool = pool.get_ref();
    let today = today();

    let mut stats = Vec::new();
    for emp in reports_of(pool, auth.user_id).await? {
        let today_attendance = sqlx::query_as::<_, Attendance>(
            "SELECT id, user_id, date, in_time, out_time, overtime FROM attendance WHERE user_id = ? AND date = ?",
        )
        .bind(emp.id)
        .bind(today)
        .fetch_optional(pool)
        .await?;

        let pending_leaves = count(
            pool,
            "SELECT COUNT(*) FROM leaves WHERE user_id = ? AND status = 'pending'",
            emp.id,
        )
        .await?;
        let tasks_pending = count(
            pool,
            "SELECT COUNT(*) FROM tasks WHERE assigned_to = ? AND status = 'pending'",
            emp.id,
        )
        .await?;
        let tasks_overdue = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM tasks WHERE assigned_to = ? AND status <> 'completed' AND due_date < ?",
        )
        .bind(emp.id)
        .bind(today)
        .fetch_one(pool)
        .await?;

        stats.push(TeamMemberStats {
            employee: emp.into(),
            today_attendance,
            pending_leaves,
            tasks_pending,
            tasks_overdue,
        });
    }

    Ok(HttpResponse::Ok().json(stats))
}

/// Profile of a direct report
#[utoipa::path(
    get,
    path = "/api/team/{emp_id}",
    params(("emp_id" = u64, Path, description = "Reporting employee")),
    responses(
        (status = 200, description = "Employee", body = UserView),
        (status = 403, description = "Not a direct report"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Team"
)]
pub async fn team_member(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let emp = load_report(pool.get_ref(), &auth, path.into_inner()).await?;
    audit::record(
        pool.get_ref(),
        Some(&auth),
        &format!("Viewed info for employee {}", emp.id),
    )
    .await;
    Ok(HttpResponse::Ok().json(UserView::from(emp)))
}

/// Supervisor edits a direct report. Omitted fields stay as they are.
#[utoipa::path(
    put,
    path = "/api/team/{emp_id}",
    params(("emp_id" = u64, Path, description = "Reporting employee")),
    request_body = UpdateTeamMember,
    responses(
        (status = 200, description = "Employee updated"),
        (status = 403, description = "Not a direct report")
    ),
    security(("bearer_auth" = [])),
    tag = "Team"
)]
pub async fn update_team_member(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateTeamMember>,
) -> Result<HttpResponse, ApiError> {
    let emp = load_report(pool.get_ref(), &auth, path.into_inner()).await?;

    if payload.salary.is_some_and(|s| !s.is_finite() || s < 0.0) {
        return Err(ApiError::BadRequest("salary must be a non-negative number".into()));
    }

    sqlx::query(
        r#"
        UPDATE users SET
            full_name = COALESCE(?, full_name),
            designation = COALESCE(?, designation),
            department = COALESCE(?, department),
            salary = COALESCE(?, salary),
            comment = COALESCE(?, comment)
        WHERE id = ?
        "#,
    )
    .bind(&payload.full_name)
    .bind(&payload.designation)
    .bind(&payload.department)
    .bind(payload.salary)
    .bind(&payload.comment)
    .bind(emp.id)
    .execute(pool.get_ref())
    .await?;

    audit::record(
        pool.get_ref(),
        Some(&auth),
        &format!("Updated employee {}", emp.id),
    )
    .await;

    Ok(HttpResponse::Ok().json(json!({ "message": "Employee updated successfully!" })))
}
