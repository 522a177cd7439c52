use actix_web::{HttpResponse, web};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::{
    api::today,
    auth::auth::AuthUser,
    error::ApiError,
    leave::history::LEAVE_COLUMNS,
    model::leave_request::LeaveRequest,
    utils::audit,
};

#[derive(Serialize, ToSchema)]
pub struct EmployeeDashboard {
    #[schema(example = "present")]
    pub today_attendance: String,
    pub pending_leaves: i64,
    pub salary_slips: i64,
}

#[derive(Serialize, ToSchema)]
pub struct SupervisorDashboard {
    pub team_size: i64,
    pub pending_leave_count: i64,
    pub pending_leaves: Vec<LeaveRequest>,
    pub attendance_today: i64,
    pub absent_today: i64,
    pub overtime_today: f64,
    pub average_overtime: f64,
    pub approved_leaves: i64,
}

#[derive(Serialize, ToSchema)]
pub struct AdminDashboard {
    pub employees: i64,
    pub supervisors: i64,
    pub on_leave_today: i64,
    pub departments: Vec<String>,
    pub pending_leaves: i64,
    pub approved_leaves: i64,
    pub present_today: i64,
    pub holidays: i64,
    pub logs: i64,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceDashboard {
    pub month: u32,
    pub year: i32,
    pub attendance_count: i64,
    pub overtime_total: f64,
}

/// Overtime spread over the whole team; zero for an empty team.
fn average_overtime(total: f64, team_size: i64) -> f64 {
    if team_size > 0 && total > 0.0 {
        total / team_size as f64
    } else {
        0.0
    }
}

async fn scalar_for(pool: &MySqlPool, sql: &str, id: u64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(sql).bind(id).fetch_one(pool).await
}

async fn scalar(pool: &MySqlPool, sql: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(sql).fetch_one(pool).await
}

async fn count_on(pool: &MySqlPool, sql: &str, id: u64, day: NaiveDate) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(sql)
        .bind(id)
        .bind(day)
        .fetch_one(pool)
        .await
}

#[utoipa::path(
    get,
    path = "/api/dashboard/employee",
    responses(
        (status = 200, description = "Employee dashboard", body = EmployeeDashboard),
        (status = 403, description = "Employee only")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn employee_dashboard(auth: AuthUser, pool: web::Data<MySqlPool>) -> Result<HttpResponse, ApiError> {
    auth.require_employee()?;
    let pool = pool.get_ref();

    let present = count_on(
        pool,
        "SELECT COUNT(*) FROM attendance WHERE user_id = ? AND date = ?",
        auth.user_id,
        today(),
    )
    .await?;
    let pending_leaves = scalar_for(
        pool,
        "SELECT COUNT(*) FROM leaves WHERE user_id = ? AND status = 'pending'",
        auth.user_id,
    )
    .await?;
    let salary_slips = scalar_for(
        pool,
        "SELECT COUNT(*) FROM salary_slips WHERE user_id = ?",
        auth.user_id,
    )
    .await?;

    audit::record(pool, Some(&auth), "Viewed employee dashboard").await;
    Ok(HttpResponse::Ok().json(EmployeeDashboard {
        today_attendance: if present > 0 { "present" } else { "absent" }.to_string(),
        pending_leaves,
        salary_slips,
    }))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/supervisor",
    responses(
        (status = 200, description = "Team overview", body = SupervisorDashboard),
        (status = 403, description = "Supervisor only")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn supervisor_dashboard(auth: AuthUser, pool: web::Data<MySqlPool>) -> Result<HttpResponse, ApiError> {
    auth.require_supervisor()?;
    let pool = pool.get_ref();
    let today = today();
    let me = auth.user_id;

    let team_size = scalar_for(pool, "SELECT COUNT(*) FROM users WHERE manager_id = ?", me).await?;

    let pending_sql = format!(
        "SELECT {LEAVE_COLUMNS} FROM leaves \
         WHERE status = 'pending' AND user_id IN (SELECT id FROM users WHERE manager_id = ?) \
         ORDER BY start_date"
    );
    let pending_leaves = sqlx::query_as::<_, LeaveRequest>(&pending_sql)
        .bind(me)
        .fetch_all(pool)
        .await?;

    let attendance_today = count_on(
        pool,
        "SELECT COUNT(*) FROM attendance \
         WHERE user_id IN (SELECT id FROM users WHERE manager_id = ?) AND date = ?",
        me,
        today,
    )
    .await?;

    let overtime_today = sqlx::query_scalar::<_, f64>(
        "SELECT CAST(COALESCE(SUM(overtime), 0) AS DOUBLE) FROM attendance \
         WHERE user_id IN (SELECT id FROM users WHERE manager_id = ?) AND date = ?",
    )
    .bind(me)
    .bind(today)
    .fetch_one(pool)
    .await?;

    let approved_leaves = scalar_for(
        pool,
        "SELECT COUNT(*) FROM leaves \
         WHERE status = 'approved' AND user_id IN (SELECT id FROM users WHERE manager_id = ?)",
        me,
    )
    .await?;

    audit::record(pool, Some(&auth), "Viewed supervisor dashboard").await;
    Ok(HttpResponse::Ok().json(SupervisorDashboard {
        team_size,
        pending_leave_count: pending_leaves.len() as i64,
        pending_leaves,
        attendance_today,
        absent_today: (team_size - attendance_today).max(0),
        overtime_today,
        average_overtime: average_overtime(overtime_today, team_size),
        approved_leaves,
    }))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/admin",
    responses(
        (status = 200, description = "Organisation overview", body = AdminDashboard),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn admin_dashboard(auth: AuthUser, pool: web::Data<MySqlPool>) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;
    let pool = pool.get_ref();
    let today = today();

    let on_leave_today = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM leaves WHERE status = 'approved' AND start_date <= ? AND end_date >= ?",
    )
    .bind(today)
    .bind(today)
    .fetch_one(pool)
    .await?;

    let present_today = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM attendance WHERE date = ?")
        .bind(today)
        .fetch_one(pool)
        .await?;

    let departments = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT department FROM users \
         WHERE department IS NOT NULL AND department <> '' ORDER BY department",
    )
    .fetch_all(pool)
    .await?;

    let dashboard = AdminDashboard {
        employees: scalar(pool, "SELECT COUNT(*) FROM users WHERE role = 'employee'").await?,
        supervisors: scalar(pool, "SELECT COUNT(*) FROM users WHERE role = 'supervisor'").await?,
        on_leave_today,
        departments,
        pending_leaves: scalar(pool, "SELECT COUNT(*) FROM leaves WHERE status = 'pending'").await?,
        approved_leaves: scalar(pool, "SELECT COUNT(*) FROM leaves WHERE status = 'approved'").await?,
        present_today,
        holidays: scalar(pool, "SELECT COUNT(*) FROM holidays").await?,
        logs: scalar(pool, "SELECT COUNT(*) FROM audit_logs").await?,
    };

    audit::record(pool, Some(&auth), "Viewed admin dashboard").await;
    Ok(HttpResponse::Ok().json(dashboard))
}

/// Attendance volume and overtime for the current month
#[utoipa::path(
    get,
    path = "/api/dashboard/attendance",
    responses(
        (status = 200, description = "Month totals", body = AttendanceDashboard),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn attendance_dashboard(auth: AuthUser, pool: web::Data<MySqlPool>) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;
    let pool = pool.get_ref();
    let now = today();
    let (month, year) = (now.month(), now.year());

    let (attendance_count, overtime_total) = sqlx::query_as::<_, (i64, f64)>(
        "SELECT COUNT(id), CAST(COALESCE(SUM(overtime), 0) AS DOUBLE) FROM attendance \
         WHERE MONTH(date) = ? AND YEAR(date) = ?",
    )
    .bind(month)
    .bind(year)
    .fetch_one(pool)
    .await?;

    audit::record(pool, Some(&auth), "Viewed attendance dashboard").await;
    Ok(HttpResponse::Ok().json(AttendanceDashboard {
        month,
        year,
        attendance_count,
        overtime_total,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_overtime_handles_empty_team() {
        assert_eq!(average_overtime(6.0, 3), 2.0);
        assert_eq!(average_overtime(0.0, 3), 0.0);
        assert_eq!(average_overtime(4.0, 0), 0.0);
    }
}
