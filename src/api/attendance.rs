use actix_web::{HttpResponse, web};
use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::{is_duplicate, load_report, now, today},
    auth::auth::AuthUser,
    error::ApiError,
    model::attendance::Attendance,
    utils::audit,
};

const ATTENDANCE_COLUMNS: &str = "id, user_id, date, in_time, out_time, overtime";

// Date and time are bound from the app clock, not the database's.
const CHECK_IN_SQL: &str =
    "INSERT INTO attendance (user_id, date, in_time, overtime) VALUES (?, ?, ?, 0)";
const CHECK_OUT_SQL: &str =
    "UPDATE attendance SET out_time = ? WHERE user_id = ? AND date = ? AND out_time IS NULL";

#[derive(Deserialize, IntoParams)]
pub struct MonthQuery {
    /// 1-12, defaults to the current month
    pub month: Option<u32>,
    /// Defaults to the current year
    pub year: Option<i32>,
}

#[derive(Deserialize, ToSchema)]
pub struct RecordAttendance {
    #[schema(example = "2026-03-02", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "09:30")]
    pub in_time: String,
    #[schema(example = "18:15")]
    pub out_time: String,
    /// Overtime hours
    #[schema(example = 1.5)]
    pub overtime: f64,
}

#[derive(Deserialize, ToSchema)]
pub struct CorrectAttendance {
    #[schema(example = "09:10")]
    pub in_time: String,
    #[schema(example = "19:00")]
    pub out_time: String,
    #[schema(example = 0.75)]
    pub overtime: f64,
}

/// Accepts `HH:MM` or `HH:MM:SS`.
pub fn parse_clock(raw: &str) -> Result<NaiveTime, ApiError> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| ApiError::BadRequest(format!("Invalid time '{raw}', expected HH:MM")))
}

fn validate_overtime(overtime: f64) -> Result<(), ApiError> {
    if overtime.is_finite() && overtime >= 0.0 {
        Ok(())
    } else {
        Err(ApiError::BadRequest("overtime must be a non-negative number".into()))
    }
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    responses(
        (status = 200, description = "Checked in successfully", body = Object, example = json!({
            "message": "Checked in successfully"
        })),
        (status = 400, description = "Already checked in today", body = Object, example = json!({
            "message": "Already checked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_in(auth: AuthUser, pool: web::Data<MySqlPool>) -> Result<HttpResponse, ApiError> {
    auth.require_employee()?;

    let now = now();
    let result = sqlx::query(CHECK_IN_SQL)
        .bind(auth.user_id)
        .bind(now.date())
        .bind(now.time())
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(_) => {
            audit::record(pool.get_ref(), Some(&auth), "Checked in").await;
            Ok(HttpResponse::Ok().json(json!({ "message": "Checked in successfully" })))
        }
        // unique (user_id, date)
        Err(e) if is_duplicate(&e) => Err(ApiError::BadRequest("Already checked in today".into())),
        Err(e) => Err(e.into()),
    }
}

/// Check-out endpoint
#[utoipa::path(
    put,
    path = "/api/attendance/check-out",
    responses(
        (status = 200, description = "Checked out successfully", body = Object, example = json!({
            "message": "Checked out successfully"
        })),
        (status = 400, description = "No active check-in found for today"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_out(auth: AuthUser, pool: web::Data<MySqlPool>) -> Result<HttpResponse, ApiError> {
    auth.require_employee()?;

    let now = now();
    let result = sqlx::query(CHECK_OUT_SQL)
        .bind(now.time())
        .bind(auth.user_id)
        .bind(now.date())
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::BadRequest("No active check-in found for today".into()));
    }

    audit::record(pool.get_ref(), Some(&auth), "Checked out").await;
    Ok(HttpResponse::Ok().json(json!({ "message": "Checked out successfully" })))
}

/// Own attendance for one month
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(MonthQuery),
    responses(
        (status = 200, description = "Attendance rows", body = [Attendance]),
        (status = 400, description = "Invalid month")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn my_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<MonthQuery>,
) -> Result<HttpResponse, ApiError> {
    let current = today();
    let month = query.month.unwrap_or(current.month());
    let year = query.year.unwrap_or(current.year());

    if !(1..=12).contains(&month) {
        return Err(ApiError::BadRequest("month must be between 1 and 12".into()));
    }

    let sql = format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE user_id = ? AND MONTH(date) = ? AND YEAR(date) = ? ORDER BY date"
    );
    let rows = sqlx::query_as::<_, Attendance>(&sql)
        .bind(auth.user_id)
        .bind(month)
        .bind(year)
        .fetch_all(pool.get_ref())
        .await?;

    audit::record(pool.get_ref(), Some(&auth), "Viewed attendance").await;
    Ok(HttpResponse::Ok().json(json!({
        "month": month,
        "year": year,
        "data": rows,
    })))
}

/// Attendance history of a direct report
#[utoipa::path(
    get,
    path = "/api/team/{emp_id}/attendance",
    params(("emp_id" = u64, Path, description = "Reporting employee")),
    responses(
        (status = 200, description = "Attendance rows", body = [Attendance]),
        (status = 403, description = "Not a direct report")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn team_member_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let emp = load_report(pool.get_ref(), &auth, path.into_inner()).await?;

    let sql = format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE user_id = ? ORDER BY date");
    let rows = sqlx::query_as::<_, Attendance>(&sql)
        .bind(emp.id)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(rows))
}

/// Supervisor records a day for a direct report
#[utoipa::path(
    post,
    path = "/api/team/{emp_id}/attendance",
    params(("emp_id" = u64, Path, description = "Reporting employee")),
    request_body = RecordAttendance,
    responses(
        (status = 201, description = "Attendance added"),
        (status = 400, description = "Invalid time, overtime, or day already recorded"),
        (status = 403, description = "Not a direct report")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn add_team_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<RecordAttendance>,
) -> Result<HttpResponse, ApiError> {
    let emp = load_report(pool.get_ref(), &auth, path.into_inner()).await?;
    let in_time = parse_clock(&payload.in_time)?;
    let out_time = parse_clock(&payload.out_time)?;
    validate_overtime(payload.overtime)?;

    let result = sqlx::query(
        "INSERT INTO attendance (user_id, date, in_time, out_time, overtime) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(emp.id)
    .bind(payload.date)
    .bind(in_time)
    .bind(out_time)
    .bind(payload.overtime)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(done) => {
            audit::record(
                pool.get_ref(),
                Some(&auth),
                &format!("Added attendance for employee {}", emp.id),
            )
            .await;
            Ok(HttpResponse::Created().json(json!({
                "message": "Attendance added",
                "id": done.last_insert_id(),
            })))
        }
        Err(e) if is_duplicate(&e) => Err(ApiError::BadRequest(
            "Attendance for that day is already recorded".into(),
        )),
        Err(e) => Err(e.into()),
    }
}

/// Supervisor corrects a recorded day
#[utoipa::path(
    put,
    path = "/api/team/{emp_id}/attendance/{att_id}",
    params(
        ("emp_id" = u64, Path, description = "Reporting employee"),
        ("att_id" = u64, Path, description = "Attendance row")
    ),
    request_body = CorrectAttendance,
    responses(
        (status = 200, description = "Attendance updated"),
        (status = 403, description = "Not a direct report"),
        (status = 404, description = "Attendance row not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn update_team_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(u64, u64)>,
    payload: web::Json<CorrectAttendance>,
) -> Result<HttpResponse, ApiError> {
    let (emp_id, att_id) = path.into_inner();
    let emp = load_report(pool.get_ref(), &auth, emp_id).await?;
    let in_time = parse_clock(&payload.in_time)?;
    let out_time = parse_clock(&payload.out_time)?;
    validate_overtime(payload.overtime)?;

    let exists = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM attendance WHERE id = ? AND user_id = ?",
    )
    .bind(att_id)
    .bind(emp.id)
    .fetch_one(pool.get_ref())
    .await?;

    if exists == 0 {
        return Err(ApiError::NotFound("Attendance not found".into()));
    }

    sqlx::query("UPDATE attendance SET in_time = ?, out_time = ?, overtime = ? WHERE id = ?")
        .bind(in_time)
        .bind(out_time)
        .bind(payload.overtime)
        .bind(att_id)
        .execute(pool.get_ref())
        .await?;

    audit::record(
        pool.get_ref(),
        Some(&auth),
        &format!("Updated attendance {att_id} for employee {}", emp.id),
    )
    .await;

    Ok(HttpResponse::Ok().json(json!({ "message": "Attendance updated" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_clock_times() {
        assert_eq!(
            parse_clock("09:30").unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap()
        );
        assert_eq!(
            parse_clock(" 18:05:09 ").unwrap(),
            NaiveTime::from_hms_opt(18, 5, 9).unwrap()
        );
        assert!(parse_clock("25:00").is_err());
        assert!(parse_clock("half past nine").is_err());
    }

    #[test]
    fn overtime_must_be_non_negative() {
        assert!(validate_overtime(0.0).is_ok());
        assert!(validate_overtime(2.5).is_ok());
        assert!(validate_overtime(-1.0).is_err());
        assert!(validate_overtime(f64::NAN).is_err());
    }

    #[test]
    fn check_in_and_out_take_the_app_clock() {
        for sql in [CHECK_IN_SQL, CHECK_OUT_SQL] {
            assert!(!sql.contains("CURDATE"));
            assert!(!sql.contains("CURTIME"));
            assert!(!sql.contains("NOW()"));
        }
        assert_eq!(CHECK_IN_SQL.matches('?').count(), 3);
        assert_eq!(CHECK_OUT_SQL.matches('?').count(), 3);
    }
}
