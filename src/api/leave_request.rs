use actix_web::{HttpResponse, web};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, info};
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::{ensure_reports_to, load_report, load_user, today},
    auth::auth::AuthUser,
    error::ApiError,
    leave::{
        balance::{LeaveBalanceEngine, SICK_CARRY_EPOCH},
        history::{HistoryQuery, LEAVE_COLUMNS, LeaveHistoryReader, MySqlLeaveHistory},
        policy::{self, LeaveApplication},
    },
    model::{
        leave_request::{LeaveRequest, LeaveStatus, LeaveType},
        user::{USER_COLUMNS, User},
    },
    utils::audit,
};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "casual")]
    pub leave_type: LeaveType,
    #[schema(example = "2026-03-02", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-03-04", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Family function")]
    pub reason: Option<String>,
    /// Reference to an already uploaded medical certificate
    #[schema(example = "certs/2026/asha-fever.pdf")]
    pub doctor_cert: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LeaveDecision {
    #[schema(example = "approved")]
    pub status: LeaveStatus,
}

#[derive(Deserialize, IntoParams)]
pub struct YearQuery {
    /// Calendar year; defaults to the current one
    pub year: Option<i32>,
}

#[derive(Serialize, ToSchema)]
#[schema(example = json!({ "leave_type": "sick", "year": 2026, "balance": 19 }))]
pub struct TypeBalance {
    pub leave_type: String,
    pub year: i32,
    pub balance: i64,
}

/// Years a balance may be asked for: back to a century before the carry
/// epoch, forward to next year.
pub fn balance_year(requested: Option<i32>, today: NaiveDate) -> Result<i32, ApiError> {
    let year = requested.unwrap_or_else(|| today.year());
    let window = (SICK_CARRY_EPOCH - 100)..=(today.year() + 1);
    if window.contains(&year) {
        Ok(year)
    } else {
        Err(ApiError::BadRequest(format!(
            "year must be between {} and {}",
            window.start(),
            window.end()
        )))
    }
}

async fn approved_history(pool: &MySqlPool, user_id: u64) -> Result<Vec<LeaveRequest>, ApiError> {
    Ok(MySqlLeaveHistory::new(pool)
        .fetch(&HistoryQuery::approved_for(user_id))
        .await?)
}

/* =========================
Apply for leave (employee)
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body = CreateLeave,
    responses(
        (status = 201, description = "Leave applied", body = Object, example = json!({
            "message": "Leave applied successfully", "id": 41, "status": "pending"
        })),
        (status = 422, description = "Policy violation; the message explains why", body = Object, example = json!({
            "message": "Insufficient casual leave balance (2 days available)",
            "code": "insufficient_balance",
            "balance": 2
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn apply_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeave>,
) -> Result<HttpResponse, ApiError> {
    auth.require_employee()?;
    let payload = payload.into_inner();

    // Serialises concurrent applications by the same employee.
    let mut tx = pool.begin().await?;
    let lock_sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ? FOR UPDATE");
    let applicant = sqlx::query_as::<_, User>(&lock_sql)
        .bind(auth.user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let history = approved_history(pool.get_ref(), applicant.id).await?;
    let engine = LeaveBalanceEngine::new(&history, today());
    let balance = engine.balance(&applicant, payload.leave_type, None);

    let application = LeaveApplication {
        leave_type: payload.leave_type,
        start_date: payload.start_date,
        end_date: payload.end_date,
        has_certificate: payload
            .doctor_cert
            .as_deref()
            .is_some_and(|c| !c.trim().is_empty()),
    };

    if let Err(violation) = policy::check(&application, balance) {
        info!(user_id = auth.user_id, leave_type = %payload.leave_type, %violation, "Leave application refused");
        return Err(violation.into());
    }

    let result = sqlx::query(
        r#"
        INSERT INTO leaves
            (user_id, leave_type, start_date, end_date, status, reason, doctor_cert)
        VALUES (?, ?, ?, ?, 'pending', ?, ?)
        "#,
    )
    .bind(applicant.id)
    .bind(payload.leave_type.as_ref())
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(&payload.reason)
    .bind(&payload.doctor_cert)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    audit::record(
        pool.get_ref(),
        Some(&auth),
        &format!("Applied for {} leave", payload.leave_type),
    )
    .await;

    Ok(HttpResponse::Created().json(json!({
        "message": "Leave applied successfully",
        "id": result.last_insert_id(),
        "status": LeaveStatus::Pending,
    })))
}

/// Own leave requests, every status
#[utoipa::path(
    get,
    path = "/api/leave/mine",
    responses((status = 200, description = "Own leave requests", body = [LeaveRequest])),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn my_leaves(auth: AuthUser, pool: web::Data<MySqlPool>) -> Result<HttpResponse, ApiError> {
    let query = HistoryQuery {
        user_id: auth.user_id,
        ..Default::default()
    };
    let leaves = MySqlLeaveHistory::new(pool.get_ref()).fetch(&query).await?;
    Ok(HttpResponse::Ok().json(leaves))
}

/// Balances of the four tracked leave types
#[utoipa::path(
    get,
    path = "/api/leave/balances",
    params(YearQuery),
    responses(
        (status = 200, description = "Balance summary", body = BalanceSummary),
        (status = 400, description = "Year outside the supported window")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_balances(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<YearQuery>,
) -> Result<HttpResponse, ApiError> {
    let today = today();
    let year = balance_year(query.year, today)?;
    let user = load_user(pool.get_ref(), auth.user_id).await?;
    let history = approved_history(pool.get_ref(), user.id).await?;
    let summary = LeaveBalanceEngine::new(&history, today).summary(&user, Some(year));

    audit::record(pool.get_ref(), Some(&auth), "Viewed leave balances").await;
    Ok(HttpResponse::Ok().json(summary))
}

/// Balance of one leave type. Untracked names (including `lop`) report 0.
#[utoipa::path(
    get,
    path = "/api/leave/balance/{leave_type}",
    params(
        ("leave_type" = String, Path, description = "casual, sick, earned, maternity or lop"),
        YearQuery
    ),
    responses(
        (status = 200, description = "Balance", body = TypeBalance),
        (status = 400, description = "Year outside the supported window")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_balance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    query: web::Query<YearQuery>,
) -> Result<HttpResponse, ApiError> {
    let leave_type = path.into_inner();
    let today = today();
    let year = balance_year(query.year, today)?;
    let user = load_user(pool.get_ref(), auth.user_id).await?;
    let history = approved_history(pool.get_ref(), user.id).await?;
    let engine = LeaveBalanceEngine::new(&history, today);

    let balance = engine.balance_by_name(&user, &leave_type, Some(year));
    debug!(user_id = user.id, %leave_type, year, balance, "Computed leave balance");

    Ok(HttpResponse::Ok().json(TypeBalance {
        leave_type,
        year,
        balance,
    }))
}

/// Leave requests of a direct report
#[utoipa::path(
    get,
    path = "/api/team/{emp_id}/leaves",
    params(("emp_id" = u64, Path, description = "Reporting employee")),
    responses(
        (status = 200, description = "Leave requests", body = [LeaveRequest]),
        (status = 403, description = "Not a direct report"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn team_member_leaves(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let emp = load_report(pool.get_ref(), &auth, path.into_inner()).await?;
    let query = HistoryQuery {
        user_id: emp.id,
        ..Default::default()
    };
    let leaves = MySqlLeaveHistory::new(pool.get_ref()).fetch(&query).await?;
    Ok(HttpResponse::Ok().json(leaves))
}

/* =========================
Approve / reject (supervisor)
========================= */
/// A pending request is decided exactly once, by the applicant's supervisor.
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/decision",
    params(("leave_id" = u64, Path, description = "Leave request")),
    request_body = LeaveDecision,
    responses(
        (status = 200, description = "Decision recorded", body = Object, example = json!({
            "message": "Leave status updated", "status": "approved"
        })),
        (status = 400, description = "Decision must be approved or rejected"),
        (status = 403, description = "Applicant is not a direct report"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Already decided")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn decide_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<LeaveDecision>,
) -> Result<HttpResponse, ApiError> {
    auth.require_supervisor()?;
    let leave_id = path.into_inner();
    let decision = payload.status;

    if decision == LeaveStatus::Pending {
        return Err(ApiError::BadRequest(
            "Decision must be approved or rejected".into(),
        ));
    }

    let mut tx = pool.begin().await?;

    let sql = format!("SELECT {LEAVE_COLUMNS} FROM leaves WHERE id = ? FOR UPDATE");
    let leave = sqlx::query_as::<_, LeaveRequest>(&sql)
        .bind(leave_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::NotFound("Leave request not found".into()))?;

    let applicant = load_user(&mut *tx, leave.user_id).await?;
    ensure_reports_to(&applicant, &auth)?;

    if leave.status != LeaveStatus::Pending {
        return Err(ApiError::Conflict("Leave request already processed".into()));
    }

    sqlx::query("UPDATE leaves SET status = ? WHERE id = ? AND status = 'pending'")
        .bind(decision.as_ref())
        .bind(leave_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    audit::record(
        pool.get_ref(),
        Some(&auth),
        &format!(
            "Updated leave {leave_id} status to {decision} for employee {}",
            applicant.id
        ),
    )
    .await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave status updated",
        "status": decision,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_year_is_bounded() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        assert_eq!(balance_year(None, today).unwrap(), 2026);
        assert_eq!(balance_year(Some(2027), today).unwrap(), 2027);
        assert_eq!(balance_year(Some(1920), today).unwrap(), 1920);
        assert!(balance_year(Some(2028), today).is_err());
        assert!(balance_year(Some(1919), today).is_err());
        assert!(balance_year(Some(i32::MAX), today).is_err());
        assert!(balance_year(Some(i32::MIN), today).is_err());
    }
}
