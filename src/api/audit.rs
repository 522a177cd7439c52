use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::IntoParams;

use crate::{auth::auth::AuthUser, error::ApiError, model::audit_log::AuditLog};

#[derive(Deserialize, IntoParams)]
pub struct LogQuery {
    /// YYYY-MM-DD, defaults to today (UTC, matching the stored timestamps)
    pub date: Option<NaiveDate>,
}

/// Audit trail for one day, newest first
#[utoipa::path(
    get,
    path = "/api/admin/logs",
    params(LogQuery),
    responses(
        (status = 200, description = "Audit entries", body = [AuditLog]),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_logs(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LogQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());

    let logs = sqlx::query_as::<_, AuditLog>(
        "SELECT id, user_id, action, timestamp FROM audit_logs WHERE DATE(timestamp) = ? ORDER BY timestamp DESC",
    )
    .bind(date)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(logs))
}
