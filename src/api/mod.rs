pub mod attendance;
pub mod audit;
pub mod dashboard;
pub mod documents;
pub mod holiday;
pub mod leave_request;
pub mod task;
pub mod team;
pub mod users;

use chrono::{Local, NaiveDate, NaiveDateTime};
use sqlx::{MySql, Executor};

use crate::{
    auth::auth::AuthUser,
    error::ApiError,
    model::user::{USER_COLUMNS, User},
};

/// Calendar date used for "today" in attendance, dashboards and leave accrual.
pub fn today() -> NaiveDate {
    now().date()
}

/// Server-local wall clock; attendance stamps use it so they agree with `today`.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub async fn load_user<'c, E>(executor: E, user_id: u64) -> Result<User, ApiError>
where
    E: Executor<'c, Database = MySql>,
{
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
    sqlx::query_as::<_, User>(&sql)
        .bind(user_id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))
}

/// Loads `emp_id` on behalf of a supervisor, refusing anyone who does not
/// report to them.
pub async fn load_report<'c, E>(executor: E, auth: &AuthUser, emp_id: u64) -> Result<User, ApiError>
where
    E: Executor<'c, Database = MySql>,
{
    auth.require_supervisor()?;
    let user = load_user(executor, emp_id).await?;
    ensure_reports_to(&user, auth)?;
    Ok(user)
}

pub fn ensure_reports_to(user: &User, supervisor: &AuthUser) -> Result<(), ApiError> {
    if user.manager_id == Some(supervisor.user_id) {
        Ok(())
    } else {
        Err(ApiError::forbidden())
    }
}

/// MySQL duplicate-key / constraint violation.
pub fn is_duplicate(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23000"))
}
