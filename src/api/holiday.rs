use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::{
    api::is_duplicate, auth::auth::AuthUser, error::ApiError, model::holiday::Holiday,
    utils::audit,
};

#[derive(Deserialize, ToSchema)]
pub struct CreateHoliday {
    #[schema(example = "2026-12-25", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "Christmas")]
    pub name: Option<String>,
}

/// Holiday calendar
#[utoipa::path(
    get,
    path = "/api/holidays",
    responses((status = 200, description = "Holidays by date", body = [Holiday])),
    security(("bearer_auth" = [])),
    tag = "Holiday"
)]
pub async fn list_holidays(auth: AuthUser, pool: web::Data<MySqlPool>) -> Result<HttpResponse, ApiError> {
    let holidays = sqlx::query_as::<_, Holiday>("SELECT id, date, name FROM holidays ORDER BY date")
        .fetch_all(pool.get_ref())
        .await?;

    audit::record(pool.get_ref(), Some(&auth), "Viewed holidays").await;
    Ok(HttpResponse::Ok().json(holidays))
}

#[utoipa::path(
    post,
    path = "/api/admin/holidays",
    request_body = CreateHoliday,
    responses(
        (status = 201, description = "Holiday added"),
        (status = 409, description = "Date already a holiday")
    ),
    security(("bearer_auth" = [])),
    tag = "Holiday"
)]
pub async fn add_holiday(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateHoliday>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let result = sqlx::query("INSERT INTO holidays (date, name) VALUES (?, ?)")
        .bind(payload.date)
        .bind(&payload.name)
        .execute(pool.get_ref())
        .await;

    let done = match result {
        Ok(done) => done,
        Err(e) if is_duplicate(&e) => {
            return Err(ApiError::Conflict("A holiday already exists on that date".into()));
        }
        Err(e) => return Err(e.into()),
    };

    audit::record(
        pool.get_ref(),
        Some(&auth),
        &format!("Added holiday {}", payload.date),
    )
    .await;

    Ok(HttpResponse::Created().json(json!({
        "message": "Holiday added",
        "id": done.last_insert_id(),
    })))
}
