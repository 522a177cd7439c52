use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::{
    api::load_user,
    auth::auth::AuthUser,
    error::ApiError,
    model::{document::Document, salary_slip::SalarySlip},
    utils::audit,
};

#[derive(Deserialize, ToSchema)]
pub struct RegisterDocument {
    #[schema(example = "Offer letter")]
    pub name: Option<String>,
    #[schema(example = "docs/12/offer-letter.pdf")]
    pub file_path: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RegisterSalarySlip {
    #[schema(example = 3)]
    pub month: i32,
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = "slips/12/2026-03.pdf")]
    pub file_path: String,
}

fn require_path(file_path: &str) -> Result<&str, ApiError> {
    let file_path = file_path.trim();
    if file_path.is_empty() {
        Err(ApiError::BadRequest("file_path must not be empty".into()))
    } else {
        Ok(file_path)
    }
}

fn validate_month(month: i32) -> Result<(), ApiError> {
    if (1..=12).contains(&month) {
        Ok(())
    } else {
        Err(ApiError::BadRequest("month must be between 1 and 12".into()))
    }
}

/// Own documents
#[utoipa::path(
    get,
    path = "/api/documents",
    responses((status = 200, description = "Documents", body = [Document])),
    security(("bearer_auth" = [])),
    tag = "Documents"
)]
pub async fn my_documents(auth: AuthUser, pool: web::Data<MySqlPool>) -> Result<HttpResponse, ApiError> {
    let docs = sqlx::query_as::<_, Document>(
        "SELECT id, user_id, file_path, name FROM documents WHERE user_id = ? ORDER BY id",
    )
    .bind(auth.user_id)
    .fetch_all(pool.get_ref())
    .await?;

    audit::record(pool.get_ref(), Some(&auth), "Viewed documents").await;
    Ok(HttpResponse::Ok().json(docs))
}

/// Document metadata; owner, supervisor or admin
#[utoipa::path(
    get,
    path = "/api/documents/{doc_id}",
    params(("doc_id" = u64, Path, description = "Document")),
    responses(
        (status = 200, description = "Document", body = Document),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Document not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Documents"
)]
pub async fn get_document(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let doc_id = path.into_inner();
    let doc = sqlx::query_as::<_, Document>(
        "SELECT id, user_id, file_path, name FROM documents WHERE id = ?",
    )
    .bind(doc_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| ApiError::NotFound("Document not found".into()))?;

    if !auth.can_view_records_of(doc.user_id) {
        return Err(ApiError::forbidden());
    }

    audit::record(
        pool.get_ref(),
        Some(&auth),
        &format!("Downloaded document {doc_id}"),
    )
    .await;
    Ok(HttpResponse::Ok().json(doc))
}

/// Register an already stored file against a user
#[utoipa::path(
    post,
    path = "/api/admin/users/{user_id}/documents",
    params(("user_id" = u64, Path, description = "Owner")),
    request_body = RegisterDocument,
    responses(
        (status = 201, description = "Document registered"),
        (status = 400, description = "file_path missing"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Documents"
)]
pub async fn register_document(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<RegisterDocument>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;
    let owner = load_user(pool.get_ref(), path.into_inner()).await?;
    let file_path = require_path(&payload.file_path)?;

    let result = sqlx::query("INSERT INTO documents (user_id, file_path, name) VALUES (?, ?, ?)")
        .bind(owner.id)
        .bind(file_path)
        .bind(&payload.name)
        .execute(pool.get_ref())
        .await?;

    audit::record(
        pool.get_ref(),
        Some(&auth),
        &format!("Uploaded document for {}", owner.username),
    )
    .await;

    Ok(HttpResponse::Created().json(json!({
        "message": "Document registered",
        "id": result.last_insert_id(),
    })))
}

/// Own salary slips, newest first
#[utoipa::path(
    get,
    path = "/api/salary-slips",
    responses((status = 200, description = "Salary slips", body = [SalarySlip])),
    security(("bearer_auth" = [])),
    tag = "Documents"
)]
pub async fn my_salary_slips(auth: AuthUser, pool: web::Data<MySqlPool>) -> Result<HttpResponse, ApiError> {
    let slips = sqlx::query_as::<_, SalarySlip>(
        "SELECT id, user_id, month, year, file_path FROM salary_slips WHERE user_id = ? ORDER BY year DESC, month DESC",
    )
    .bind(auth.user_id)
    .fetch_all(pool.get_ref())
    .await?;

    audit::record(pool.get_ref(), Some(&auth), "Viewed salary slips").await;
    Ok(HttpResponse::Ok().json(slips))
}

#[utoipa::path(
    get,
    path = "/api/salary-slips/{slip_id}",
    params(("slip_id" = u64, Path, description = "Salary slip")),
    responses(
        (status = 200, description = "Salary slip", body = SalarySlip),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Salary slip not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Documents"
)]
pub async fn get_salary_slip(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let slip_id = path.into_inner();
    let slip = sqlx::query_as::<_, SalarySlip>(
        "SELECT id, user_id, month, year, file_path FROM salary_slips WHERE id = ?",
    )
    .bind(slip_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| ApiError::NotFound("Salary slip not found".into()))?;

    if !auth.can_view_records_of(slip.user_id) {
        return Err(ApiError::forbidden());
    }

    audit::record(
        pool.get_ref(),
        Some(&auth),
        &format!("Downloaded salary slip {slip_id}"),
    )
    .await;
    Ok(HttpResponse::Ok().json(slip))
}

#[utoipa::path(
    post,
    path = "/api/admin/users/{user_id}/salary-slips",
    params(("user_id" = u64, Path, description = "Owner")),
    request_body = RegisterSalarySlip,
    responses(
        (status = 201, description = "Salary slip registered"),
        (status = 400, description = "Invalid month or file_path"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Documents"
)]
pub async fn register_salary_slip(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<RegisterSalarySlip>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;
    let owner = load_user(pool.get_ref(), path.into_inner()).await?;
    validate_month(payload.month)?;
    let file_path = require_path(&payload.file_path)?;

    let result = sqlx::query(
        "INSERT INTO salary_slips (user_id, month, year, file_path) VALUES (?, ?, ?, ?)",
    )
    .bind(owner.id)
    .bind(payload.month)
    .bind(payload.year)
    .bind(file_path)
    .execute(pool.get_ref())
    .await?;

    audit::record(
        pool.get_ref(),
        Some(&auth),
        &format!(
            "Uploaded salary slip {}/{} for {}",
            payload.month, payload.year, owner.username
        ),
    )
    .await;

    Ok(HttpResponse::Created().json(json!({
        "message": "Salary slip registered",
        "id": result.last_insert_id(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_and_path_checks() {
        assert!(validate_month(1).is_ok());
        assert!(validate_month(12).is_ok());
        assert!(validate_month(0).is_err());
        assert!(validate_month(13).is_err());

        assert_eq!(require_path("  a/b.pdf ").unwrap(), "a/b.pdf");
        assert!(require_path("   ").is_err());
    }
}
