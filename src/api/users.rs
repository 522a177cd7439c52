use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::{debug, info};
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::{is_duplicate, load_user},
    auth::{auth::AuthUser, password::hash_password},
    error::ApiError,
    model::{
        role::Role,
        team::Team,
        user::{USER_COLUMNS, User, UserView},
    },
    utils::{
        audit,
        db_utils::{build_update_sql, execute_update},
        username_index::UsernameIndex,
    },
};

/// Columns an admin may change through the edit endpoint.
pub const EDITABLE_COLUMNS: &[&str] = &[
    "full_name",
    "designation",
    "probation_completed",
    "emp_number",
    "doj",
    "perm_address",
    "curr_address",
    "emerg_contact_name",
    "emerg_contact_num",
    "birth_date",
    "pan",
    "aadhar",
    "role",
    "manager_id",
    "department",
    "team",
    "profile_picture",
    "last_working_day",
    "salary",
    "comment",
];

#[derive(Deserialize, ToSchema)]
pub struct CreateUser {
    #[schema(example = "asha")]
    pub username: String,
    #[schema(example = "s3cret")]
    pub password: String,
    #[schema(example = "Asha Rao")]
    pub full_name: Option<String>,
    #[schema(example = "employee")]
    pub role: Role,
    pub designation: Option<String>,
    pub emp_number: Option<String>,
    #[schema(example = "2024-01-01", format = "date", value_type = Option<String>)]
    pub doj: Option<NaiveDate>,
    pub department: Option<String>,
    pub team: Option<Team>,
    pub manager_id: Option<u64>,
    pub salary: Option<f64>,
}

#[derive(Deserialize, IntoParams)]
pub struct UserQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// Filter by role
    pub role: Option<Role>,
    /// Matches username or full name
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct UserListResponse {
    pub data: Vec<UserView>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
}

/// `manager_id` must name an existing supervisor other than the user itself.
async fn validate_manager(pool: &MySqlPool, manager_id: u64, user_id: Option<u64>) -> Result<(), ApiError> {
    if Some(manager_id) == user_id {
        return Err(ApiError::BadRequest("A user cannot manage themselves".into()));
    }
    let manager = load_user(pool, manager_id)
        .await
        .map_err(|_| ApiError::BadRequest(format!("Manager {manager_id} does not exist")))?;
    if manager.role != Role::Supervisor {
        return Err(ApiError::BadRequest(format!("User {manager_id} is not a supervisor")));
    }
    Ok(())
}

/// Rejects enum-backed columns carrying values outside their enumeration.
fn validate_edit(payload: &Value) -> Result<(), ApiError> {
    let Some(obj) = payload.as_object() else {
        return Ok(());
    };
    if let Some(role) = obj.get("role") {
        if role.as_str().and_then(|r| r.parse::<Role>().ok()).is_none() {
            return Err(ApiError::BadRequest("role must be employee, supervisor or admin".into()));
        }
    }
    if let Some(team) = obj.get("team") {
        if !team.is_null() && team.as_str().and_then(|t| t.parse::<Team>().ok()).is_none() {
            return Err(ApiError::BadRequest("team must be corporate, production or null".into()));
        }
    }
    if let Some(manager) = obj.get("manager_id") {
        if !manager.is_null() && !manager.is_u64() {
            return Err(ApiError::BadRequest("manager_id must be a user id or null".into()));
        }
    }
    Ok(())
}

/// List users
#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(UserQuery),
    responses((status = 200, description = "Paginated user list", body = UserListResponse)),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_users(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let mut conditions = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(role) = query.role {
        conditions.push("role = ?");
        bindings.push(role.to_string());
    }

    if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
        conditions.push("(username LIKE ? OR full_name LIKE ?)");
        let like = format!("%{}%", search.trim());
        bindings.push(like.clone());
        bindings.push(like);
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM users {where_clause}");
    debug!(sql = %count_sql, bindings = ?bindings, "Counting users");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = count_query.bind(b);
    }
    let total = count_query.fetch_one(pool.get_ref()).await?;

    let data_sql = format!(
        "SELECT {USER_COLUMNS} FROM users {where_clause} ORDER BY id DESC LIMIT ? OFFSET ?"
    );
    debug!(sql = %data_sql, page, per_page, offset, "Fetching users");

    let mut data_query = sqlx::query_as::<_, User>(&data_sql);
    for b in &bindings {
        data_query = data_query.bind(b);
    }
    let users = data_query
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(UserListResponse {
        data: users.into_iter().map(UserView::from).collect(),
        page,
        per_page,
        total,
    }))
}

/// Create user
#[utoipa::path(
    post,
    path = "/api/admin/users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = Object, example = json!({
            "message": "User created", "id": 12
        })),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Username already taken")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    usernames: web::Data<UsernameIndex>,
    payload: web::Json<CreateUser>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let username = payload.username.trim();
    if username.is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Username and password must not be empty".into(),
        ));
    }

    if !usernames.is_available(username, pool.get_ref()).await {
        return Err(ApiError::Conflict("Username already taken".into()));
    }

    if let Some(manager_id) = payload.manager_id {
        validate_manager(pool.get_ref(), manager_id, None).await?;
    }

    let hashed = hash_password(&payload.password).map_err(|e| {
        tracing::error!(error = %e, "Failed to hash password");
        ApiError::Internal
    })?;

    let result = sqlx::query(
        r#"
        INSERT INTO users
            (username, password_hash, full_name, role, designation, emp_number, doj,
             department, team, manager_id, salary, probation_completed)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, FALSE)
        "#,
    )
    .bind(username)
    .bind(hashed)
    .bind(&payload.full_name)
    .bind(payload.role.as_ref())
    .bind(&payload.designation)
    .bind(&payload.emp_number)
    .bind(payload.doj)
    .bind(&payload.department)
    .bind(payload.team.map(|t| t.as_ref().to_string()))
    .bind(payload.manager_id)
    .bind(payload.salary)
    .execute(pool.get_ref())
    .await;

    let done = match result {
        Ok(done) => done,
        Err(e) if is_duplicate(&e) => {
            return Err(ApiError::Conflict("Username already exists".into()));
        }
        Err(e) => return Err(e.into()),
    };

    usernames.mark_taken(username).await;
    audit::record(pool.get_ref(), Some(&auth), &format!("Created user {username}")).await;

    Ok(HttpResponse::Created().json(json!({
        "message": "User created",
        "id": done.last_insert_id(),
    })))
}

/// Get user by ID
#[utoipa::path(
    get,
    path = "/api/admin/users/{user_id}",
    params(("user_id" = u64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserView),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;
    let user = load_user(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(UserView::from(user)))
}

/// Edit user. Body is a JSON object of editable columns.
#[utoipa::path(
    put,
    path = "/api/admin/users/{user_id}",
    params(("user_id" = u64, Path, description = "User ID")),
    request_body(content = Object, example = json!({
        "full_name": "Asha Rao", "designation": "Senior Analyst", "manager_id": 3
    })),
    responses(
        (status = 200, description = "User updated"),
        (status = 400, description = "Unknown column or invalid value"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;
    let user = load_user(pool.get_ref(), path.into_inner()).await?;

    validate_edit(&body)?;
    let update = build_update_sql("users", &body, EDITABLE_COLUMNS, "id", user.id)?;

    if let Some(manager_id) = body.get("manager_id").and_then(Value::as_u64) {
        validate_manager(pool.get_ref(), manager_id, Some(user.id)).await?;
    }

    execute_update(pool.get_ref(), update).await?;
    audit::record(
        pool.get_ref(),
        Some(&auth),
        &format!("Edited user {}", user.username),
    )
    .await;

    Ok(HttpResponse::Ok().json(json!({ "message": "User updated" })))
}

/// Delete user, their records, and detach their reports
#[utoipa::path(
    delete,
    path = "/api/admin/users/{user_id}",
    params(("user_id" = u64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 400, description = "Self-deletion or last admin"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    usernames: web::Data<UsernameIndex>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;
    let user_id = path.into_inner();

    if user_id == auth.user_id {
        return Err(ApiError::BadRequest("You cannot delete your own account!".into()));
    }

    let mut tx = pool.begin().await?;
    let user = load_user(&mut *tx, user_id).await?;

    if user.role == Role::Admin {
        let admins = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role = 'admin' FOR UPDATE")
            .fetch_one(&mut *tx)
            .await?;
        if admins <= 1 {
            return Err(ApiError::BadRequest("Cannot delete the last admin account!".into()));
        }
    }

    for sql in [
        "DELETE FROM attendance WHERE user_id = ?",
        "DELETE FROM leaves WHERE user_id = ?",
        "DELETE FROM documents WHERE user_id = ?",
        "DELETE FROM salary_slips WHERE user_id = ?",
        "DELETE FROM audit_logs WHERE user_id = ?",
        "DELETE FROM refresh_tokens WHERE user_id = ?",
        "UPDATE users SET manager_id = NULL WHERE manager_id = ?",
    ] {
        sqlx::query(sql).bind(user_id).execute(&mut *tx).await?;
    }

    sqlx::query("DELETE FROM tasks WHERE assigned_to = ? OR assigned_by = ?")
        .bind(user_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    usernames.forget(&user.username).await;
    info!(user_id, username = %user.username, "User deleted");
    audit::record(
        pool.get_ref(),
        Some(&auth),
        &format!("Deleted user {} (ID: {user_id})", user.username),
    )
    .await;

    let name = user.full_name.unwrap_or(user.username);
    Ok(HttpResponse::Ok().json(json!({
        "message": format!("User {name} deleted successfully!")
    })))
}

/// Own profile
#[utoipa::path(
    get,
    path = "/api/me",
    responses((status = 200, description = "Own profile", body = UserView)),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn me(auth: AuthUser, pool: web::Data<MySqlPool>) -> Result<HttpResponse, ApiError> {
    let user = load_user(pool.get_ref(), auth.user_id).await?;
    audit::record(pool.get_ref(), Some(&auth), "Viewed profile").await;
    Ok(HttpResponse::Ok().json(UserView::from(user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_validation_checks_enum_columns() {
        assert!(validate_edit(&json!({ "role": "supervisor", "team": null })).is_ok());
        assert!(validate_edit(&json!({ "team": "production", "manager_id": 4 })).is_ok());
        assert!(validate_edit(&json!({ "role": "hr" })).is_err());
        assert!(validate_edit(&json!({ "role": null })).is_err());
        assert!(validate_edit(&json!({ "team": "marketing" })).is_err());
        assert!(validate_edit(&json!({ "manager_id": "three" })).is_err());
    }

    #[test]
    fn password_hash_is_not_editable() {
        assert!(!EDITABLE_COLUMNS.contains(&"password_hash"));
        assert!(!EDITABLE_COLUMNS.contains(&"username"));
        assert!(!EDITABLE_COLUMNS.contains(&"id"));
    }
}
