use actix_web::{HttpRequest, HttpResponse, Responder, web};
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};

use crate::{
    auth::{
        auth::AuthUser,
        jwt::{issue_token, verify_token},
        password::verify_password,
    },
    config::Config,
    error::ApiError,
    model::user::{USER_COLUMNS, User},
    models::{Claims, LoginReqDto, TokenPair, TokenType},
    utils::audit,
};

fn bearer(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Issues an access/refresh pair and records the refresh `jti`.
async fn issue_pair(
    pool: &MySqlPool,
    config: &Config,
    claims_source: &AuthUser,
) -> Result<TokenPair, ApiError> {
    let token_error = |e: jsonwebtoken::errors::Error| {
        error!(error = %e, "Failed to sign token");
        ApiError::Internal
    };

    let (access_token, _) = issue_token(
        claims_source.user_id,
        &claims_source.username,
        claims_source.role,
        TokenType::Access,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(token_error)?;

    let (refresh_token, refresh_claims) = issue_token(
        claims_source.user_id,
        &claims_source.username,
        claims_source.role,
        TokenType::Refresh,
        &config.jwt_secret,
        config.refresh_token_ttl,
    )
    .map_err(token_error)?;

    debug!(user_id = claims_source.user_id, jti = %refresh_claims.jti, "Storing refresh token");

    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(claims_source.user_id)
    .bind(&refresh_claims.jti)
    .bind(refresh_claims.exp as i64)
    .execute(pool)
    .await?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

async fn reject_login(pool: &MySqlPool, username: &str) -> ApiError {
    audit::record(pool, None, &format!("Failed login attempt for {username}")).await;
    ApiError::Unauthorized("Invalid credentials".into())
}

fn refresh_claims(req: &HttpRequest, config: &Config) -> Option<Claims> {
    let claims = verify_token(bearer(req)?, &config.jwt_secret).ok()?;
    (claims.token_type == TokenType::Refresh).then_some(claims)
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Token pair issued", body = TokenPair),
        (status = 400, description = "Username or password missing"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, user),
    fields(username = %user.username)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    info!("Login request received");

    if user.username.trim().is_empty() || user.password.is_empty() {
        return Err(ApiError::BadRequest("Username or password required".into()));
    }

    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?");
    let db_user = sqlx::query_as::<_, User>(&sql)
        .bind(user.username.trim())
        .fetch_optional(pool.get_ref())
        .await?;

    let Some(db_user) = db_user else {
        info!("Invalid credentials: user not found");
        return Err(reject_login(pool.get_ref(), &user.username).await);
    };

    if let Err(e) = verify_password(&user.password, &db_user.password_hash) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(reject_login(pool.get_ref(), &user.username).await);
    }

    let actor = AuthUser {
        user_id: db_user.id,
        username: db_user.username,
        role: db_user.role,
    };

    let pair = issue_pair(pool.get_ref(), &config, &actor).await?;
    audit::record(pool.get_ref(), Some(&actor), "Logged in").await;
    info!(user_id = actor.user_id, role = %actor.role, "Login successful");

    Ok(HttpResponse::Ok().json(pair))
}

/// Rotates a refresh token: the presented one is revoked, a new pair is issued.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New token pair", body = TokenPair),
        (status = 401, description = "Missing, invalid or revoked refresh token")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let unauthorized = || ApiError::Unauthorized("Invalid refresh token".into());

    let claims = refresh_claims(&req, &config).ok_or_else(unauthorized)?;

    let mut tx = pool.begin().await?;

    let record = sqlx::query_as::<_, (u64, bool)>(
        "SELECT id, revoked FROM refresh_tokens WHERE jti = ? FOR UPDATE",
    )
    .bind(&claims.jti)
    .fetch_optional(&mut *tx)
    .await?;

    let token_id = match record {
        Some((id, false)) => id,
        _ => return Err(unauthorized()),
    };

    sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE id = ?")
        .bind(token_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    let actor = AuthUser::from(claims);
    let pair = issue_pair(pool.get_ref(), &config, &actor).await?;

    Ok(HttpResponse::Ok().json(pair))
}

/// Revokes the presented refresh token. Always answers 204.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 204, description = "Logged out")),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    let Some(claims) = refresh_claims(&req, &config) else {
        return HttpResponse::NoContent().finish();
    };

    if let Err(e) = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ?")
        .bind(&claims.jti)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to revoke refresh token");
    }

    let actor = AuthUser::from(claims);
    audit::record(pool.get_ref(), Some(&actor), "Logged out").await;

    HttpResponse::NoContent().finish()
}
