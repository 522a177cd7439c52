use actix_web::{
    Error, HttpMessage, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    web::Data,
};

use crate::{auth::auth::authenticate, config::Config, error::ApiError};

/// Resolves the bearer token once per request and stores the `AuthUser`
/// in request extensions for the extractor.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or(ApiError::Internal)?
        .clone();

    let header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    match authenticate(header, &config.jwt_secret) {
        Ok(user) => {
            tracing::debug!(user_id = user.user_id, role = %user.role, path = req.path(), "Authenticated");
            req.extensions_mut().insert(user);
            next.call(req).await
        }
        Err(e) => {
            tracing::info!(path = req.path(), reason = %e, "Rejected unauthenticated request");
            Ok(req.into_response(e.error_response()))
        }
    }
}
