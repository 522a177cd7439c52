use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

use crate::{
    auth::jwt::verify_token,
    config::Config,
    error::ApiError,
    model::role::Role,
    models::{Claims, TokenType},
};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.sub,
            role: claims.role,
        }
    }
}

/// Validates a bearer access token. Refresh tokens are not accepted here.
pub fn authenticate(header: Option<&str>, secret: &str) -> Result<AuthUser, ApiError> {
    let token = header
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("Missing token".into()))?;

    let claims = verify_token(token, secret)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token".into()))?;

    if claims.token_type != TokenType::Access {
        return Err(ApiError::Unauthorized("Access token required".into()));
    }

    Ok(claims.into())
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Already resolved by `auth_middleware` on protected scopes.
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let Some(config) = req.app_data::<Data<Config>>() else {
            return ready(Err(ApiError::Internal.into()));
        };

        let header = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok());

        ready(authenticate(header, &config.jwt_secret).map_err(Into::into))
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        self.require(&[Role::Admin], "Admin only")
    }

    pub fn require_supervisor(&self) -> Result<(), ApiError> {
        self.require(&[Role::Supervisor], "Supervisor only")
    }

    pub fn require_employee(&self) -> Result<(), ApiError> {
        self.require(&[Role::Employee], "Employee only")
    }

    pub fn require_supervisor_or_admin(&self) -> Result<(), ApiError> {
        self.require(&[Role::Supervisor, Role::Admin], "Supervisor/Admin only")
    }

    fn require(&self, allowed: &[Role], message: &str) -> Result<(), ApiError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(message.to_string()))
        }
    }

    /// Owners see their own records; supervisors and admins see anyone's.
    pub fn can_view_records_of(&self, owner_id: u64) -> bool {
        owner_id == self.user_id || self.require_supervisor_or_admin().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::issue_token;
    use actix_web::test::TestRequest;

    fn config() -> Config {
        Config {
            database_url: String::new(),
            db_max_connections: 1,
            jwt_secret: "test-secret".into(),
            server_addr: String::new(),
            access_token_ttl: 60,
            refresh_token_ttl: 60,
            rate_login_per_min: 1,
            rate_refresh_per_min: 1,
            rate_protected_per_min: 1,
            api_prefix: "/api".into(),
            log_dir: "logs".into(),
        }
    }

    fn bearer(token_type: TokenType) -> String {
        let (token, _) =
            issue_token(9, "meera", Role::Employee, token_type, "test-secret", 60).unwrap();
        format!("Bearer {token}")
    }

    #[actix_web::test]
    async fn extracts_user_from_access_token() {
        let req = TestRequest::default()
            .app_data(Data::new(config()))
            .insert_header(("Authorization", bearer(TokenType::Access)))
            .to_http_request();

        let user = AuthUser::extract(&req).await.unwrap();
        assert_eq!(user.user_id, 9);
        assert_eq!(user.role, Role::Employee);
    }

    #[actix_web::test]
    async fn refresh_token_cannot_authenticate_requests() {
        let req = TestRequest::default()
            .app_data(Data::new(config()))
            .insert_header(("Authorization", bearer(TokenType::Refresh)))
            .to_http_request();

        assert!(AuthUser::extract(&req).await.is_err());
    }

    #[actix_web::test]
    async fn missing_header_is_unauthorized() {
        let req = TestRequest::default()
            .app_data(Data::new(config()))
            .to_http_request();

        let err = AuthUser::extract(&req).await.unwrap_err();
        assert_eq!(
            err.as_response_error().status_code(),
            actix_web::http::StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn role_guards() {
        let sup = AuthUser {
            user_id: 2,
            username: "s".into(),
            role: Role::Supervisor,
        };
        assert!(sup.require_supervisor().is_ok());
        assert!(sup.require_supervisor_or_admin().is_ok());
        assert!(sup.require_admin().is_err());
        assert!(sup.require_employee().is_err());
        assert!(sup.can_view_records_of(99));

        let emp = AuthUser {
            user_id: 3,
            username: "e".into(),
            role: Role::Employee,
        };
        assert!(emp.can_view_records_of(3));
        assert!(!emp.can_view_records_of(4));
    }
}
