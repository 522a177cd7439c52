use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

use crate::leave::policy::PolicyViolation;

#[derive(Debug, Display)]
pub enum ApiError {
    #[display(fmt = "{}", _0)]
    BadRequest(String),
    #[display(fmt = "{}", _0)]
    Unauthorized(String),
    #[display(fmt = "{}", _0)]
    Forbidden(String),
    #[display(fmt = "{}", _0)]
    NotFound(String),
    #[display(fmt = "{}", _0)]
    Conflict(String),
    /// Applicant-facing rule violation; `available` echoes the balance when known.
    #[display(fmt = "{}", violation)]
    Policy {
        violation: PolicyViolation,
        available: Option<i64>,
    },
    #[display(fmt = "Internal Server Error")]
    Internal,
}

impl ApiError {
    pub fn forbidden() -> Self {
        ApiError::Forbidden("Access denied".into())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Policy { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::Policy {
                violation,
                available,
            } => json!({
                "message": violation.to_string(),
                "code": violation.code(),
                "balance": available,
            }),
            other => json!({ "message": other.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<PolicyViolation> for ApiError {
    fn from(violation: PolicyViolation) -> Self {
        let available = match &violation {
            PolicyViolation::InsufficientBalance { available, .. } => Some(*available),
            _ => None,
        };
        ApiError::Policy {
            violation,
            available,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!(error = %e, "Database error");
        ApiError::Internal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave_request::LeaveType;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn policy_violation_is_unprocessable_with_balance() {
        let err = ApiError::from(PolicyViolation::InsufficientBalance {
            leave_type: LeaveType::Casual,
            available: 2,
        });
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["code"], "insufficient_balance");
        assert_eq!(value["balance"], 2);
        assert_eq!(
            value["message"],
            "Insufficient casual leave balance (2 days available)"
        );
    }

    #[test]
    fn database_errors_hide_details() {
        let err = ApiError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Internal Server Error");
    }
}
