use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error};
use uuid::Uuid;

use crate::{
    model::role::Role,
    models::{Claims, TokenType},
};

fn now() -> usize {
    Utc::now().timestamp().max(0) as usize
}

/// Signs a fresh token and hands back its claims so the caller can persist the `jti`.
pub fn issue_token(
    user_id: u64,
    username: &str,
    role: Role,
    token_type: TokenType,
    secret: &str,
    ttl: usize,
) -> Result<(String, Claims), Error> {
    let claims = Claims {
        user_id,
        sub: username.to_string(),
        role,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
        token_type,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok((token, claims))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies_with_same_secret() {
        let (token, issued) =
            issue_token(5, "ravi", Role::Supervisor, TokenType::Refresh, "secret", 60).unwrap();
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.user_id, 5);
        assert_eq!(claims.role, Role::Supervisor);
        assert_eq!(claims.token_type, TokenType::Refresh);
        assert_eq!(claims.jti, issued.jti);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let (token, _) =
            issue_token(5, "ravi", Role::Employee, TokenType::Access, "secret", 60).unwrap();
        assert!(verify_token(&token, "other").is_err());
    }
}
