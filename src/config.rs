use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    pub log_dir: String,
}

fn var_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Reads the process environment; call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server_addr: var_or("SERVER_ADDR", "127.0.0.1:8080".to_string())?,
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            db_max_connections: var_or("DB_MAX_CONNECTIONS", 10)?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            access_token_ttl: var_or("ACCESS_TOKEN_TTL", 900)?, // 15 min
            refresh_token_ttl: var_or("REFRESH_TOKEN_TTL", 604_800)?, // 7 days

            rate_login_per_min: var_or("RATE_LOGIN_PER_MIN", 60)?,
            rate_refresh_per_min: var_or("RATE_REFRESH_PER_MIN", 30)?,
            rate_protected_per_min: var_or("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: var_or("API_PREFIX", "/api".to_string())?,
            log_dir: var_or("LOG_DIR", "logs".to_string())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_default_when_unset() {
        let v: u32 = var_or("OFFICE_HRM_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(v, 42);
    }
}
