use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AuditLog {
    pub id: u64,
    pub user_id: Option<u64>,
    pub action: String,
    #[schema(value_type = String, format = "date-time")]
    pub timestamp: NaiveDateTime,
}
