use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Document {
    pub id: u64,
    pub user_id: u64,
    pub file_path: String,
    pub name: Option<String>,
}
