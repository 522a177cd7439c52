use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct SalarySlip {
    pub id: u64,
    pub user_id: u64,
    #[schema(example = 3)]
    pub month: i32,
    #[schema(example = 2026)]
    pub year: i32,
    pub file_path: String,
}
