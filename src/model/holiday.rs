use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Holiday {
    pub id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub name: Option<String>,
}
