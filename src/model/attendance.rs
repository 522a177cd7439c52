use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Attendance {
    pub id: u64,
    pub user_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = Option<String>, example = "09:30:00")]
    pub in_time: Option<NaiveTime>,
    #[schema(value_type = Option<String>, example = "18:15:00")]
    pub out_time: Option<NaiveTime>,
    /// Overtime hours
    pub overtime: f64,
}
