use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveType {
    Casual,
    Sick,
    Earned,
    Maternity,
    /// Leave without pay. Unlimited and never tracked as a balance.
    Lop,
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "user_id": 12,
    "leave_type": "casual",
    "start_date": "2026-03-02",
    "end_date": "2026-03-04",
    "status": "pending",
    "reason": "Family function",
    "doctor_cert": null
}))]
pub struct LeaveRequest {
    pub id: u64,
    pub user_id: u64,
    pub leave_type: LeaveType,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    pub status: LeaveStatus,
    pub reason: Option<String>,
    /// Reference to a certificate stored outside this service
    pub doctor_cert: Option<String>,
}

impl LeaveRequest {
    /// Inclusive day count: a single-day request consumes one day.
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(start: NaiveDate, end: NaiveDate) -> LeaveRequest {
        LeaveRequest {
            id: 1,
            user_id: 1,
            leave_type: LeaveType::Casual,
            start_date: start,
            end_date: end,
            status: LeaveStatus::Approved,
            reason: None,
            doctor_cert: None,
        }
    }

    #[test]
    fn counts_days_inclusively() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(request(d, d).days(), 1);
        assert_eq!(
            request(d, NaiveDate::from_ymd_opt(2024, 3, 3).unwrap()).days(),
            3
        );
    }

    #[test]
    fn leave_type_names_match_storage() {
        assert_eq!("lop".parse::<LeaveType>().unwrap(), LeaveType::Lop);
        assert_eq!(LeaveType::Maternity.to_string(), "maternity");
        assert!("annual".parse::<LeaveType>().is_err());
    }
}
