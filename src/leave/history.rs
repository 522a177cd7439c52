use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::MySqlPool;

use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType};

pub const LEAVE_COLUMNS: &str =
    "id, user_id, leave_type, start_date, end_date, status, reason, doctor_cert";

/// Selection over a user's leave rows. `range` bounds `start_date`, inclusive.
#[derive(Debug, Clone, Default)]
pub struct HistoryQuery {
    pub user_id: u64,
    pub leave_type: Option<LeaveType>,
    pub status: Option<LeaveStatus>,
    pub range: Option<(NaiveDate, NaiveDate)>,
}

impl HistoryQuery {
    /// Everything the balance engine needs for one user.
    pub fn approved_for(user_id: u64) -> Self {
        Self {
            user_id,
            status: Some(LeaveStatus::Approved),
            ..Default::default()
        }
    }

    #[cfg(test)]
    pub fn matches(&self, leave: &LeaveRequest) -> bool {
        leave.user_id == self.user_id
            && self.leave_type.is_none_or(|t| t == leave.leave_type)
            && self.status.is_none_or(|s| s == leave.status)
            && self
                .range
                .is_none_or(|(from, to)| leave.start_date >= from && leave.start_date <= to)
    }
}

#[async_trait]
pub trait LeaveHistoryReader: Send + Sync {
    async fn fetch(&self, query: &HistoryQuery) -> Result<Vec<LeaveRequest>, sqlx::Error>;
}

pub struct MySqlLeaveHistory<'a> {
    pool: &'a MySqlPool,
}

impl<'a> MySqlLeaveHistory<'a> {
    pub fn new(pool: &'a MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeaveHistoryReader for MySqlLeaveHistory<'_> {
    async fn fetch(&self, query: &HistoryQuery) -> Result<Vec<LeaveRequest>, sqlx::Error> {
        let sql = history_sql(query);

        let mut q = sqlx::query_as::<_, LeaveRequest>(&sql).bind(query.user_id);
        if let Some(t) = &query.leave_type {
            q = q.bind(t.as_ref());
        }
        if let Some(s) = &query.status {
            q = q.bind(s.as_ref());
        }
        if let Some((from, to)) = query.range {
            q = q.bind(from).bind(to);
        }

        let rows = q.fetch_all(self.pool).await?;
        tracing::debug!(user_id = query.user_id, rows = rows.len(), "Loaded leave history");
        Ok(rows)
    }
}

/// Placeholders follow the bind order in `fetch`: user, type, status, range.
fn history_sql(query: &HistoryQuery) -> String {
    let mut sql = format!("SELECT {LEAVE_COLUMNS} FROM leaves WHERE user_id = ?");
    if query.leave_type.is_some() {
        sql.push_str(" AND leave_type = ?");
    }
    if query.status.is_some() {
        sql.push_str(" AND status = ?");
    }
    if query.range.is_some() {
        sql.push_str(" AND start_date >= ? AND start_date <= ?");
    }
    sql.push_str(" ORDER BY start_date");
    sql
}

/// Vector-backed reader for rows already in memory.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct InMemoryLeaveHistory {
    rows: Vec<LeaveRequest>,
}

#[cfg(test)]
impl InMemoryLeaveHistory {
    pub fn new(rows: Vec<LeaveRequest>) -> Self {
        Self { rows }
    }
}

#[cfg(test)]
#[async_trait]
impl LeaveHistoryReader for InMemoryLeaveHistory {
    async fn fetch(&self, query: &HistoryQuery) -> Result<Vec<LeaveRequest>, sqlx::Error> {
        Ok(self
            .rows
            .iter()
            .filter(|l| query.matches(l))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(id: u64, user_id: u64, leave_type: LeaveType, start: NaiveDate, status: LeaveStatus) -> LeaveRequest {
        LeaveRequest {
            id,
            user_id,
            leave_type,
            start_date: start,
            end_date: start,
            status,
            reason: None,
            doctor_cert: None,
        }
    }

    fn reader() -> InMemoryLeaveHistory {
        InMemoryLeaveHistory::new(vec![
            row(1, 7, LeaveType::Casual, date(2026, 1, 10), LeaveStatus::Approved),
            row(2, 7, LeaveType::Sick, date(2026, 2, 10), LeaveStatus::Approved),
            row(3, 7, LeaveType::Casual, date(2025, 12, 31), LeaveStatus::Approved),
            row(4, 7, LeaveType::Casual, date(2026, 3, 1), LeaveStatus::Pending),
            row(5, 8, LeaveType::Casual, date(2026, 1, 10), LeaveStatus::Approved),
        ])
    }

    fn ids(rows: &[LeaveRequest]) -> Vec<u64> {
        rows.iter().map(|r| r.id).collect()
    }

    #[actix_web::test]
    async fn approved_for_selects_one_users_approved_rows() {
        let rows = reader().fetch(&HistoryQuery::approved_for(7)).await.unwrap();
        assert_eq!(ids(&rows), vec![1, 2, 3]);
    }

    #[actix_web::test]
    async fn filters_by_type_status_and_inclusive_range() {
        let query = HistoryQuery {
            user_id: 7,
            leave_type: Some(LeaveType::Casual),
            status: Some(LeaveStatus::Approved),
            range: Some((date(2026, 1, 1), date(2026, 12, 31))),
        };
        assert_eq!(ids(&reader().fetch(&query).await.unwrap()), vec![1]);

        let edge = HistoryQuery {
            range: Some((date(2025, 12, 31), date(2025, 12, 31))),
            ..query
        };
        assert_eq!(ids(&reader().fetch(&edge).await.unwrap()), vec![3]);
    }

    #[test]
    fn sql_placeholders_follow_the_filters() {
        let sql = history_sql(&HistoryQuery::approved_for(7));
        assert!(sql.ends_with("WHERE user_id = ? AND status = ? ORDER BY start_date"));
        assert_eq!(sql.matches('?').count(), 2);

        let full = HistoryQuery {
            user_id: 7,
            leave_type: Some(LeaveType::Sick),
            status: Some(LeaveStatus::Approved),
            range: Some((date(2026, 1, 1), date(2026, 12, 31))),
        };
        let sql = history_sql(&full);
        assert!(sql.contains("user_id = ? AND leave_type = ? AND status = ? AND start_date >= ? AND start_date <= ?"));
        assert_eq!(sql.matches('?').count(), 5);
    }
}
