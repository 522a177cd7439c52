//! Leave balance engine.
//!
//! A balance is a pure function of the holder (joining date, team), the
//! leave type, the target year and the holder's approved leave history.
//! Every branch yields a number; nothing here fails, so a balance query can
//! never block the leave-application workflow.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::{
    leave_request::{LeaveRequest, LeaveStatus, LeaveType},
    team::Team,
};

pub const CASUAL_ENTITLEMENT: i64 = 7;
pub const SICK_ENTITLEMENT: i64 = 7;
/// Most unused sick leave that rolls into the next year.
pub const SICK_CARRY_CAP: i64 = 30;
/// Carry-forward stops here: the balance for this year and earlier has no
/// prior-year component.
pub const SICK_CARRY_EPOCH: i32 = 2020;
/// Fixed point of the carry chain once a holder stops taking sick leave.
pub const SICK_STEADY_STATE: i64 = SICK_ENTITLEMENT + SICK_CARRY_CAP;
/// One earned day accrues per this many calendar days since joining.
pub const EARNED_ACCRUAL_DAYS: i64 = 20;
pub const EARNED_CAP: i64 = 90;
pub const MATERNITY_ENTITLEMENT: i64 = 84;

/// What the engine needs to know about an employee.
pub trait LeaveHolder {
    fn holder_id(&self) -> u64;
    fn date_of_joining(&self) -> Option<NaiveDate>;
    fn team(&self) -> Option<Team>;
}

/// Balances for the four displayed leave types. `lop` is unlimited and is
/// never shown as a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[schema(example = json!({
    "year": 2026, "casual": 4, "sick": 19, "earned": 10, "maternity": 84
}))]
pub struct BalanceSummary {
    pub year: i32,
    pub casual: i64,
    pub sick: i64,
    pub earned: i64,
    pub maternity: i64,
}

pub struct LeaveBalanceEngine<'a> {
    history: &'a [LeaveRequest],
    today: NaiveDate,
}

impl<'a> LeaveBalanceEngine<'a> {
    /// `history` may hold any rows; only approved rows of the queried holder
    /// are counted. `today` drives the default year and earned accrual.
    pub fn new(history: &'a [LeaveRequest], today: NaiveDate) -> Self {
        Self { history, today }
    }

    /// Signed balance; `year` defaults to the current calendar year.
    pub fn balance<H: LeaveHolder>(
        &self,
        holder: &H,
        leave_type: LeaveType,
        year: Option<i32>,
    ) -> i64 {
        let year = year.unwrap_or_else(|| self.today.year());

        match leave_type {
            LeaveType::Casual => CASUAL_ENTITLEMENT - self.used_days(holder, LeaveType::Casual, year),
            LeaveType::Sick => self.sick_balance(holder, year),
            LeaveType::Earned => self.earned_balance(holder, year),
            LeaveType::Maternity => match holder.team() {
                Some(Team::Corporate) => MATERNITY_ENTITLEMENT,
                _ => 0,
            },
            LeaveType::Lop => 0,
        }
    }

    /// Same as [`balance`](Self::balance) for a raw type name. Names outside
    /// the fixed set are untracked and report 0.
    pub fn balance_by_name<H: LeaveHolder>(&self, holder: &H, name: &str, year: Option<i32>) -> i64 {
        match name.parse::<LeaveType>() {
            Ok(leave_type) => self.balance(holder, leave_type, year),
            Err(_) => 0,
        }
    }

    /// Inclusive days of approved `leave_type` leave whose start falls in `year`.
    pub fn used_days<H: LeaveHolder>(&self, holder: &H, leave_type: LeaveType, year: i32) -> i64 {
        self.history
            .iter()
            .filter(|l| {
                l.user_id == holder.holder_id()
                    && l.leave_type == leave_type
                    && l.status == LeaveStatus::Approved
                    && l.start_date.year() == year
            })
            .map(LeaveRequest::days)
            .sum()
    }

    pub fn summary<H: LeaveHolder>(&self, holder: &H, year: Option<i32>) -> BalanceSummary {
        let year = year.unwrap_or_else(|| self.today.year());
        BalanceSummary {
            year,
            casual: self.balance(holder, LeaveType::Casual, Some(year)),
            sick: self.balance(holder, LeaveType::Sick, Some(year)),
            earned: self.balance(holder, LeaveType::Earned, Some(year)),
            maternity: self.balance(holder, LeaveType::Maternity, Some(year)),
        }
    }

    fn last_year_used<H: LeaveHolder>(&self, holder: &H, leave_type: LeaveType) -> Option<i32> {
        self.history
            .iter()
            .filter(|l| {
                l.user_id == holder.holder_id()
                    && l.leave_type == leave_type
                    && l.status == LeaveStatus::Approved
            })
            .map(|l| l.start_date.year())
            .max()
    }

    /// Walks forward from the epoch, carrying each positive balance (capped)
    /// into the following year. Stops early once the chain has settled and no
    /// later usage can move it.
    fn sick_balance<H: LeaveHolder>(&self, holder: &H, year: i32) -> i64 {
        let first = year.min(SICK_CARRY_EPOCH);
        let mut balance = SICK_ENTITLEMENT - self.used_days(holder, LeaveType::Sick, first);
        let last_used = self.last_year_used(holder, LeaveType::Sick);

        for y in (first + 1)..=year {
            if balance == SICK_STEADY_STATE && last_used.is_none_or(|last| y > last) {
                break;
            }
            let carried = if balance > 0 { balance.min(SICK_CARRY_CAP) } else { 0 };
            balance = SICK_ENTITLEMENT + carried - self.used_days(holder, LeaveType::Sick, y);
        }

        balance
    }

    /// Lifetime accrual measured against today, minus the usage of the
    /// queried year only. The mismatch is long-standing policy behaviour and
    /// is kept as is.
    fn earned_balance<H: LeaveHolder>(&self, holder: &H, year: i32) -> i64 {
        let Some(doj) = holder.date_of_joining() else {
            return 0;
        };

        let days_worked = (self.today - doj).num_days();
        let entitlement = days_worked.div_euclid(EARNED_ACCRUAL_DAYS);
        let used = self.used_days(holder, LeaveType::Earned, year);

        (entitlement - used).min(EARNED_CAP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    struct Holder {
        id: u64,
        doj: Option<NaiveDate>,
        team: Option<Team>,
    }

    impl LeaveHolder for Holder {
        fn holder_id(&self) -> u64 {
            self.id
        }
        fn date_of_joining(&self) -> Option<NaiveDate> {
            self.doj
        }
        fn team(&self) -> Option<Team> {
            self.team
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn corporate() -> Holder {
        Holder {
            id: 1,
            doj: Some(date(2019, 6, 1)),
            team: Some(Team::Corporate),
        }
    }

    fn leave(
        leave_type: LeaveType,
        start: NaiveDate,
        end: NaiveDate,
        status: LeaveStatus,
    ) -> LeaveRequest {
        LeaveRequest {
            id: 0,
            user_id: 1,
            leave_type,
            start_date: start,
            end_date: end,
            status,
            reason: None,
            doctor_cert: None,
        }
    }

    fn approved(leave_type: LeaveType, start: NaiveDate, end: NaiveDate) -> LeaveRequest {
        leave(leave_type, start, end, LeaveStatus::Approved)
    }

    const TODAY: (i32, u32, u32) = (2026, 10, 17);

    fn today() -> NaiveDate {
        date(TODAY.0, TODAY.1, TODAY.2)
    }

    #[test]
    fn casual_is_seven_without_history() {
        let engine = LeaveBalanceEngine::new(&[], today());
        for year in [1999, 2020, 2024, 2031] {
            assert_eq!(engine.balance(&corporate(), LeaveType::Casual, Some(year)), 7);
        }
    }

    #[test]
    fn casual_deducts_approved_days_in_year() {
        let history = vec![approved(LeaveType::Casual, date(2025, 3, 1), date(2025, 3, 3))];
        let engine = LeaveBalanceEngine::new(&history, today());
        assert_eq!(engine.balance(&corporate(), LeaveType::Casual, Some(2025)), 4);
        assert_eq!(engine.balance(&corporate(), LeaveType::Casual, Some(2024)), 7);
    }

    #[test]
    fn pending_and_rejected_requests_are_free() {
        let history = vec![
            leave(LeaveType::Casual, date(2026, 1, 5), date(2026, 1, 6), LeaveStatus::Pending),
            leave(LeaveType::Casual, date(2026, 2, 5), date(2026, 2, 9), LeaveStatus::Rejected),
        ];
        let engine = LeaveBalanceEngine::new(&history, today());
        assert_eq!(engine.balance(&corporate(), LeaveType::Casual, None), 7);
    }

    #[test]
    fn other_holders_history_is_ignored() {
        let mut theirs = approved(LeaveType::Casual, date(2026, 1, 5), date(2026, 1, 6));
        theirs.user_id = 2;
        let history = vec![theirs];
        let engine = LeaveBalanceEngine::new(&history, today());
        assert_eq!(engine.balance(&corporate(), LeaveType::Casual, None), 7);
    }

    #[test]
    fn leave_belongs_to_the_year_it_starts_in() {
        let history = vec![approved(LeaveType::Casual, date(2025, 12, 30), date(2026, 1, 2))];
        let engine = LeaveBalanceEngine::new(&history, today());
        assert_eq!(engine.balance(&corporate(), LeaveType::Casual, Some(2025)), 3);
        assert_eq!(engine.balance(&corporate(), LeaveType::Casual, Some(2026)), 7);
    }

    #[test]
    fn casual_goes_negative_when_overdrawn() {
        let history = vec![approved(LeaveType::Casual, date(2026, 4, 1), date(2026, 4, 10))];
        let engine = LeaveBalanceEngine::new(&history, today());
        assert_eq!(engine.balance(&corporate(), LeaveType::Casual, Some(2026)), -3);
    }

    #[test]
    fn default_year_follows_today() {
        let history = vec![approved(LeaveType::Casual, date(2026, 5, 4), date(2026, 5, 4))];
        let engine = LeaveBalanceEngine::new(&history, today());
        assert_eq!(engine.balance(&corporate(), LeaveType::Casual, None), 6);
    }

    #[test]
    fn sick_before_epoch_has_no_carry_forward() {
        let history = vec![
            approved(LeaveType::Sick, date(2019, 2, 1), date(2019, 2, 2)),
            approved(LeaveType::Sick, date(2020, 2, 1), date(2020, 2, 3)),
        ];
        let engine = LeaveBalanceEngine::new(&history, today());
        assert_eq!(engine.balance(&corporate(), LeaveType::Sick, Some(2019)), 5);
        assert_eq!(engine.balance(&corporate(), LeaveType::Sick, Some(2020)), 4);
        assert_eq!(engine.balance(&corporate(), LeaveType::Sick, Some(1990)), 7);
    }

    #[test]
    fn sick_carries_positive_prior_balance() {
        let history = vec![
            approved(LeaveType::Sick, date(2020, 2, 1), date(2020, 2, 3)),
            approved(LeaveType::Sick, date(2021, 6, 1), date(2021, 6, 1)),
        ];
        let engine = LeaveBalanceEngine::new(&history, today());
        // 2020: 7 - 3 = 4
        // 2021: 7 + 4 - 1 = 10
        assert_eq!(engine.balance(&corporate(), LeaveType::Sick, Some(2021)), 10);
        // 2022: 7 + 10 = 17
        assert_eq!(engine.balance(&corporate(), LeaveType::Sick, Some(2022)), 17);
    }

    #[test]
    fn sick_carry_forward_is_capped() {
        let engine = LeaveBalanceEngine::new(&[], today());
        // 2020: 7, 2021: 14, 2022: 21, 2023: 28, 2024: 35, 2025: 7 + 30
        assert_eq!(engine.balance(&corporate(), LeaveType::Sick, Some(2024)), 35);
        assert_eq!(engine.balance(&corporate(), LeaveType::Sick, Some(2025)), 37);
        assert_eq!(engine.balance(&corporate(), LeaveType::Sick, Some(2026)), 37);
    }

    #[test]
    fn sick_chain_settles_for_distant_years() {
        let history: Vec<_> = (0..200)
            .map(|i| approved(LeaveType::Sick, date(2021 + i % 5, 3, 1), date(2021 + i % 5, 3, 1)))
            .collect();
        let engine = LeaveBalanceEngine::new(&history, today());
        assert_eq!(engine.balance(&corporate(), LeaveType::Sick, Some(2_022_020)), SICK_STEADY_STATE);
        assert_eq!(engine.balance(&corporate(), LeaveType::Sick, Some(i32::MAX)), SICK_STEADY_STATE);
    }

    #[test]
    fn settled_sick_chain_still_deducts_later_usage() {
        let history = vec![approved(LeaveType::Sick, date(2030, 5, 4), date(2030, 5, 5))];
        let engine = LeaveBalanceEngine::new(&history, today());
        assert_eq!(engine.balance(&corporate(), LeaveType::Sick, Some(2029)), SICK_STEADY_STATE);
        assert_eq!(engine.balance(&corporate(), LeaveType::Sick, Some(2030)), 35);
        assert_eq!(engine.balance(&corporate(), LeaveType::Sick, Some(2031)), 37);
    }

    #[test]
    fn sick_capped_carry_deducts_current_usage() {
        let history = vec![approved(LeaveType::Sick, date(2025, 9, 1), date(2025, 9, 4))];
        let engine = LeaveBalanceEngine::new(&history, today());
        let prior = engine.balance(&corporate(), LeaveType::Sick, Some(2024));
        assert_eq!(prior, 35);
        assert_eq!(
            engine.balance(&corporate(), LeaveType::Sick, Some(2025)),
            7 + prior.min(30) - 4
        );
    }

    #[test]
    fn negative_sick_balance_carries_nothing() {
        let history = vec![approved(LeaveType::Sick, date(2020, 1, 1), date(2020, 1, 20))];
        let engine = LeaveBalanceEngine::new(&history, today());
        assert_eq!(engine.balance(&corporate(), LeaveType::Sick, Some(2020)), -13);
        assert_eq!(engine.balance(&corporate(), LeaveType::Sick, Some(2021)), 7);
    }

    #[test]
    fn earned_accrues_from_joining_date() {
        let holder = Holder {
            id: 1,
            doj: Some(today() - Duration::days(200)),
            team: Some(Team::Production),
        };
        let engine = LeaveBalanceEngine::new(&[], today());
        assert_eq!(engine.balance(&holder, LeaveType::Earned, None), 10);
    }

    #[test]
    fn earned_without_joining_date_is_zero() {
        let holder = Holder { id: 1, doj: None, team: None };
        let history = vec![approved(LeaveType::Earned, date(2026, 1, 1), date(2026, 1, 3))];
        let engine = LeaveBalanceEngine::new(&history, today());
        assert_eq!(engine.balance(&holder, LeaveType::Earned, None), 0);
    }

    #[test]
    fn earned_is_capped_at_ninety() {
        let holder = Holder {
            id: 1,
            doj: Some(date(1990, 1, 1)),
            team: None,
        };
        let engine = LeaveBalanceEngine::new(&[], today());
        assert_eq!(engine.balance(&holder, LeaveType::Earned, Some(2026)), 90);
    }

    #[test]
    fn earned_deducts_only_the_queried_years_usage() {
        let holder = Holder {
            id: 1,
            doj: Some(today() - Duration::days(400)),
            team: None,
        };
        let history = vec![
            approved(LeaveType::Earned, date(2025, 12, 1), date(2025, 12, 5)),
            approved(LeaveType::Earned, date(2026, 2, 2), date(2026, 2, 3)),
        ];
        let engine = LeaveBalanceEngine::new(&history, today());
        assert_eq!(engine.balance(&holder, LeaveType::Earned, Some(2026)), 20 - 2);
        assert_eq!(engine.balance(&holder, LeaveType::Earned, Some(2025)), 20 - 5);
        assert_eq!(engine.balance(&holder, LeaveType::Earned, Some(2024)), 20);
    }

    #[test]
    fn earned_floors_a_future_joining_date() {
        let holder = Holder {
            id: 1,
            doj: Some(today() + Duration::days(5)),
            team: None,
        };
        let engine = LeaveBalanceEngine::new(&[], today());
        assert_eq!(engine.balance(&holder, LeaveType::Earned, None), -1);
    }

    #[test]
    fn maternity_depends_only_on_team() {
        let history = vec![approved(LeaveType::Maternity, date(2026, 1, 1), date(2026, 3, 1))];
        let engine = LeaveBalanceEngine::new(&history, today());
        assert_eq!(engine.balance(&corporate(), LeaveType::Maternity, Some(2026)), 84);
        assert_eq!(engine.balance(&corporate(), LeaveType::Maternity, Some(1970)), 84);

        let production = Holder { id: 1, doj: None, team: Some(Team::Production) };
        let unset = Holder { id: 1, doj: None, team: None };
        assert_eq!(engine.balance(&production, LeaveType::Maternity, None), 0);
        assert_eq!(engine.balance(&unset, LeaveType::Maternity, None), 0);
    }

    #[test]
    fn lop_and_unknown_types_are_zero() {
        let history = vec![approved(LeaveType::Lop, date(2026, 1, 1), date(2026, 1, 30))];
        let engine = LeaveBalanceEngine::new(&history, today());
        assert_eq!(engine.balance(&corporate(), LeaveType::Lop, None), 0);
        assert_eq!(engine.balance_by_name(&corporate(), "lop", None), 0);
        assert_eq!(engine.balance_by_name(&corporate(), "sabbatical", None), 0);
        assert_eq!(engine.balance_by_name(&corporate(), "casual", None), 7);
    }

    #[test]
    fn summary_reports_four_tracked_types() {
        let holder = Holder {
            id: 1,
            doj: Some(today() - Duration::days(200)),
            team: Some(Team::Corporate),
        };
        let history = vec![approved(LeaveType::Casual, date(2026, 3, 1), date(2026, 3, 3))];
        let engine = LeaveBalanceEngine::new(&history, today());
        assert_eq!(
            engine.summary(&holder, None),
            BalanceSummary {
                year: 2026,
                casual: 4,
                sick: 37,
                earned: 10,
                maternity: 84,
            }
        );
    }
}
