//! Checks a new leave application against the applicant's balance and the
//! two non-balance rules. Violations are shown to the applicant, never
//! treated as failures.

use chrono::NaiveDate;
use derive_more::Display;

use crate::model::leave_request::LeaveType;

/// Longest casual leave an employee may take without the higher approval path.
pub const CASUAL_SELF_APPROVAL_LIMIT: i64 = 3;
/// Sick leave longer than this needs a medical certificate.
pub const SICK_CERTIFICATE_THRESHOLD: i64 = 2;

#[derive(Debug, Clone)]
pub struct LeaveApplication {
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub has_certificate: bool,
}

impl LeaveApplication {
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum PolicyViolation {
    #[display(fmt = "start_date cannot be after end_date")]
    InvalidRange,
    #[display(
        fmt = "Insufficient {} leave balance ({} days available)",
        leave_type,
        available
    )]
    InsufficientBalance { leave_type: LeaveType, available: i64 },
    #[display(fmt = "Casual leave cannot exceed 3 days without management approval")]
    ExceedsSelfApproval,
    #[display(fmt = "Sick leave >2 days requires doctor certificate")]
    CertificateRequired,
}

impl PolicyViolation {
    pub fn code(&self) -> &'static str {
        match self {
            PolicyViolation::InvalidRange => "invalid_range",
            PolicyViolation::InsufficientBalance { .. } => "insufficient_balance",
            PolicyViolation::ExceedsSelfApproval => "exceeds_self_approval",
            PolicyViolation::CertificateRequired => "certificate_required",
        }
    }
}

/// `balance` is the engine's answer for the application's leave type.
pub fn check(application: &LeaveApplication, balance: i64) -> Result<(), PolicyViolation> {
    if application.end_date < application.start_date {
        return Err(PolicyViolation::InvalidRange);
    }

    let days = application.days();

    if application.leave_type != LeaveType::Lop && days > balance {
        return Err(PolicyViolation::InsufficientBalance {
            leave_type: application.leave_type,
            available: balance,
        });
    }

    if application.leave_type == LeaveType::Casual && days > CASUAL_SELF_APPROVAL_LIMIT {
        return Err(PolicyViolation::ExceedsSelfApproval);
    }

    if application.leave_type == LeaveType::Sick
        && days > SICK_CERTIFICATE_THRESHOLD
        && !application.has_certificate
    {
        return Err(PolicyViolation::CertificateRequired);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(leave_type: LeaveType, days: i64, has_certificate: bool) -> LeaveApplication {
        let start = NaiveDate::from_ymd_opt(2026, 5, 4).unwrap();
        LeaveApplication {
            leave_type,
            start_date: start,
            end_date: start + chrono::Duration::days(days - 1),
            has_certificate,
        }
    }

    #[test]
    fn accepts_within_balance() {
        assert_eq!(check(&app(LeaveType::Casual, 2, false), 7), Ok(()));
        assert_eq!(check(&app(LeaveType::Earned, 10, false), 10), Ok(()));
    }

    #[test]
    fn rejects_reversed_range() {
        let mut a = app(LeaveType::Casual, 1, false);
        a.end_date = a.start_date - chrono::Duration::days(1);
        assert_eq!(check(&a, 7), Err(PolicyViolation::InvalidRange));
    }

    #[test]
    fn rejects_insufficient_balance_with_available_days() {
        let err = check(&app(LeaveType::Earned, 5, false), 4).unwrap_err();
        assert_eq!(
            err,
            PolicyViolation::InsufficientBalance {
                leave_type: LeaveType::Earned,
                available: 4
            }
        );
        assert_eq!(
            err.to_string(),
            "Insufficient earned leave balance (4 days available)"
        );
    }

    #[test]
    fn lop_is_never_blocked_by_balance() {
        assert_eq!(check(&app(LeaveType::Lop, 45, false), 0), Ok(()));
        assert_eq!(check(&app(LeaveType::Lop, 1, false), -20), Ok(()));
    }

    #[test]
    fn casual_over_three_days_needs_management() {
        assert_eq!(check(&app(LeaveType::Casual, 3, false), 7), Ok(()));
        assert_eq!(
            check(&app(LeaveType::Casual, 4, false), 7),
            Err(PolicyViolation::ExceedsSelfApproval)
        );
    }

    #[test]
    fn balance_is_checked_before_casual_limit() {
        assert!(matches!(
            check(&app(LeaveType::Casual, 5, false), 2),
            Err(PolicyViolation::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn long_sick_leave_needs_certificate() {
        assert_eq!(check(&app(LeaveType::Sick, 2, false), 7), Ok(()));
        assert_eq!(
            check(&app(LeaveType::Sick, 3, false), 7),
            Err(PolicyViolation::CertificateRequired)
        );
        assert_eq!(check(&app(LeaveType::Sick, 3, true), 7), Ok(()));
    }
}
