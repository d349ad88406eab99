use crate::error::ApiError;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use utoipa::ToSchema;

/// Fixed leave type codes.
#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveType {
    /// Casual leave
    Cl,
    /// Earned leave
    El,
    /// Sick leave
    Sl,
    /// Work from home
    Wfh,
    Compensatory,
}

impl LeaveType {
    pub fn all() -> impl Iterator<Item = LeaveType> {
        LeaveType::iter()
    }

    /// Balance granted to a freshly registered user.
    pub fn default_balance(self) -> f64 {
        match self {
            LeaveType::Cl => 12.0,
            LeaveType::El => 15.0,
            LeaveType::Sl => 10.0,
            LeaveType::Wfh => 24.0,
            LeaveType::Compensatory => 0.0,
        }
    }
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, LeaveStatus::Approved | LeaveStatus::Rejected)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LeaveDecision {
    Approve,
    Reject,
}

/// Single transition function for the leave state machine.
///
/// pending -> approved | rejected; terminal states never change.
pub fn transition(current: LeaveStatus, decision: LeaveDecision) -> Result<LeaveStatus, ApiError> {
    match current {
        LeaveStatus::Pending => Ok(match decision {
            LeaveDecision::Approve => LeaveStatus::Approved,
            LeaveDecision::Reject => LeaveStatus::Rejected,
        }),
        _ => Err(ApiError::InvalidState(
            "Leave request already processed".into(),
        )),
    }
}

/// Inclusive day count between two dates. Caller validates start <= end.
pub fn days_count(start: NaiveDate, end: NaiveDate) -> f64 {
    ((end - start).num_days() + 1) as f64
}

/// A leave request row joined with the employee's username.
#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LeaveRequestRow {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = 7)]
    pub employee_id: i64,
    #[schema(example = "jdoe")]
    pub employee_name: String,
    #[schema(example = "cl", value_type = String)]
    pub leave_type: String,
    #[schema(example = "2026-01-10", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-12", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = 3.0)]
    pub days_count: f64,
    #[schema(example = "Family function")]
    pub reason: String,
    #[schema(example = "pending", value_type = String)]
    pub status: String,
    #[schema(example = "2026-01-01T00:00:00", format = "date-time", value_type = String)]
    pub applied_date: NaiveDateTime,
    pub reviewed_by: Option<i64>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub reviewed_date: Option<NaiveDateTime>,
    pub comments: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn days_count_is_inclusive() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 12).unwrap();
        assert_eq!(days_count(start, end), 3.0);
        assert_eq!(days_count(start, start), 1.0);
    }

    #[test]
    fn pending_transitions_both_ways() {
        assert_eq!(
            transition(LeaveStatus::Pending, LeaveDecision::Approve).unwrap(),
            LeaveStatus::Approved
        );
        assert_eq!(
            transition(LeaveStatus::Pending, LeaveDecision::Reject).unwrap(),
            LeaveStatus::Rejected
        );
    }

    #[test]
    fn terminal_states_never_transition() {
        for current in [LeaveStatus::Approved, LeaveStatus::Rejected] {
            for decision in [LeaveDecision::Approve, LeaveDecision::Reject] {
                assert!(transition(current, decision).is_err());
            }
        }
    }

    #[test]
    fn default_balances_match_registration_grants() {
        assert_eq!(LeaveType::Cl.default_balance(), 12.0);
        assert_eq!(LeaveType::El.default_balance(), 15.0);
        assert_eq!(LeaveType::Sl.default_balance(), 10.0);
        assert_eq!(LeaveType::Wfh.default_balance(), 24.0);
        assert_eq!(LeaveType::Compensatory.default_balance(), 0.0);
    }

    #[test]
    fn leave_type_codes() {
        assert_eq!(LeaveType::Wfh.to_string(), "wfh");
        assert_eq!(LeaveType::from_str("compensatory").unwrap(), LeaveType::Compensatory);
        assert!(LeaveType::from_str("annual").is_err());
        assert_eq!(LeaveType::all().count(), 5);
    }
}
