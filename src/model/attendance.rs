use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use strum::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Late,
    HalfDay,
    Absent,
}

/// Office timing rules. The thresholds are policy, not workflow, so they are
/// kept in one place instead of being scattered through the handlers.
#[derive(Debug, Clone)]
pub struct AttendancePolicy {
    pub workday_start: NaiveTime,
    pub late_grace: Duration,
    pub half_day_under_hours: f64,
}

impl Default for AttendancePolicy {
    fn default() -> Self {
        Self {
            workday_start: NaiveTime::from_hms_opt(9, 0, 0).expect("valid time"),
            late_grace: Duration::minutes(15),
            half_day_under_hours: 4.0,
        }
    }
}

impl AttendancePolicy {
    /// Status assigned at check-in time: late once the grace period is over.
    pub fn check_in_status(&self, at: NaiveTime) -> AttendanceStatus {
        if at > self.workday_start + self.late_grace {
            AttendanceStatus::Late
        } else {
            AttendanceStatus::Present
        }
    }

    /// Status after check-out: a short day downgrades to half_day, otherwise
    /// the check-in status stands.
    pub fn check_out_status(
        &self,
        checked_in_as: AttendanceStatus,
        worked_hours: f64,
    ) -> AttendanceStatus {
        if worked_hours < self.half_day_under_hours {
            AttendanceStatus::HalfDay
        } else {
            checked_in_as
        }
    }
}

/// Duration between check-in and check-out in hours, rounded to 2 decimals.
pub fn work_hours(check_in: NaiveDateTime, check_out: NaiveDateTime) -> f64 {
    let hours = (check_out - check_in).num_seconds() as f64 / 3600.0;
    (hours * 100.0).round() / 100.0
}

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AttendanceRow {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = 7)]
    pub employee_id: i64,
    #[schema(example = "2026-01-10", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub check_in: Option<NaiveDateTime>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub check_out: Option<NaiveDateTime>,
    #[schema(example = 8.5)]
    pub work_hours: Option<f64>,
    #[schema(example = "present", value_type = String)]
    pub status: String,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn work_hours_nine_to_five_thirty() {
        assert_eq!(work_hours(dt(9, 0), dt(17, 30)), 8.5);
    }

    #[test]
    fn work_hours_rounds_to_two_decimals() {
        // 7h 50m = 7.8333... -> 7.83
        assert_eq!(work_hours(dt(9, 10), dt(17, 0)), 7.83);
    }

    #[test]
    fn late_after_grace_period() {
        let policy = AttendancePolicy::default();
        assert_eq!(
            policy.check_in_status(NaiveTime::from_hms_opt(9, 15, 0).unwrap()),
            AttendanceStatus::Present
        );
        assert_eq!(
            policy.check_in_status(NaiveTime::from_hms_opt(9, 16, 0).unwrap()),
            AttendanceStatus::Late
        );
        assert_eq!(
            policy.check_in_status(NaiveTime::from_hms_opt(8, 0, 0).unwrap()),
            AttendanceStatus::Present
        );
    }

    #[test]
    fn short_day_downgrades_to_half_day() {
        let policy = AttendancePolicy::default();
        assert_eq!(
            policy.check_out_status(AttendanceStatus::Present, 3.99),
            AttendanceStatus::HalfDay
        );
        assert_eq!(
            policy.check_out_status(AttendanceStatus::Late, 8.0),
            AttendanceStatus::Late
        );
    }

    #[test]
    fn status_string_forms() {
        assert_eq!(AttendanceStatus::HalfDay.to_string(), "half_day");
        assert_eq!(
            "late".parse::<AttendanceStatus>().unwrap(),
            AttendanceStatus::Late
        );
    }
}
