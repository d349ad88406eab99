use crate::model::role::Role;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use utoipa::ToSchema;

#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub role_id: i64,
    pub last_login_at: Option<NaiveDateTime>,
}

impl UserRow {
    pub fn role(&self) -> Option<Role> {
        Role::from_id(self.role_id as u8)
    }
}

/// Per-type remaining allowance, keyed by the fixed leave type codes.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct LeaveBalances {
    #[schema(example = 12.0)]
    pub cl: f64,
    #[schema(example = 15.0)]
    pub el: f64,
    #[schema(example = 10.0)]
    pub sl: f64,
    #[schema(example = 24.0)]
    pub wfh: f64,
    #[schema(example = 0.0)]
    pub compensatory: f64,
}

impl LeaveBalances {
    /// Folds (leave_type, balance) rows into the fixed-key map. Unknown
    /// codes are ignored rather than failing the whole read.
    pub fn from_rows(rows: &[(String, f64)]) -> Self {
        let mut balances = LeaveBalances::default();
        for (leave_type, balance) in rows {
            match leave_type.as_str() {
                "cl" => balances.cl = *balance,
                "el" => balances.el = *balance,
                "sl" => balances.sl = *balance,
                "wfh" => balances.wfh = *balance,
                "compensatory" => balances.compensatory = *balance,
                _ => {}
            }
        }
        balances
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    #[schema(example = 7)]
    pub id: i64,
    #[schema(example = "jdoe")]
    pub username: String,
    #[schema(example = "jdoe@company.com")]
    pub email: String,
    #[schema(example = "employee", value_type = String)]
    pub role: Role,
    pub leave_balances: LeaveBalances,
}

/// Extended profile fields, all optional and self-managed.
#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ProfileRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[schema(example = "employee", value_type = String)]
    pub role: String,
    pub phone: Option<String>,
    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
    pub address: Option<String>,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub joining_date: Option<String>,
    pub date_of_birth: Option<String>,
    pub blood_group: Option<String>,
    pub skills: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balances_fold_from_rows() {
        let rows = vec![
            ("cl".to_string(), 7.5),
            ("wfh".to_string(), 20.0),
            ("unknown".to_string(), 99.0),
        ];
        let balances = LeaveBalances::from_rows(&rows);
        assert_eq!(balances.cl, 7.5);
        assert_eq!(balances.wfh, 20.0);
        assert_eq!(balances.el, 0.0);
    }
}
