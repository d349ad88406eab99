use crate::model::role::Role;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use strum::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
    Low,
    Normal,
    High,
    Urgent,
}

/// `target_roles` is stored as a JSON array of role names, NULL meaning
/// "visible to all roles". An empty list is normalized to NULL at creation,
/// so a stored empty list is treated the same way.
pub fn parse_targets(raw: Option<&str>) -> Option<Vec<Role>> {
    let parsed: Vec<Role> = serde_json::from_str(raw?).ok()?;
    if parsed.is_empty() { None } else { Some(parsed) }
}

pub fn visible_to(target_roles: &Option<Vec<Role>>, viewer: Role) -> bool {
    match target_roles {
        None => true,
        Some(roles) => roles.contains(&viewer),
    }
}

#[derive(Debug, FromRow)]
pub struct AnnouncementRow {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub priority: String,
    pub target_roles: Option<String>,
    pub created_by: i64,
    pub created_by_name: String,
    pub created_at: NaiveDateTime,
    pub is_active: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnnouncementResponse {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Office closed on Friday")]
    pub title: String,
    pub content: String,
    #[schema(example = "high", value_type = String)]
    pub priority: String,
    pub target_roles: Option<Vec<Role>>,
    pub created_by: i64,
    #[schema(example = "admin")]
    pub created_by_name: String,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: NaiveDateTime,
    pub is_active: bool,
}

impl From<AnnouncementRow> for AnnouncementResponse {
    fn from(row: AnnouncementRow) -> Self {
        let target_roles = parse_targets(row.target_roles.as_deref());
        AnnouncementResponse {
            id: row.id,
            title: row.title,
            content: row.content,
            priority: row.priority,
            target_roles,
            created_by: row.created_by,
            created_by_name: row.created_by_name,
            created_at: row.created_at,
            is_active: row.is_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_targets_visible_to_everyone() {
        for viewer in [Role::Admin, Role::Manager, Role::Employee] {
            assert!(visible_to(&None, viewer));
        }
    }

    #[test]
    fn targeted_announcement_only_visible_to_listed_roles() {
        let targets = Some(vec![Role::Manager]);
        assert!(visible_to(&targets, Role::Manager));
        assert!(!visible_to(&targets, Role::Employee));
        assert!(!visible_to(&targets, Role::Admin));
    }

    #[test]
    fn empty_target_list_parses_as_all_roles() {
        assert_eq!(parse_targets(Some("[]")), None);
        assert_eq!(parse_targets(None), None);
        assert_eq!(
            parse_targets(Some(r#"["employee","admin"]"#)),
            Some(vec![Role::Employee, Role::Admin])
        );
    }

    #[test]
    fn malformed_targets_fall_back_to_all_roles() {
        assert_eq!(parse_targets(Some("not json")), None);
    }
}
