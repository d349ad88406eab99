use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::announcement::{
    AnnouncementResponse, AnnouncementRow, Priority, parse_targets, visible_to,
};
use crate::model::role::Role;
use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateAnnouncement {
    #[schema(example = "Office closed on Friday")]
    pub title: String,
    pub content: String,
    #[schema(example = "high", value_type = String)]
    pub priority: Priority,
    /// null (or an empty list) targets all roles
    pub target_roles: Option<Vec<Role>>,
}

/// Create announcement (Admin only).
#[utoipa::path(
    post,
    path = "/api/announcements",
    request_body = CreateAnnouncement,
    responses(
        (status = 201, description = "Announcement created", body = AnnouncementResponse),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = [])),
    tag = "Announcements"
)]
pub async fn create(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<CreateAnnouncement>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let payload = payload.into_inner();

    if payload.title.trim().is_empty() || payload.content.trim().is_empty() {
        return Err(ApiError::Validation(
            "Title and content must not be empty".into(),
        ));
    }

    // Empty target list is normalized to "all roles"
    let target_roles = payload.target_roles.filter(|roles| !roles.is_empty());
    let targets_json = match &target_roles {
        Some(roles) => Some(
            serde_json::to_string(roles)
                .map_err(|e| ApiError::Internal(anyhow::Error::new(e)))?,
        ),
        None => None,
    };

    let created_at = Utc::now().naive_utc();

    let result = sqlx::query(
        r#"
        INSERT INTO announcements (title, content, priority, target_roles, created_by, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&payload.title)
    .bind(&payload.content)
    .bind(payload.priority.to_string())
    .bind(&targets_json)
    .bind(auth.user_id)
    .bind(created_at)
    .execute(pool.get_ref())
    .await?;

    Ok(HttpResponse::Created().json(AnnouncementResponse {
        id: result.last_insert_rowid(),
        title: payload.title,
        content: payload.content,
        priority: payload.priority.to_string(),
        target_roles,
        created_by: auth.user_id,
        created_by_name: auth.username,
        created_at,
        is_active: true,
    }))
}

/// Active announcements visible to the caller's role, newest first.
#[utoipa::path(
    get,
    path = "/api/announcements",
    responses((status = 200, description = "Visible announcements")),
    security(("bearer_auth" = [])),
    tag = "Announcements"
)]
pub async fn list(auth: AuthUser, pool: web::Data<SqlitePool>) -> Result<HttpResponse, ApiError> {
    let rows = sqlx::query_as::<_, AnnouncementRow>(
        r#"
        SELECT a.id, a.title, a.content, a.priority, a.target_roles,
               a.created_by, COALESCE(u.username, 'System') AS created_by_name,
               a.created_at, a.is_active
        FROM announcements a
        LEFT JOIN users u ON u.id = a.created_by
        WHERE a.is_active = 1
        ORDER BY a.created_at DESC
        LIMIT 100
        "#,
    )
    .fetch_all(pool.get_ref())
    .await?;

    let visible: Vec<AnnouncementResponse> = rows
        .into_iter()
        .filter(|row| {
            let targets = parse_targets(row.target_roles.as_deref());
            visible_to(&targets, auth.role)
        })
        .map(AnnouncementResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(visible))
}

/// Soft-delete an announcement (Admin only).
#[utoipa::path(
    delete,
    path = "/api/announcements/{id}",
    params(("id" = i64, Path, description = "Announcement ID")),
    responses(
        (status = 200, description = "Announcement deleted successfully"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Announcement not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Announcements"
)]
pub async fn delete(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let id = path.into_inner();

    let result = sqlx::query("UPDATE announcements SET is_active = 0 WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Announcement not found".into()));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Announcement deleted successfully"
    })))
}
