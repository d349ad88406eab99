use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::user::ProfileRow;
use crate::utils::db_utils::{build_update_sql, execute_update};
use actix_web::{HttpResponse, web};
use serde_json::Value;
use sqlx::SqlitePool;

/// Columns a user may change on their own profile. Role, credentials and
/// balances are managed elsewhere.
const PROFILE_COLUMNS: &[&str] = &[
    "phone",
    "emergency_contact",
    "emergency_phone",
    "address",
    "department",
    "designation",
    "joining_date",
    "date_of_birth",
    "blood_group",
    "skills",
];

const PROFILE_SELECT: &str = r#"
    SELECT u.id, u.username, u.email,
           CASE u.role_id WHEN 1 THEN 'admin' WHEN 2 THEN 'manager' ELSE 'employee' END AS role,
           u.phone, u.emergency_contact, u.emergency_phone, u.address,
           u.department, u.designation, u.joining_date, u.date_of_birth,
           u.blood_group, u.skills
    FROM users u
    WHERE u.id = ?
"#;

async fn fetch_profile(pool: &SqlitePool, user_id: i64) -> Result<ProfileRow, ApiError> {
    sqlx::query_as::<_, ProfileRow>(PROFILE_SELECT)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))
}

/// Current user's extended profile.
#[utoipa::path(
    get,
    path = "/api/profile",
    responses(
        (status = 200, description = "Profile", body = ProfileRow),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn my_profile(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    let profile = fetch_profile(pool.get_ref(), auth.user_id).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// Partial profile update over the allow-listed columns.
#[utoipa::path(
    put,
    path = "/api/profile",
    responses(
        (status = 200, description = "Updated profile", body = ProfileRow),
        (status = 400, description = "Unknown or empty field set")
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn update_my_profile(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    let update = build_update_sql("users", &body, PROFILE_COLUMNS, "id", auth.user_id)?;

    let affected = execute_update(pool.get_ref(), update).await?;
    if affected == 0 {
        return Err(ApiError::NotFound("User not found".into()));
    }

    let profile = fetch_profile(pool.get_ref(), auth.user_id).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// Another user's profile (Manager/Admin).
#[utoipa::path(
    get,
    path = "/api/profile/{user_id}",
    params(("user_id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Profile", body = ProfileRow),
        (status = 403, description = "Manager or Admin access required"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn user_profile(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_manager_or_admin()?;

    let profile = fetch_profile(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}
