use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::{
    leave::LeaveType,
    role::Role,
    user::{LeaveBalances, UserResponse},
};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use std::collections::HashMap;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct UpdateRoleReq {
    #[schema(example = "manager", value_type = String)]
    pub role: Role,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateBalanceReq {
    #[schema(example = "cl", value_type = String)]
    pub leave_type: LeaveType,
    #[schema(example = 12.0)]
    pub balance: f64,
}

/// All users with their balance maps (Admin only).
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All users", body = [UserResponse]),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn list_users(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let users = sqlx::query_as::<_, (i64, String, String, i64)>(
        "SELECT id, username, email, role_id FROM users ORDER BY id",
    )
    .fetch_all(pool.get_ref())
    .await?;

    let balance_rows = sqlx::query_as::<_, (i64, String, f64)>(
        "SELECT user_id, leave_type, balance FROM leave_balances",
    )
    .fetch_all(pool.get_ref())
    .await?;

    let mut by_user: HashMap<i64, Vec<(String, f64)>> = HashMap::new();
    for (user_id, leave_type, balance) in balance_rows {
        by_user.entry(user_id).or_default().push((leave_type, balance));
    }

    let response: Vec<UserResponse> = users
        .into_iter()
        .filter_map(|(id, username, email, role_id)| {
            let role = Role::from_id(role_id as u8)?;
            let balances = by_user.remove(&id).unwrap_or_default();
            Some(UserResponse {
                id,
                username,
                email,
                role,
                leave_balances: LeaveBalances::from_rows(&balances),
            })
        })
        .collect();

    Ok(HttpResponse::Ok().json(response))
}

/// Update a user's role (Admin only).
#[utoipa::path(
    put,
    path = "/api/users/{id}/role",
    params(("id" = i64, Path, description = "User ID")),
    request_body = UpdateRoleReq,
    responses(
        (status = 200, description = "Role updated successfully"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn update_role(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    payload: web::Json<UpdateRoleReq>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let user_id = path.into_inner();

    let result = sqlx::query("UPDATE users SET role_id = ? WHERE id = ?")
        .bind(payload.role.id() as i64)
        .bind(user_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("User not found".into()));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Role updated successfully"
    })))
}

/// Absolute set of one leave-type balance (Admin only).
#[utoipa::path(
    put,
    path = "/api/users/{id}/leave-balance",
    params(("id" = i64, Path, description = "User ID")),
    request_body = UpdateBalanceReq,
    responses(
        (status = 200, description = "Leave balance updated successfully"),
        (status = 400, description = "Balance must not be negative"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn update_balance(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    payload: web::Json<UpdateBalanceReq>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    if payload.balance < 0.0 || !payload.balance.is_finite() {
        return Err(ApiError::Validation(
            "Balance must be a non-negative number".into(),
        ));
    }

    let user_id = path.into_inner();

    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
        .bind(user_id)
        .fetch_one(pool.get_ref())
        .await?;

    if !exists {
        return Err(ApiError::NotFound("User not found".into()));
    }

    sqlx::query(
        r#"
        INSERT INTO leave_balances (user_id, leave_type, balance)
        VALUES (?, ?, ?)
        ON CONFLICT (user_id, leave_type) DO UPDATE SET balance = excluded.balance
        "#,
    )
    .bind(user_id)
    .bind(payload.leave_type.to_string())
    .bind(payload.balance)
    .execute(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Leave balance updated successfully"
    })))
}
