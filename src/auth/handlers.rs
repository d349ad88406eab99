use crate::{
    auth::{
        auth::AuthUser,
        jwt::{generate_access_token, generate_refresh_token, verify_token},
        password::{hash_password, verify_password},
    },
    config::Config,
    error::ApiError,
    model::{
        leave::LeaveType,
        role::Role,
        user::{LeaveBalances, UserResponse},
    },
    models::{Claims, LoginReqDto, RegisterReq, TokenType},
    utils::{identity_cache, identity_filter},
};
use actix_web::{HttpRequest, HttpResponse, web};
use anyhow::anyhow;
use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::{debug, error, info, instrument};

/// true  => username/email AVAILABLE
/// false => TAKEN
pub async fn is_identity_available(identity: &str, pool: &SqlitePool) -> bool {
    let identity = identity.to_lowercase();

    // 1. Cuckoo filter - fast negative: if the filter says "not present",
    //    the identity is definitely free.
    if !identity_filter::might_exist(&identity) {
        return true;
    }

    // 2. Moka cache - fast positive
    if identity_cache::is_taken(&identity).await {
        return false;
    }

    // 3. Database fallback
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = ? OR email = ? LIMIT 1)",
    )
    .bind(&identity)
    .bind(&identity)
    .fetch_one(pool)
    .await
    .unwrap_or(true); // fail-safe

    !exists
}

/// Assembles the user payload returned by /auth/me, login and register.
pub async fn load_user_response(pool: &SqlitePool, user_id: i64) -> Result<UserResponse, ApiError> {
    let row = sqlx::query_as::<_, (i64, String, String, i64)>(
        "SELECT id, username, email, role_id FROM users WHERE id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let role = Role::from_id(row.3 as u8)
        .ok_or_else(|| ApiError::Internal(anyhow!("invalid role id {} in database", row.3)))?;

    let balances = sqlx::query_as::<_, (String, f64)>(
        "SELECT leave_type, balance FROM leave_balances WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(UserResponse {
        id: row.0,
        username: row.1,
        email: row.2,
        role,
        leave_balances: LeaveBalances::from_rows(&balances),
    })
}

async fn store_refresh_token(pool: &SqlitePool, claims: &Claims) -> Result<(), ApiError> {
    let expires_at = chrono::DateTime::from_timestamp(claims.exp as i64, 0)
        .map(|d| d.naive_utc())
        .unwrap_or_else(|| Utc::now().naive_utc());

    sqlx::query("INSERT INTO refresh_tokens (user_id, jti, expires_at) VALUES (?, ?, ?)")
        .bind(claims.user_id)
        .bind(&claims.jti)
        .bind(expires_at)
        .execute(pool)
        .await?;

    Ok(())
}

fn issue_token_pair(
    user_id: i64,
    username: &str,
    role: Role,
    config: &Config,
) -> Result<(String, String, Claims), ApiError> {
    let access_token = generate_access_token(
        user_id,
        username.to_string(),
        role.id(),
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(anyhow::Error::new)?;

    let (refresh_token, refresh_claims) = generate_refresh_token(
        user_id,
        username.to_string(),
        role.id(),
        &config.jwt_secret,
        config.refresh_token_ttl,
    )
    .map_err(anyhow::Error::new)?;

    Ok((access_token, refresh_token, refresh_claims))
}

/// User registration handler. Seeds the default leave balances for every
/// leave type in the same transaction as the user row.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "User registered successfully"),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username or email already exists")
    ),
    tag = "Auth"
)]
pub async fn register(
    user: web::Json<RegisterReq>,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let username = user.username.trim().to_string();
    let email = user.email.trim().to_lowercase();

    if username.is_empty() || email.is_empty() || user.password.is_empty() {
        return Err(ApiError::Validation(
            "Username, email and password must not be empty".into(),
        ));
    }

    if !is_identity_available(&username, pool.get_ref()).await
        || !is_identity_available(&email, pool.get_ref()).await
    {
        return Err(ApiError::Conflict("Username or email already exists".into()));
    }

    let hashed = hash_password(&user.password)
        .map_err(|e| ApiError::Internal(anyhow!("password hashing failed: {}", e)))?;

    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "INSERT INTO users (username, email, password, role_id) VALUES (?, ?, ?, ?)",
    )
    .bind(&username)
    .bind(&email)
    .bind(&hashed)
    .bind(user.role.id() as i64)
    .execute(&mut *tx)
    .await;

    let user_id = match result {
        Ok(res) => res.last_insert_rowid(),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return Err(ApiError::Conflict(
                        "Username or email already exists".into(),
                    ));
                }
            }
            return Err(e.into());
        }
    };

    for leave_type in LeaveType::all() {
        sqlx::query("INSERT INTO leave_balances (user_id, leave_type, balance) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(leave_type.to_string())
            .bind(leave_type.default_balance())
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    // Keep the availability filter and cache in step with the insert
    identity_filter::insert(&username);
    identity_filter::insert(&email);
    identity_cache::mark_taken(&username).await;
    identity_cache::mark_taken(&email).await;

    let (access_token, refresh_token, refresh_claims) =
        issue_token_pair(user_id, &username, user.role, &config)?;
    store_refresh_token(pool.get_ref(), &refresh_claims).await?;

    let default_rows: Vec<(String, f64)> = LeaveType::all()
        .map(|t| (t.to_string(), t.default_balance()))
        .collect();

    info!(user_id, username = %username, "User registered");

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "User registered successfully",
        "access_token": access_token,
        "refresh_token": refresh_token,
        "user": UserResponse {
            id: user_id,
            username,
            email,
            role: user.role,
            leave_balances: LeaveBalances::from_rows(&default_rows),
        },
    })))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Login successful"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, user),
    fields(username = %user.username)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    info!("Login request received");

    if user.username.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty username or password");
        return Err(ApiError::Validation("Username or password required".into()));
    }

    debug!("Fetching user from database");

    let db_user = sqlx::query_as::<_, (i64, String, String, i64)>(
        "SELECT id, username, password, role_id FROM users WHERE username = ?",
    )
    .bind(user.username.trim())
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| {
        info!("Invalid credentials: user not found");
        ApiError::Authentication("Invalid username or password".into())
    })?;

    let (user_id, username, password_hash, role_id) = db_user;

    if verify_password(&user.password, &password_hash).is_err() {
        info!("Invalid credentials: password mismatch");
        return Err(ApiError::Authentication(
            "Invalid username or password".into(),
        ));
    }

    let role = Role::from_id(role_id as u8)
        .ok_or_else(|| ApiError::Internal(anyhow!("invalid role id {} in database", role_id)))?;

    debug!("Password verified, issuing tokens");

    let (access_token, refresh_token, refresh_claims) =
        issue_token_pair(user_id, &username, role, &config)?;
    store_refresh_token(pool.get_ref(), &refresh_claims).await?;

    // Update last_login_at (non-fatal)
    if let Err(e) = sqlx::query("UPDATE users SET last_login_at = datetime('now') WHERE id = ?")
        .bind(user_id)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to update last_login_at");
    }

    let user_payload = load_user_response(pool.get_ref(), user_id).await?;

    info!("Login successful");

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Login successful",
        "access_token": access_token,
        "refresh_token": refresh_token,
        "user": user_payload,
    })))
}

/// Current user from bearer token.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn me(auth: AuthUser, pool: web::Data<SqlitePool>) -> Result<HttpResponse, ApiError> {
    let user = load_user_response(pool.get_ref(), auth.user_id).await?;
    Ok(HttpResponse::Ok().json(user))
}

pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let token = bearer_token(&req)
        .ok_or_else(|| ApiError::Authentication("Missing token".into()))?;

    let claims = verify_token(token, &config.jwt_secret)
        .map_err(|_| ApiError::Authentication("Invalid or expired token".into()))?;

    if claims.token_type != TokenType::Refresh {
        return Err(ApiError::Authentication("Refresh token required".into()));
    }

    let record = sqlx::query_as::<_, (i64, i64, bool)>(
        "SELECT id, user_id, revoked FROM refresh_tokens WHERE jti = ?",
    )
    .bind(&claims.jti)
    .fetch_optional(pool.get_ref())
    .await?;

    let (record_id, user_id) = match record {
        Some((id, user_id, false)) => (id, user_id),
        _ => return Err(ApiError::Authentication("Token revoked or unknown".into())),
    };

    // Rotation: the presented refresh token is spent either way
    sqlx::query("UPDATE refresh_tokens SET revoked = 1 WHERE id = ?")
        .bind(record_id)
        .execute(pool.get_ref())
        .await?;

    let role = Role::from_id(claims.role)
        .ok_or_else(|| ApiError::Authentication("Invalid role".into()))?;

    let (access_token, new_refresh_token, new_claims) =
        issue_token_pair(user_id, &claims.sub, role, &config)?;
    store_refresh_token(pool.get_ref(), &new_claims).await?;

    Ok(HttpResponse::Ok().json(json!({
        "access_token": access_token,
        "refresh_token": new_refresh_token,
    })))
}

pub async fn logout(
    req: HttpRequest,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
) -> HttpResponse {
    // Revoking is idempotent; logout always succeeds.
    if let Some(token) = bearer_token(&req) {
        if let Ok(claims) = verify_token(token, &config.jwt_secret) {
            if claims.token_type == TokenType::Refresh {
                let _ = sqlx::query("UPDATE refresh_tokens SET revoked = 1 WHERE jti = ?")
                    .bind(&claims.jti)
                    .execute(pool.get_ref())
                    .await;
            }
        }
    }

    HttpResponse::NoContent().finish()
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}
