use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::leave::{
    LeaveDecision, LeaveRequestRow, LeaveStatus, LeaveType, days_count, transition,
};
use crate::model::user::LeaveBalances;
use actix_web::{HttpResponse, web};
use anyhow::anyhow;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use sqlx::prelude::FromRow;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "cl", value_type = String)]
    pub leave_type: LeaveType,
    #[schema(example = "2026-01-10", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-12", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Family function")]
    pub reason: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LeaveAction {
    pub comments: Option<String>,
}

const LIST_COLUMNS: &str = r#"
    lr.id, lr.employee_id, u.username AS employee_name, lr.leave_type,
    lr.start_date, lr.end_date, lr.days_count, lr.reason, lr.status,
    lr.applied_date, lr.reviewed_by, lr.reviewed_date, lr.comments
"#;

/* =========================
Apply for leave
========================= */
#[utoipa::path(
    post,
    path = "/api/leaves/apply",
    request_body = CreateLeave,
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveRequestRow),
        (status = 400, description = "start_date after end_date or invalid leave type"),
        (status = 409, description = "Insufficient balance or overlapping request")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn apply(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<CreateLeave>,
) -> Result<HttpResponse, ApiError> {
    if payload.start_date > payload.end_date {
        return Err(ApiError::Validation(
            "start_date cannot be after end_date".into(),
        ));
    }

    let days = days_count(payload.start_date, payload.end_date);
    let leave_type = payload.leave_type.to_string();

    let balance = sqlx::query_scalar::<_, f64>(
        "SELECT balance FROM leave_balances WHERE user_id = ? AND leave_type = ?",
    )
    .bind(auth.user_id)
    .bind(&leave_type)
    .fetch_optional(pool.get_ref())
    .await?
    .unwrap_or(0.0);

    if balance < days {
        return Err(ApiError::InsufficientBalance(format!(
            "Insufficient {} balance",
            leave_type.to_uppercase()
        )));
    }

    // A range overlapping any still-live request of the same employee is
    // rejected up front rather than at review time.
    let overlaps = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM leave_requests
            WHERE employee_id = ?
              AND status IN ('pending', 'approved')
              AND start_date <= ?
              AND end_date >= ?
        )
        "#,
    )
    .bind(auth.user_id)
    .bind(payload.end_date)
    .bind(payload.start_date)
    .fetch_one(pool.get_ref())
    .await?;

    if overlaps {
        return Err(ApiError::Conflict(
            "Leave dates overlap an existing pending or approved request".into(),
        ));
    }

    let applied_date = Utc::now().naive_utc();

    let result = sqlx::query(
        r#"
        INSERT INTO leave_requests
            (employee_id, leave_type, start_date, end_date, days_count, reason, status, applied_date)
        VALUES (?, ?, ?, ?, ?, ?, 'pending', ?)
        "#,
    )
    .bind(auth.user_id)
    .bind(&leave_type)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(days)
    .bind(&payload.reason)
    .bind(applied_date)
    .execute(pool.get_ref())
    .await?;

    let row = LeaveRequestRow {
        id: result.last_insert_rowid(),
        employee_id: auth.user_id,
        employee_name: auth.username,
        leave_type,
        start_date: payload.start_date,
        end_date: payload.end_date,
        days_count: days,
        reason: payload.reason.clone(),
        status: LeaveStatus::Pending.to_string(),
        applied_date,
        reviewed_by: None,
        reviewed_date: None,
        comments: None,
    };

    Ok(HttpResponse::Created().json(row))
}

/* =========================
My requests / pending queue
========================= */
#[utoipa::path(
    get,
    path = "/api/leaves/my-requests",
    responses(
        (status = 200, description = "Caller's leave requests, newest first", body = [LeaveRequestRow])
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn my_requests(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    let sql = format!(
        r#"
        SELECT {LIST_COLUMNS}
        FROM leave_requests lr
        JOIN users u ON u.id = lr.employee_id
        WHERE lr.employee_id = ?
        ORDER BY lr.applied_date DESC
        "#
    );

    let rows = sqlx::query_as::<_, LeaveRequestRow>(&sql)
        .bind(auth.user_id)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(rows))
}

#[utoipa::path(
    get,
    path = "/api/leaves/pending",
    responses(
        (status = 200, description = "Pending requests, oldest first", body = [LeaveRequestRow]),
        (status = 403, description = "Manager or Admin access required")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn pending(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    auth.require_manager_or_admin()?;

    let sql = format!(
        r#"
        SELECT {LIST_COLUMNS}
        FROM leave_requests lr
        JOIN users u ON u.id = lr.employee_id
        WHERE lr.status = 'pending'
        ORDER BY lr.applied_date ASC
        "#
    );

    let rows = sqlx::query_as::<_, LeaveRequestRow>(&sql)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(rows))
}

/* =========================
Approve / reject (Manager/Admin)
========================= */

/// One code path for both decisions. The approve branch deducts the balance
/// inside the same transaction with a guarded UPDATE, so two concurrent
/// approvals for the same employee/type can never jointly overdraw.
async fn decide(
    pool: &SqlitePool,
    request_id: i64,
    reviewer: &AuthUser,
    decision: LeaveDecision,
    comments: Option<String>,
) -> Result<LeaveStatus, ApiError> {
    reviewer.require_manager_or_admin()?;

    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, (i64, String, String, f64)>(
        "SELECT employee_id, leave_type, status, days_count FROM leave_requests WHERE id = ?",
    )
    .bind(request_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::NotFound("Leave request not found".into()))?;

    let (employee_id, leave_type, status, days) = row;

    let current: LeaveStatus = status
        .parse()
        .map_err(|_| ApiError::Internal(anyhow!("invalid leave status '{}' in database", status)))?;

    let next = transition(current, decision)?;

    if next == LeaveStatus::Approved {
        // Balance may have been depleted by other approvals since the
        // request was filed; re-check at decision time.
        let deducted = sqlx::query(
            r#"
            UPDATE leave_balances
            SET balance = balance - ?
            WHERE user_id = ? AND leave_type = ? AND balance >= ?
            "#,
        )
        .bind(days)
        .bind(employee_id)
        .bind(&leave_type)
        .bind(days)
        .execute(&mut *tx)
        .await?;

        if deducted.rows_affected() == 0 {
            return Err(ApiError::InsufficientBalance(format!(
                "Employee has insufficient {} balance for {} day(s)",
                leave_type.to_uppercase(),
                days
            )));
        }
    }

    let updated = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = ?, reviewed_by = ?, reviewed_date = ?, comments = ?
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(next.to_string())
    .bind(reviewer.user_id)
    .bind(Utc::now().naive_utc())
    .bind(&comments)
    .bind(request_id)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(ApiError::InvalidState(
            "Leave request already processed".into(),
        ));
    }

    tx.commit().await?;

    Ok(next)
}

#[utoipa::path(
    put,
    path = "/api/leaves/{id}/approve",
    params(("id" = i64, Path, description = "Leave request ID")),
    request_body = LeaveAction,
    responses(
        (status = 200, description = "Leave approved successfully"),
        (status = 403, description = "Manager or Admin access required"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Already processed or insufficient balance")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn approve(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    payload: web::Json<LeaveAction>,
) -> Result<HttpResponse, ApiError> {
    let request_id = path.into_inner();

    decide(
        pool.get_ref(),
        request_id,
        &auth,
        LeaveDecision::Approve,
        payload.into_inner().comments,
    )
    .await?;

    tracing::info!(request_id, reviewer = auth.user_id, "Leave approved");

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Leave approved successfully"
    })))
}

#[utoipa::path(
    put,
    path = "/api/leaves/{id}/reject",
    params(("id" = i64, Path, description = "Leave request ID")),
    request_body = LeaveAction,
    responses(
        (status = 200, description = "Leave rejected successfully"),
        (status = 403, description = "Manager or Admin access required"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Already processed")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn reject(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    payload: web::Json<LeaveAction>,
) -> Result<HttpResponse, ApiError> {
    let request_id = path.into_inner();

    decide(
        pool.get_ref(),
        request_id,
        &auth,
        LeaveDecision::Reject,
        payload.into_inner().comments,
    )
    .await?;

    tracing::info!(request_id, reviewer = auth.user_id, "Leave rejected");

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Leave rejected successfully"
    })))
}

/* =========================
Balance / projections
========================= */
#[utoipa::path(
    get,
    path = "/api/leaves/balance",
    responses(
        (status = 200, description = "Caller's leave balances", body = LeaveBalances)
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn balance(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    let rows = sqlx::query_as::<_, (String, f64)>(
        "SELECT leave_type, balance FROM leave_balances WHERE user_id = ?",
    )
    .bind(auth.user_id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(LeaveBalances::from_rows(&rows)))
}

#[derive(FromRow)]
struct CalendarRow {
    id: i64,
    employee_id: i64,
    employee_name: String,
    leave_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    days_count: f64,
}

/// Approved leave only, for scheduling visibility.
#[utoipa::path(
    get,
    path = "/api/leaves/calendar",
    responses((status = 200, description = "Approved leave for the calendar view")),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn calendar(
    _auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    let rows = sqlx::query_as::<_, CalendarRow>(
        r#"
        SELECT lr.id, lr.employee_id, u.username AS employee_name,
               lr.leave_type, lr.start_date, lr.end_date, lr.days_count
        FROM leave_requests lr
        JOIN users u ON u.id = lr.employee_id
        WHERE lr.status = 'approved'
        ORDER BY lr.start_date ASC
        "#,
    )
    .fetch_all(pool.get_ref())
    .await?;

    let calendar: Vec<_> = rows
        .into_iter()
        .map(|r| {
            json!({
                "id": r.id,
                "employee_id": r.employee_id,
                "employee_name": r.employee_name,
                "leave_type": r.leave_type,
                "start_date": r.start_date,
                "end_date": r.end_date,
                "days_count": r.days_count,
            })
        })
        .collect();

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "calendar": calendar
    })))
}

#[derive(FromRow)]
struct ReportRow {
    employee_name: String,
    leave_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    days_count: f64,
    status: String,
    applied_date: NaiveDateTime,
    reviewed_by_name: Option<String>,
    reviewed_date: Option<NaiveDateTime>,
    reason: String,
    comments: Option<String>,
}

/// Full request history with names resolved, for the export view (Admin only).
#[utoipa::path(
    get,
    path = "/api/leaves/report",
    responses(
        (status = 200, description = "All leave requests with resolved names"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn report(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let rows = sqlx::query_as::<_, ReportRow>(
        r#"
        SELECT u.username AS employee_name, lr.leave_type, lr.start_date, lr.end_date,
               lr.days_count, lr.status, lr.applied_date,
               r.username AS reviewed_by_name, lr.reviewed_date, lr.reason, lr.comments
        FROM leave_requests lr
        JOIN users u ON u.id = lr.employee_id
        LEFT JOIN users r ON r.id = lr.reviewed_by
        ORDER BY lr.applied_date DESC
        "#,
    )
    .fetch_all(pool.get_ref())
    .await?;

    let report: Vec<_> = rows
        .into_iter()
        .map(|r| {
            json!({
                "employee_name": r.employee_name,
                "leave_type": r.leave_type.to_uppercase(),
                "start_date": r.start_date,
                "end_date": r.end_date,
                "days_count": r.days_count,
                "status": r.status.to_uppercase(),
                "applied_date": r.applied_date,
                "reviewed_by": r.reviewed_by_name.unwrap_or_else(|| "N/A".into()),
                "reviewed_date": r.reviewed_date,
                "reason": r.reason,
                "comments": r.comments.unwrap_or_else(|| "N/A".into()),
            })
        })
        .collect();

    let total = report.len();

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "report": report,
        "total_requests": total
    })))
}
