use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::attendance::{AttendancePolicy, AttendanceRow, AttendanceStatus, work_hours};
use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use sqlx::prelude::FromRow;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct AttendanceNote {
    pub notes: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct RecordsQuery {
    /// Maximum number of records to return (default 30)
    pub limit: Option<u32>,
}

#[derive(Deserialize, IntoParams)]
pub struct ReportQuery {
    /// Inclusive range start (YYYY-MM-DD)
    pub start_date: Option<NaiveDate>,
    /// Inclusive range end (YYYY-MM-DD)
    pub end_date: Option<NaiveDate>,
}

/// Check-in endpoint. One record per employee per calendar date; the UNIQUE
/// constraint closes the double check-in race.
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    request_body = AttendanceNote,
    responses(
        (status = 200, description = "Checked in successfully", body = AttendanceRow),
        (status = 409, description = "Already checked in today")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<AttendanceNote>,
) -> Result<HttpResponse, ApiError> {
    let now = Utc::now().naive_utc();
    let today = now.date();
    let status = AttendancePolicy::default().check_in_status(now.time());
    let notes = payload.into_inner().notes;

    let result = sqlx::query(
        r#"
        INSERT INTO attendance (employee_id, date, check_in, status, notes)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(auth.user_id)
    .bind(today)
    .bind(now)
    .bind(status.to_string())
    .bind(&notes)
    .execute(pool.get_ref())
    .await;

    let result = match result {
        Ok(r) => r,
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return Err(ApiError::Conflict("Already checked in today".into()));
                }
            }
            return Err(e.into());
        }
    };

    Ok(HttpResponse::Ok().json(AttendanceRow {
        id: result.last_insert_rowid(),
        employee_id: auth.user_id,
        date: today,
        check_in: Some(now),
        check_out: None,
        work_hours: None,
        status: status.to_string(),
        notes,
    }))
}

/// Check-out endpoint. Computes work hours and derives the final status.
#[utoipa::path(
    post,
    path = "/api/attendance/check-out",
    request_body = AttendanceNote,
    responses(
        (status = 200, description = "Checked out successfully", body = AttendanceRow),
        (status = 409, description = "No check-in today, or already checked out")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<AttendanceNote>,
) -> Result<HttpResponse, ApiError> {
    let now = Utc::now().naive_utc();
    let today = now.date();

    let row = sqlx::query_as::<_, AttendanceRow>(
        r#"
        SELECT id, employee_id, date, check_in, check_out, work_hours, status, notes
        FROM attendance
        WHERE employee_id = ? AND date = ?
        "#,
    )
    .bind(auth.user_id)
    .bind(today)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| ApiError::InvalidState("No check-in found for today".into()))?;

    let check_in_time = row
        .check_in
        .ok_or_else(|| ApiError::InvalidState("No check-in found for today".into()))?;

    if row.check_out.is_some() {
        return Err(ApiError::InvalidState("Already checked out today".into()));
    }

    let hours = work_hours(check_in_time, now);

    let checked_in_as: AttendanceStatus =
        row.status.parse().unwrap_or(AttendanceStatus::Present);
    let status = AttendancePolicy::default().check_out_status(checked_in_as, hours);
    let notes = payload.into_inner().notes.or(row.notes);

    let updated = sqlx::query(
        r#"
        UPDATE attendance
        SET check_out = ?, work_hours = ?, status = ?, notes = ?
        WHERE id = ? AND check_out IS NULL
        "#,
    )
    .bind(now)
    .bind(hours)
    .bind(status.to_string())
    .bind(&notes)
    .bind(row.id)
    .execute(pool.get_ref())
    .await?;

    if updated.rows_affected() == 0 {
        return Err(ApiError::InvalidState("Already checked out today".into()));
    }

    Ok(HttpResponse::Ok().json(AttendanceRow {
        id: row.id,
        employee_id: row.employee_id,
        date: row.date,
        check_in: row.check_in,
        check_out: Some(now),
        work_hours: Some(hours),
        status: status.to_string(),
        notes,
    }))
}

/// Today's attendance state for the dashboard widget.
#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses((status = 200, description = "Today's attendance, or checked_in: false")),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn today(auth: AuthUser, pool: web::Data<SqlitePool>) -> Result<HttpResponse, ApiError> {
    let today = Utc::now().naive_utc().date();

    let row = sqlx::query_as::<_, AttendanceRow>(
        r#"
        SELECT id, employee_id, date, check_in, check_out, work_hours, status, notes
        FROM attendance
        WHERE employee_id = ? AND date = ?
        "#,
    )
    .bind(auth.user_id)
    .bind(today)
    .fetch_optional(pool.get_ref())
    .await?;

    let body = match row {
        None => json!({ "checked_in": false, "date": today }),
        Some(r) => json!({
            "checked_in": true,
            "checked_out": r.check_out.is_some(),
            "date": r.date,
            "check_in": r.check_in,
            "check_out": r.check_out,
            "work_hours": r.work_hours,
            "status": r.status,
        }),
    };

    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    get,
    path = "/api/attendance/my-records",
    params(RecordsQuery),
    responses(
        (status = 200, description = "Caller's attendance records, newest first", body = [AttendanceRow])
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn my_records(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    query: web::Query<RecordsQuery>,
) -> Result<HttpResponse, ApiError> {
    let limit = query.limit.unwrap_or(30).clamp(1, 365);

    let rows = sqlx::query_as::<_, AttendanceRow>(
        r#"
        SELECT id, employee_id, date, check_in, check_out, work_hours, status, notes
        FROM attendance
        WHERE employee_id = ?
        ORDER BY date DESC
        LIMIT ?
        "#,
    )
    .bind(auth.user_id)
    .bind(limit as i64)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(rows))
}

#[derive(FromRow)]
struct AttendanceReportRow {
    employee_name: String,
    date: NaiveDate,
    check_in: Option<NaiveDateTime>,
    check_out: Option<NaiveDateTime>,
    work_hours: Option<f64>,
    status: String,
    notes: Option<String>,
}

/// Attendance report with optional inclusive date range (Manager/Admin).
#[utoipa::path(
    get,
    path = "/api/attendance/report",
    params(ReportQuery),
    responses(
        (status = 200, description = "Attendance report"),
        (status = 403, description = "Manager or Admin access required")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn report(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    query: web::Query<ReportQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.require_manager_or_admin()?;

    let mut sql = String::from(
        r#"
        SELECT u.username AS employee_name, a.date, a.check_in, a.check_out,
               a.work_hours, a.status, a.notes
        FROM attendance a
        JOIN users u ON u.id = a.employee_id
        "#,
    );

    let range = match (query.start_date, query.end_date) {
        (Some(start), Some(end)) => {
            sql.push_str(" WHERE a.date >= ? AND a.date <= ?");
            Some((start, end))
        }
        _ => None,
    };
    sql.push_str(" ORDER BY a.date DESC");

    let mut q = sqlx::query_as::<_, AttendanceReportRow>(&sql);
    if let Some((start, end)) = range {
        q = q.bind(start).bind(end);
    }

    let rows = q.fetch_all(pool.get_ref()).await?;

    let report: Vec<_> = rows
        .into_iter()
        .map(|r| {
            json!({
                "employee_name": r.employee_name,
                "date": r.date,
                "check_in": r.check_in,
                "check_out": r.check_out,
                "work_hours": r.work_hours.unwrap_or(0.0),
                "status": r.status.to_uppercase(),
                "notes": r.notes,
            })
        })
        .collect();

    let total = report.len();

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "report": report,
        "total_records": total
    })))
}
