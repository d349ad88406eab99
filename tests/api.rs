//! End-to-end API tests against an in-memory SQLite database.
//!
//! The identity filter/cache are process-wide, so every test uses its own
//! unique usernames.

use actix_web::http::StatusCode;
use actix_web::{App, test, web::Data};
use chrono::{Duration, Utc};
use hris::{config::Config, db, routes};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".into(),
        jwt_secret: "test-secret".into(),
        server_addr: "127.0.0.1:0".into(),
        access_token_ttl: 900,
        refresh_token_ttl: 3600,
        rate_login_per_min: 10_000,
        rate_register_per_min: 10_000,
        rate_refresh_per_min: 10_000,
        rate_protected_per_min: 10_000,
        api_prefix: "/api".into(),
    }
}

async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    db::migrate(&pool).await.expect("schema");
    pool
}

macro_rules! init_app {
    ($pool:expr, $cfg:expr) => {
        test::init_service(
            App::new()
                .app_data(Data::new($pool.clone()))
                .app_data(Data::new($cfg.clone()))
                .configure(|c| routes::configure(c, $cfg.clone())),
        )
        .await
    };
}

macro_rules! send {
    ($app:expr, $req:expr) => {{
        test::call_service($app, $req.peer_addr("127.0.0.1:9000".parse().unwrap()).to_request())
            .await
    }};
}

macro_rules! get {
    ($app:expr, $token:expr, $uri:expr) => {{
        send!(
            $app,
            test::TestRequest::get()
                .uri($uri)
                .insert_header(("Authorization", format!("Bearer {}", $token)))
        )
    }};
}

macro_rules! post {
    ($app:expr, $token:expr, $uri:expr, $body:expr) => {{
        send!(
            $app,
            test::TestRequest::post()
                .uri($uri)
                .insert_header(("Authorization", format!("Bearer {}", $token)))
                .set_json($body)
        )
    }};
}

macro_rules! put {
    ($app:expr, $token:expr, $uri:expr, $body:expr) => {{
        send!(
            $app,
            test::TestRequest::put()
                .uri($uri)
                .insert_header(("Authorization", format!("Bearer {}", $token)))
                .set_json($body)
        )
    }};
}

macro_rules! delete {
    ($app:expr, $token:expr, $uri:expr) => {{
        send!(
            $app,
            test::TestRequest::delete()
                .uri($uri)
                .insert_header(("Authorization", format!("Bearer {}", $token)))
        )
    }};
}

/// Registers a user and returns (access_token, refresh_token, user_id).
macro_rules! register {
    ($app:expr, $username:expr, $role:expr) => {{
        let resp = send!(
            $app,
            test::TestRequest::post()
                .uri("/api/auth/register")
                .set_json(json!({
                    "username": $username,
                    "email": format!("{}@test.io", $username),
                    "password": "pass1234",
                    "role": $role,
                }))
        );
        assert_eq!(resp.status(), StatusCode::CREATED, "registration failed");
        let body: Value = test::read_body_json(resp).await;
        (
            body["access_token"].as_str().unwrap().to_string(),
            body["refresh_token"].as_str().unwrap().to_string(),
            body["user"]["id"].as_i64().unwrap(),
        )
    }};
}

async fn body_json(resp: actix_web::dev::ServiceResponse) -> Value {
    test::read_body_json(resp).await
}

#[actix_web::test]
async fn register_seeds_default_balances() {
    let (pool, cfg) = (test_pool().await, test_config());
    let app = init_app!(pool, cfg);

    let (token, _, _) = register!(&app, "reg_emp1", "employee");

    let resp = get!(&app, token, "/api/auth/me");
    assert_eq!(resp.status(), StatusCode::OK);
    let me = body_json(resp).await;
    assert_eq!(me["username"], "reg_emp1");
    assert_eq!(me["role"], "employee");
    assert_eq!(me["leave_balances"]["cl"], 12.0);
    assert_eq!(me["leave_balances"]["el"], 15.0);
    assert_eq!(me["leave_balances"]["compensatory"], 0.0);
}

#[actix_web::test]
async fn duplicate_username_is_rejected() {
    let (pool, cfg) = (test_pool().await, test_config());
    let app = init_app!(pool, cfg);

    register!(&app, "dup_user", "employee");

    let resp = send!(
        &app,
        test::TestRequest::post().uri("/api/auth/register").set_json(json!({
            "username": "dup_user",
            "email": "other@test.io",
            "password": "pass1234",
            "role": "employee",
        }))
    );
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn me_requires_token() {
    let (pool, cfg) = (test_pool().await, test_config());
    let app = init_app!(pool, cfg);

    let resp = send!(&app, test::TestRequest::get().uri("/api/auth/me"));
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn apply_creates_pending_request_with_inclusive_day_count() {
    let (pool, cfg) = (test_pool().await, test_config());
    let app = init_app!(pool, cfg);

    let (token, _, _) = register!(&app, "apply_emp1", "employee");

    let resp = post!(&app, token, "/api/leaves/apply", json!({
        "leave_type": "cl",
        "start_date": "2024-01-10",
        "end_date": "2024-01-12",
        "reason": "family function",
    }));
    assert_eq!(resp.status(), StatusCode::CREATED);
    let leave = body_json(resp).await;
    assert_eq!(leave["days_count"], 3.0);
    assert_eq!(leave["status"], "pending");
    assert_eq!(leave["employee_name"], "apply_emp1");

    let resp = get!(&app, token, "/api/leaves/my-requests");
    assert_eq!(resp.status(), StatusCode::OK);
    let mine = body_json(resp).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn apply_rejects_inverted_date_range() {
    let (pool, cfg) = (test_pool().await, test_config());
    let app = init_app!(pool, cfg);

    let (token, _, _) = register!(&app, "apply_emp2", "employee");

    let resp = post!(&app, token, "/api/leaves/apply", json!({
        "leave_type": "cl",
        "start_date": "2024-01-12",
        "end_date": "2024-01-10",
        "reason": "oops",
    }));
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn apply_beyond_balance_fails_and_balance_is_unchanged() {
    let (pool, cfg) = (test_pool().await, test_config());
    let app = init_app!(pool, cfg);

    let (admin, _, _) = register!(&app, "bal_admin1", "admin");
    let (emp, _, emp_id) = register!(&app, "bal_emp1", "employee");

    let resp = put!(&app, admin, &format!("/api/users/{}/leave-balance", emp_id), json!({
        "leave_type": "cl",
        "balance": 5.0,
    }));
    assert_eq!(resp.status(), StatusCode::OK);

    // 10 inclusive days against a balance of 5
    let resp = post!(&app, emp, "/api/leaves/apply", json!({
        "leave_type": "cl",
        "start_date": "2024-02-01",
        "end_date": "2024-02-10",
        "reason": "long trip",
    }));
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = get!(&app, emp, "/api/leaves/balance");
    let balances = body_json(resp).await;
    assert_eq!(balances["cl"], 5.0);
}

#[actix_web::test]
async fn approve_deducts_exactly_once_and_terminal_state_is_immutable() {
    let (pool, cfg) = (test_pool().await, test_config());
    let app = init_app!(pool, cfg);

    let (manager, _, _) = register!(&app, "appr_mgr1", "manager");
    let (emp, _, _) = register!(&app, "appr_emp1", "employee");

    let resp = post!(&app, emp, "/api/leaves/apply", json!({
        "leave_type": "cl",
        "start_date": "2024-03-04",
        "end_date": "2024-03-06",
        "reason": "trip",
    }));
    let leave = body_json(resp).await;
    let leave_id = leave["id"].as_i64().unwrap();

    // Visible in the pending queue
    let resp = get!(&app, manager, "/api/leaves/pending");
    assert_eq!(resp.status(), StatusCode::OK);
    let pending = body_json(resp).await;
    assert_eq!(pending.as_array().unwrap().len(), 1);

    let resp = put!(&app, manager, &format!("/api/leaves/{}/approve", leave_id), json!({
        "comments": "enjoy",
    }));
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = get!(&app, emp, "/api/leaves/balance");
    let balances = body_json(resp).await;
    assert_eq!(balances["cl"], 9.0); // 12 - 3

    // Second decision must fail without a second deduction
    let resp = put!(&app, manager, &format!("/api/leaves/{}/approve", leave_id), json!({
        "comments": "again",
    }));
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let resp = put!(&app, manager, &format!("/api/leaves/{}/reject", leave_id), json!({
        "comments": "flip",
    }));
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = get!(&app, emp, "/api/leaves/balance");
    let balances = body_json(resp).await;
    assert_eq!(balances["cl"], 9.0);

    let resp = get!(&app, emp, "/api/leaves/my-requests");
    let mine = body_json(resp).await;
    assert_eq!(mine[0]["status"], "approved");
    assert_eq!(mine[0]["comments"], "enjoy");
}

#[actix_web::test]
async fn reject_never_touches_balance() {
    let (pool, cfg) = (test_pool().await, test_config());
    let app = init_app!(pool, cfg);

    let (manager, _, _) = register!(&app, "rej_mgr1", "manager");
    let (emp, _, _) = register!(&app, "rej_emp1", "employee");

    let resp = post!(&app, emp, "/api/leaves/apply", json!({
        "leave_type": "sl",
        "start_date": "2024-04-01",
        "end_date": "2024-04-02",
        "reason": "sick",
    }));
    let leave_id = body_json(resp).await["id"].as_i64().unwrap();

    let resp = put!(&app, manager, &format!("/api/leaves/{}/reject", leave_id), json!({
        "comments": "need you here",
    }));
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = get!(&app, emp, "/api/leaves/balance");
    let balances = body_json(resp).await;
    assert_eq!(balances["sl"], 10.0);

    let resp = get!(&app, emp, "/api/leaves/my-requests");
    let mine = body_json(resp).await;
    assert_eq!(mine[0]["status"], "rejected");
}

#[actix_web::test]
async fn combined_approvals_cannot_overdraw_balance() {
    let (pool, cfg) = (test_pool().await, test_config());
    let app = init_app!(pool, cfg);

    let (admin, _, _) = register!(&app, "ovr_admin1", "admin");
    let (emp, _, emp_id) = register!(&app, "ovr_emp1", "employee");

    let resp = put!(&app, admin, &format!("/api/users/{}/leave-balance", emp_id), json!({
        "leave_type": "cl",
        "balance": 5.0,
    }));
    assert_eq!(resp.status(), StatusCode::OK);

    // Two non-overlapping 3-day requests: each passes the apply-time check
    // against balance 5, but only one can be approved.
    let resp = post!(&app, emp, "/api/leaves/apply", json!({
        "leave_type": "cl",
        "start_date": "2024-05-06",
        "end_date": "2024-05-08",
        "reason": "first",
    }));
    let first_id = body_json(resp).await["id"].as_i64().unwrap();

    let resp = post!(&app, emp, "/api/leaves/apply", json!({
        "leave_type": "cl",
        "start_date": "2024-06-03",
        "end_date": "2024-06-05",
        "reason": "second",
    }));
    let second_id = body_json(resp).await["id"].as_i64().unwrap();

    let resp = put!(&app, admin, &format!("/api/leaves/{}/approve", first_id), json!({
        "comments": null,
    }));
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = put!(&app, admin, &format!("/api/leaves/{}/approve", second_id), json!({
        "comments": null,
    }));
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = get!(&app, emp, "/api/leaves/balance");
    let balances = body_json(resp).await;
    assert_eq!(balances["cl"], 2.0);

    // The starved request is still pending and can be rejected instead
    let resp = put!(&app, admin, &format!("/api/leaves/{}/reject", second_id), json!({
        "comments": "not enough balance left",
    }));
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn overlapping_leave_ranges_conflict() {
    let (pool, cfg) = (test_pool().await, test_config());
    let app = init_app!(pool, cfg);

    let (emp, _, _) = register!(&app, "ovl_emp1", "employee");

    let resp = post!(&app, emp, "/api/leaves/apply", json!({
        "leave_type": "cl",
        "start_date": "2024-07-10",
        "end_date": "2024-07-12",
        "reason": "first",
    }));
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = post!(&app, emp, "/api/leaves/apply", json!({
        "leave_type": "el",
        "start_date": "2024-07-12",
        "end_date": "2024-07-15",
        "reason": "overlaps by one day",
    }));
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // Adjacent but disjoint range is fine
    let resp = post!(&app, emp, "/api/leaves/apply", json!({
        "leave_type": "el",
        "start_date": "2024-07-13",
        "end_date": "2024-07-15",
        "reason": "right after",
    }));
    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[actix_web::test]
async fn role_gates_are_enforced() {
    let (pool, cfg) = (test_pool().await, test_config());
    let app = init_app!(pool, cfg);

    let (emp, _, emp_id) = register!(&app, "gate_emp1", "employee");

    let resp = get!(&app, emp, "/api/users");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = put!(&app, emp, &format!("/api/users/{}/role", emp_id), json!({
        "role": "admin",
    }));
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = get!(&app, emp, "/api/leaves/pending");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = get!(&app, emp, "/api/leaves/report");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = post!(&app, emp, "/api/announcements", json!({
        "title": "nope",
        "content": "nope",
        "priority": "low",
        "target_roles": null,
    }));
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn admin_updates_role_and_balance() {
    let (pool, cfg) = (test_pool().await, test_config());
    let app = init_app!(pool, cfg);

    let (admin, _, _) = register!(&app, "role_admin1", "admin");
    let (_, _, emp_id) = register!(&app, "role_emp1", "employee");

    let resp = put!(&app, admin, &format!("/api/users/{}/role", emp_id), json!({
        "role": "manager",
    }));
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = get!(&app, admin, "/api/users");
    let users = body_json(resp).await;
    let promoted = users
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["id"] == emp_id)
        .unwrap();
    assert_eq!(promoted["role"], "manager");

    // Negative balance is a validation error
    let resp = put!(&app, admin, &format!("/api/users/{}/leave-balance", emp_id), json!({
        "leave_type": "cl",
        "balance": -1.0,
    }));
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Unknown user is a 404
    let resp = put!(&app, admin, "/api/users/999999/leave-balance", json!({
        "leave_type": "cl",
        "balance": 3.0,
    }));
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = put!(&app, admin, "/api/users/999999/role", json!({ "role": "manager" }));
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn attendance_check_in_out_lifecycle() {
    let (pool, cfg) = (test_pool().await, test_config());
    let app = init_app!(pool, cfg);

    let (emp, _, emp_id) = register!(&app, "att_emp1", "employee");

    let resp = post!(&app, emp, "/api/attendance/check-in", json!({ "notes": "morning" }));
    assert_eq!(resp.status(), StatusCode::OK);
    let record = body_json(resp).await;
    assert!(record["check_in"].is_string());
    assert!(record["check_out"].is_null());

    // Double check-in the same day
    let resp = post!(&app, emp, "/api/attendance/check-in", json!({ "notes": null }));
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = get!(&app, emp, "/api/attendance/today");
    let today = body_json(resp).await;
    assert_eq!(today["checked_in"], true);
    assert_eq!(today["checked_out"], false);

    // Backdate the check-in so the derived work hours are deterministic:
    // 3h30m ago rounds to 3.5, which is below the half-day threshold.
    let backdated = Utc::now().naive_utc() - Duration::hours(3) - Duration::minutes(30);
    sqlx::query("UPDATE attendance SET check_in = ?, status = 'present' WHERE employee_id = ?")
        .bind(backdated)
        .bind(emp_id)
        .execute(&pool)
        .await
        .unwrap();

    let resp = post!(&app, emp, "/api/attendance/check-out", json!({ "notes": null }));
    assert_eq!(resp.status(), StatusCode::OK);
    let record = body_json(resp).await;
    assert_eq!(record["work_hours"], 3.5);
    assert_eq!(record["status"], "half_day");

    // Double check-out
    let resp = post!(&app, emp, "/api/attendance/check-out", json!({ "notes": null }));
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = get!(&app, emp, "/api/attendance/my-records?limit=10");
    let records = body_json(resp).await;
    assert_eq!(records.as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn check_out_without_check_in_is_invalid() {
    let (pool, cfg) = (test_pool().await, test_config());
    let app = init_app!(pool, cfg);

    let (emp, _, _) = register!(&app, "att_emp2", "employee");

    let resp = post!(&app, emp, "/api/attendance/check-out", json!({ "notes": null }));
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn announcements_respect_role_targeting() {
    let (pool, cfg) = (test_pool().await, test_config());
    let app = init_app!(pool, cfg);

    let (admin, _, _) = register!(&app, "ann_admin1", "admin");
    let (manager, _, _) = register!(&app, "ann_mgr1", "manager");
    let (emp, _, _) = register!(&app, "ann_emp1", "employee");

    let resp = post!(&app, admin, "/api/announcements", json!({
        "title": "All hands",
        "content": "Friday 3pm",
        "priority": "normal",
        "target_roles": null,
    }));
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = post!(&app, admin, "/api/announcements", json!({
        "title": "Manager sync",
        "content": "Monday 10am",
        "priority": "high",
        "target_roles": ["manager"],
    }));
    assert_eq!(resp.status(), StatusCode::CREATED);
    let targeted_id = body_json(resp).await["id"].as_i64().unwrap();

    let resp = get!(&app, emp, "/api/announcements");
    let visible = body_json(resp).await;
    assert_eq!(visible.as_array().unwrap().len(), 1);
    assert_eq!(visible[0]["title"], "All hands");

    let resp = get!(&app, manager, "/api/announcements");
    let visible = body_json(resp).await;
    assert_eq!(visible.as_array().unwrap().len(), 2);
    // Newest first
    assert_eq!(visible[0]["title"], "Manager sync");

    let resp = delete!(&app, admin, &format!("/api/announcements/{}", targeted_id));
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = get!(&app, manager, "/api/announcements");
    let visible = body_json(resp).await;
    assert_eq!(visible.as_array().unwrap().len(), 1);

    let resp = delete!(&app, admin, "/api/announcements/999999");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn empty_target_list_means_all_roles() {
    let (pool, cfg) = (test_pool().await, test_config());
    let app = init_app!(pool, cfg);

    let (admin, _, _) = register!(&app, "ann_admin2", "admin");
    let (emp, _, _) = register!(&app, "ann_emp2", "employee");

    let resp = post!(&app, admin, "/api/announcements", json!({
        "title": "For everyone",
        "content": "An empty target list is not a valid restriction",
        "priority": "low",
        "target_roles": [],
    }));
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert!(body_json(resp).await["target_roles"].is_null());

    let resp = get!(&app, emp, "/api/announcements");
    let visible = body_json(resp).await;
    assert_eq!(visible.as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn leave_report_and_calendar_projections() {
    let (pool, cfg) = (test_pool().await, test_config());
    let app = init_app!(pool, cfg);

    let (admin, _, _) = register!(&app, "rep_admin1", "admin");
    let (emp, _, _) = register!(&app, "rep_emp1", "employee");

    let resp = post!(&app, emp, "/api/leaves/apply", json!({
        "leave_type": "cl",
        "start_date": "2024-08-05",
        "end_date": "2024-08-06",
        "reason": "approved one",
    }));
    let first_id = body_json(resp).await["id"].as_i64().unwrap();

    let resp = post!(&app, emp, "/api/leaves/apply", json!({
        "leave_type": "sl",
        "start_date": "2024-09-02",
        "end_date": "2024-09-02",
        "reason": "pending one",
    }));
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = put!(&app, admin, &format!("/api/leaves/{}/approve", first_id), json!({
        "comments": "ok",
    }));
    assert_eq!(resp.status(), StatusCode::OK);

    // Calendar shows approved requests only, to any authenticated user
    let resp = get!(&app, emp, "/api/leaves/calendar");
    assert_eq!(resp.status(), StatusCode::OK);
    let calendar = body_json(resp).await;
    assert_eq!(calendar["calendar"].as_array().unwrap().len(), 1);
    assert_eq!(calendar["calendar"][0]["employee_name"], "rep_emp1");

    // Report shows everything, with names resolved and upper-cased codes
    let resp = get!(&app, admin, "/api/leaves/report");
    assert_eq!(resp.status(), StatusCode::OK);
    let report = body_json(resp).await;
    assert_eq!(report["total_requests"], 2);
    let entries = report["report"].as_array().unwrap();
    assert_eq!(entries[0]["status"], "PENDING"); // newest first
    assert_eq!(entries[1]["status"], "APPROVED");
    assert_eq!(entries[1]["reviewed_by"], "rep_admin1");
}

#[actix_web::test]
async fn profile_read_and_partial_update() {
    let (pool, cfg) = (test_pool().await, test_config());
    let app = init_app!(pool, cfg);

    let (emp, _, _) = register!(&app, "prof_emp1", "employee");

    let resp = get!(&app, emp, "/api/profile");
    assert_eq!(resp.status(), StatusCode::OK);
    let profile = body_json(resp).await;
    assert_eq!(profile["username"], "prof_emp1");
    assert!(profile["phone"].is_null());

    let resp = put!(&app, emp, "/api/profile", json!({
        "phone": "+358-40-1234567",
        "department": "Engineering",
    }));
    assert_eq!(resp.status(), StatusCode::OK);
    let profile = body_json(resp).await;
    assert_eq!(profile["phone"], "+358-40-1234567");
    assert_eq!(profile["department"], "Engineering");

    // Fields outside the allow-list are rejected
    let resp = put!(&app, emp, "/api/profile", json!({ "role_id": 1 }));
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn refresh_token_rotation() {
    let (pool, cfg) = (test_pool().await, test_config());
    let app = init_app!(pool, cfg);

    let (_, refresh, _) = register!(&app, "tok_emp1", "employee");

    let resp = send!(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/refresh")
            .insert_header(("Authorization", format!("Bearer {}", refresh)))
    );
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert!(body["access_token"].is_string());
    assert!(body["refresh_token"].is_string());

    // The spent refresh token cannot be replayed
    let resp = send!(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/refresh")
            .insert_header(("Authorization", format!("Bearer {}", refresh)))
    );
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // An access token is not accepted as a refresh token
    let new_access = body["access_token"].as_str().unwrap().to_string();
    let resp = send!(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/refresh")
            .insert_header(("Authorization", format!("Bearer {}", new_access)))
    );
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
