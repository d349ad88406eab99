use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

pub async fn init_db(database_url: &str) -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .expect("Failed to connect to database");

    migrate(&pool).await.expect("Failed to create schema");

    pool
}

/// Idempotent schema creation, run once at startup (and by tests against
/// in-memory databases).
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let statements = [
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL,
            role_id INTEGER NOT NULL DEFAULT 3,
            phone TEXT,
            emergency_contact TEXT,
            emergency_phone TEXT,
            address TEXT,
            department TEXT,
            designation TEXT,
            joining_date TEXT,
            date_of_birth TEXT,
            blood_group TEXT,
            skills TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            last_login_at TEXT
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS leave_balances (
            user_id INTEGER NOT NULL,
            leave_type TEXT NOT NULL,
            balance REAL NOT NULL CHECK (balance >= 0),
            PRIMARY KEY (user_id, leave_type)
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS leave_requests (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            employee_id INTEGER NOT NULL,
            leave_type TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            days_count REAL NOT NULL,
            reason TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            applied_date TEXT NOT NULL,
            reviewed_by INTEGER,
            reviewed_date TEXT,
            comments TEXT
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS attendance (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            employee_id INTEGER NOT NULL,
            date TEXT NOT NULL,
            check_in TEXT,
            check_out TEXT,
            work_hours REAL,
            status TEXT NOT NULL,
            notes TEXT,
            UNIQUE (employee_id, date)
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS announcements (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            priority TEXT NOT NULL DEFAULT 'normal',
            target_roles TEXT,
            created_by INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS refresh_tokens (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            jti TEXT NOT NULL UNIQUE,
            expires_at TEXT NOT NULL,
            revoked INTEGER NOT NULL DEFAULT 0
        )
        "#,
        "CREATE INDEX IF NOT EXISTS idx_leave_requests_employee ON leave_requests (employee_id)",
        "CREATE INDEX IF NOT EXISTS idx_leave_requests_status ON leave_requests (status)",
        "CREATE INDEX IF NOT EXISTS idx_attendance_employee ON attendance (employee_id, date)",
    ];

    for statement in statements {
        sqlx::query(statement).execute(pool).await?;
    }

    Ok(())
}
