pub mod models;
pub mod operations;
pub mod schema;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
    SqliteSynchronous,
};
use std::str::FromStr;
use std::time::Duration;

use schema::TABLES;

pub const DEFAULT_DB_PATH: &str = "fitlog.db";

pub async fn connect(db_path: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(db_path.trim_start_matches("sqlite://"))
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(5));
    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open database at {}", db_path))?;
    info!("Opened database {}", db_path);
    Ok(pool)
}

/// A private in-memory database. Every pooled connection would get its own
/// empty database, so the pool is pinned to one connection that never expires.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .context("Failed to open in-memory database")?;
    debug!("Opened in-memory database");
    Ok(pool)
}

/// Delete every row of every content table and reset the AUTOINCREMENT
/// counters. Runs on the caller's connection so it can join a transaction.
pub async fn drop_all_tables(conn: &mut SqliteConnection) -> Result<()> {
    for table in TABLES.iter().rev() {
        sqlx::query(&format!("DELETE FROM {}", table.name))
            .execute(&mut *conn)
            .await
            .with_context(|| format!("Failed to clear {}", table.name))?;
    }
    if table_exists(conn, "sqlite_sequence").await? {
        for table in TABLES {
            sqlx::query("DELETE FROM sqlite_sequence WHERE name = ?1")
                .bind(table.name)
                .execute(&mut *conn)
                .await?;
        }
    }
    Ok(())
}

enum Step {
    CreateTable(&'static str),
    AddColumn {
        table: &'static str,
        column: &'static str,
    },
    CreateIndex {
        name: &'static str,
        sql: &'static str,
    },
}

struct Migration {
    name: &'static str,
    steps: &'static [Step],
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        name: "0001_create_tables",
        steps: &[
            Step::CreateTable("exercises"),
            Step::CreateTable("workouts"),
            Step::CreateTable("workout_exercises"),
            Step::CreateTable("history"),
            Step::CreateTable("measurements"),
            Step::CreateTable("workout_plans"),
            Step::CreateTable("plan_sections"),
            Step::CreateTable("plan_exercises"),
        ],
    },
    Migration {
        name: "0002_workout_schedule",
        steps: &[
            Step::AddColumn { table: "workouts", column: "scheduled_date" },
            Step::AddColumn { table: "workouts", column: "status" },
        ],
    },
    Migration {
        name: "0003_session_exercise_progress",
        steps: &[
            Step::AddColumn { table: "workout_exercises", column: "set_count" },
            Step::AddColumn { table: "workout_exercises", column: "is_completed" },
        ],
    },
    Migration {
        name: "0004_history_archive",
        steps: &[
            Step::AddColumn { table: "history", column: "workout_date" },
            Step::AddColumn { table: "history", column: "exercise_name" },
            Step::AddColumn { table: "history", column: "muscle_group" },
            Step::AddColumn { table: "history", column: "weight" },
            Step::AddColumn { table: "history", column: "reps" },
            Step::AddColumn { table: "history", column: "sets" },
            Step::AddColumn { table: "history", column: "notes" },
        ],
    },
    Migration {
        name: "0005_exercise_default_hints",
        steps: &[
            Step::AddColumn { table: "exercises", column: "default_sets" },
            Step::AddColumn { table: "exercises", column: "default_reps" },
        ],
    },
    Migration {
        name: "0006_lookup_indexes",
        steps: &[
            Step::CreateIndex {
                name: "idx_workouts_scheduled_date",
                sql: "CREATE INDEX IF NOT EXISTS idx_workouts_scheduled_date ON workouts(scheduled_date)",
            },
            Step::CreateIndex {
                name: "idx_workout_exercises_link",
                sql: "CREATE INDEX IF NOT EXISTS idx_workout_exercises_link ON workout_exercises(workout_id, exercise_id)",
            },
            Step::CreateIndex {
                name: "idx_history_date_name",
                sql: "CREATE INDEX IF NOT EXISTS idx_history_date_name ON history(workout_date, exercise_name)",
            },
            Step::CreateIndex {
                name: "idx_measurements_date",
                sql: "CREATE INDEX IF NOT EXISTS idx_measurements_date ON measurements(date)",
            },
        ],
    },
];

/// Outcome of one [`init_database`] run.
#[derive(Debug, Default, Clone)]
pub struct SchemaReport {
    pub applied: Vec<String>,
    pub skipped: Vec<String>,
    /// `(migration, error)` for every step that failed.
    pub failed: Vec<(String, String)>,
}

impl SchemaReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

async fn init_migrations_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS _migrations (
            id INTEGER NOT NULL PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at INTEGER NOT NULL DEFAULT (CAST(strftime('%s','now') AS INTEGER))
        )",
    )
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn is_migration_applied(conn: &mut SqliteConnection, migration_name: &str) -> Result<bool> {
    let result =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _migrations WHERE name = ?1")
            .bind(migration_name)
            .fetch_one(&mut *conn)
            .await?;
    Ok(result > 0)
}

async fn mark_migration_applied(conn: &mut SqliteConnection, migration_name: &str) -> Result<()> {
    sqlx::query("INSERT INTO _migrations (name) VALUES (?1)")
        .bind(migration_name)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn table_exists(conn: &mut SqliteConnection, table: &str) -> Result<bool> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
    )
    .bind(table)
    .fetch_one(&mut *conn)
    .await?;
    Ok(count > 0)
}

pub async fn column_exists(conn: &mut SqliteConnection, table: &str, column: &str) -> Result<bool> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2",
    )
    .bind(table)
    .bind(column)
    .fetch_one(&mut *conn)
    .await?;
    Ok(count > 0)
}

async fn index_exists(conn: &mut SqliteConnection, index: &str) -> Result<bool> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = ?1",
    )
    .bind(index)
    .fetch_one(&mut *conn)
    .await?;
    Ok(count > 0)
}

/// Applies one step. `Ok(false)` means the change was already in place.
async fn apply_step(conn: &mut SqliteConnection, step: &Step) -> Result<bool> {
    match step {
        Step::CreateTable(name) => {
            if table_exists(conn, name).await? {
                return Ok(false);
            }
            let table = schema::table(name)
                .ok_or_else(|| anyhow::anyhow!("Unknown table {}", name))?;
            sqlx::query(&table.create_sql()).execute(&mut *conn).await?;
            Ok(true)
        }
        Step::AddColumn { table, column } => {
            if column_exists(conn, table, column).await? {
                return Ok(false);
            }
            let decl = schema::table(table)
                .and_then(|t| t.column(column))
                .map(|c| c.decl)
                .ok_or_else(|| anyhow::anyhow!("Unknown column {}.{}", table, column))?;
            sqlx::query(&format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, decl))
                .execute(&mut *conn)
                .await?;
            Ok(true)
        }
        Step::CreateIndex { name, sql } => {
            if index_exists(conn, name).await? {
                return Ok(false);
            }
            sqlx::query(sql).execute(&mut *conn).await?;
            Ok(true)
        }
    }
}

/// Bring the schema up to date. Each step is checked and applied on its own;
/// a failing step is reported and the remaining steps still run. A migration
/// with a failed step is not recorded, so it is retried on the next start.
pub async fn init_database(conn: &mut SqliteConnection) -> Result<SchemaReport> {
    init_migrations_table(conn).await?;
    let mut report = SchemaReport::default();

    for migration in MIGRATIONS {
        if is_migration_applied(conn, migration.name).await? {
            debug!("Migration {} already applied, skipping", migration.name);
            report.skipped.push(migration.name.to_string());
            continue;
        }

        info!("Applying migration: {}", migration.name);
        let mut failed = false;
        for step in migration.steps {
            match apply_step(conn, step).await {
                Ok(true) => {}
                Ok(false) => debug!("Migration {}: step already in place", migration.name),
                Err(e) => {
                    warn!("Migration {} step failed: {:#}", migration.name, e);
                    report
                        .failed
                        .push((migration.name.to_string(), format!("{:#}", e)));
                    failed = true;
                }
            }
        }

        if failed {
            continue;
        }
        mark_migration_applied(conn, migration.name).await?;
        report.applied.push(migration.name.to_string());
        info!("Migration {} applied successfully", migration.name);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn init_database_is_idempotent() {
        let pool = connect_in_memory().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let first = init_database(&mut conn).await.unwrap();
        assert!(first.is_clean());
        assert_eq!(first.applied.len(), MIGRATIONS.len());

        let second = init_database(&mut conn).await.unwrap();
        assert!(second.applied.is_empty());
        assert_eq!(second.skipped.len(), MIGRATIONS.len());

        for table in TABLES {
            assert!(table_exists(&mut conn, table.name).await.unwrap());
        }
    }

    #[tokio::test]
    async fn upgrades_legacy_tables_without_losing_rows() {
        let pool = connect_in_memory().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        sqlx::query("CREATE TABLE history (id INTEGER PRIMARY KEY AUTOINCREMENT, workout_date TEXT)")
            .execute(&mut *conn)
            .await
            .unwrap();
        sqlx::query("CREATE TABLE workouts (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL)")
            .execute(&mut *conn)
            .await
            .unwrap();
        sqlx::query("INSERT INTO history (workout_date) VALUES ('2024-01-01')")
            .execute(&mut *conn)
            .await
            .unwrap();

        let report = init_database(&mut conn).await.unwrap();
        assert!(report.is_clean(), "{:?}", report.failed);

        for column in ["exercise_name", "muscle_group", "weight", "reps", "sets", "notes"] {
            assert!(column_exists(&mut conn, "history", column).await.unwrap());
        }
        assert!(column_exists(&mut conn, "workouts", "status").await.unwrap());

        let kept: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM history")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(kept, 1);
    }

    #[tokio::test]
    async fn failing_step_does_not_block_later_migrations() {
        let pool = connect_in_memory().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        // A view squatting on the table name makes CREATE TABLE fail.
        sqlx::query("CREATE VIEW measurements AS SELECT 1 AS id")
            .execute(&mut *conn)
            .await
            .unwrap();

        let report = init_database(&mut conn).await.unwrap();
        assert!(!report.is_clean());
        assert!(report.failed.iter().any(|(name, _)| name == "0001_create_tables"));
        assert!(report.applied.contains(&"0004_history_archive".to_string()));
        assert!(table_exists(&mut conn, "plan_exercises").await.unwrap());
        assert!(!is_migration_applied(&mut conn, "0001_create_tables").await.unwrap());
    }

    #[tokio::test]
    async fn drop_all_tables_clears_rows() {
        let pool = connect_in_memory().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        init_database(&mut conn).await.unwrap();

        sqlx::query("INSERT INTO exercises (name) VALUES ('Squat')")
            .execute(&mut *conn)
            .await
            .unwrap();
        drop_all_tables(&mut conn).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM exercises")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
