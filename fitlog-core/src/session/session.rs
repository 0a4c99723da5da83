use crate::db::{self, SchemaReport};
use anyhow::Result;
use log::{info, warn};
use sqlx::SqlitePool;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::Sqlite;
use tokio::sync::{Mutex, MutexGuard};

/// Handle on one workout database. Every engine operation is a method on it.
///
/// Writes are serialised through `write_lock` and run their multi-statement
/// sequences in a transaction, so no caller ever observes a half-finished
/// find-or-create or delete-then-insert.
#[cfg_attr(feature = "uniffi", derive(uniffi::Object))]
pub struct Session {
    pub db_pool: SqlitePool,
    write_lock: Mutex<()>,
}

impl Session {
    /// Open (creating if missing) the database at `db_path` and bring its
    /// schema up to date.
    pub async fn new(db_path: &str) -> Result<Self> {
        let pool = db::connect(db_path).await?;
        Self::with_pool(pool).await
    }

    /// A throwaway in-memory database with the full schema.
    pub async fn in_memory() -> Result<Self> {
        let pool = db::connect_in_memory().await?;
        Self::with_pool(pool).await
    }

    pub async fn with_pool(pool: SqlitePool) -> Result<Self> {
        let session = Self {
            db_pool: pool,
            write_lock: Mutex::new(()),
        };
        let report = session.ensure_schema().await?;
        info!(
            "Schema ready: {} applied, {} already present",
            report.applied.len(),
            report.skipped.len()
        );
        Ok(session)
    }

    /// Create missing tables and columns. Failed steps are reported, not fatal.
    pub async fn ensure_schema(&self) -> Result<SchemaReport> {
        let _writer = self.writer().await;
        let mut conn = self.conn().await?;
        let report = db::init_database(&mut conn).await?;
        for (migration, error) in &report.failed {
            warn!("Schema migration {} incomplete: {}", migration, error);
        }
        Ok(report)
    }

    pub(crate) async fn conn(&self) -> Result<PoolConnection<Sqlite>> {
        Ok(self.db_pool.acquire().await?)
    }

    pub(crate) async fn writer(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }
}
