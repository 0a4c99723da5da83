//! Whole-database snapshots.
//!
//! A snapshot is one JSON document holding every row of every table, keyed
//! by table name. Import is all or nothing: the document is checked first,
//! then the tables are cleared and refilled inside a single transaction.

use crate::dates::local_timestamp;
use crate::db::models::{Exercise, HistoryRecord, Measurement, WorkoutPlan, WorkoutSession};
use crate::db::operations::{
    EXERCISE_COLUMNS, HISTORY_COLUMNS, MEASUREMENT_COLUMNS, WORKOUT_COLUMNS,
};
use crate::db::drop_all_tables;
use crate::db::schema::{ColumnDef, ColumnKind, TABLES, TableDef};
use crate::session::Session;
use anyhow::{Context, Result, anyhow, bail};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use sqlx::sqlite::{Sqlite, SqliteConnection, SqliteRow};
use std::fs;
use std::path::Path;

pub const SNAPSHOT_VERSION: i64 = 1;

// Tables a snapshot must carry, even if empty.
const REQUIRED_TABLES: [&str; 2] = ["history", "exercises"];

// Foreign keys and draft values are exported as stored. The typed read paths
// default missing ones to 0; a snapshot keeps them NULL.
const LINK_ROW_COLUMNS: &str = "id, workout_id, exercise_id, order_index, notes, \
     CAST(weight AS REAL) AS weight, \
     CAST(reps AS INTEGER) AS reps, \
     CAST(set_count AS INTEGER) AS set_count, \
     is_completed";
const SECTION_ROW_COLUMNS: &str = "id, plan_id, title, order_index";
const PLAN_ENTRY_ROW_COLUMNS: &str = "id, section_id, exercise_id, order_index";

/// A `workout_exercises` row as it sits in the database.
#[derive(FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LinkRow {
    pub id: i64,
    pub workout_id: Option<i64>,
    pub exercise_id: Option<i64>,
    pub order_index: Option<i64>,
    pub notes: Option<String>,
    pub weight: Option<f64>,
    pub reps: Option<i64>,
    pub set_count: Option<i64>,
    pub is_completed: Option<bool>,
}

#[derive(FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SectionRow {
    pub id: i64,
    pub plan_id: Option<i64>,
    pub title: Option<String>,
    pub order_index: Option<i64>,
}

#[derive(FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PlanEntryRow {
    pub id: i64,
    pub section_id: Option<i64>,
    pub exercise_id: Option<i64>,
    pub order_index: Option<i64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub version: i64,
    #[serde(rename = "exportedAt")]
    pub exported_at: String,
    pub exercises: Vec<Exercise>,
    pub workouts: Vec<WorkoutSession>,
    pub workout_exercises: Vec<LinkRow>,
    pub history: Vec<HistoryRecord>,
    pub measurements: Vec<Measurement>,
    pub workout_plans: Vec<WorkoutPlan>,
    pub plan_sections: Vec<SectionRow>,
    pub plan_exercises: Vec<PlanEntryRow>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ImportSummary {
    /// Rows restored per table, in restore order.
    pub rows: Vec<(String, u64)>,
    /// `table.column` keys present in the document but unknown to the schema.
    pub skipped_columns: Vec<String>,
}

impl ImportSummary {
    pub fn total_rows(&self) -> u64 {
        self.rows.iter().map(|(_, n)| n).sum()
    }
}

enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

/// Convert a JSON value to what SQLite would store in a column of `kind`.
/// Text that does not read as a number stays text, as column affinity would
/// leave it.
fn coerce(value: Option<&Value>, kind: ColumnKind) -> SqlValue {
    let value = match value {
        None | Some(Value::Null) => return SqlValue::Null,
        Some(v) => v,
    };
    match (value, kind) {
        (Value::Bool(b), ColumnKind::Text) => SqlValue::Text(b.to_string()),
        (Value::Bool(b), _) => SqlValue::Integer(i64::from(*b)),
        (Value::Number(n), ColumnKind::Text) => SqlValue::Text(n.to_string()),
        (Value::Number(n), ColumnKind::Real) => n
            .as_f64()
            .map(SqlValue::Real)
            .unwrap_or(SqlValue::Null),
        (Value::Number(n), ColumnKind::Integer) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => match n.as_f64() {
                Some(f) if f.fract() == 0.0 => SqlValue::Integer(f as i64),
                Some(f) => SqlValue::Real(f),
                None => SqlValue::Null,
            },
        },
        (Value::String(s), ColumnKind::Text) => SqlValue::Text(s.clone()),
        (Value::String(s), ColumnKind::Integer) => {
            if let Ok(i) = s.trim().parse::<i64>() {
                SqlValue::Integer(i)
            } else if let Ok(f) = s.trim().parse::<f64>() {
                SqlValue::Real(f)
            } else {
                SqlValue::Text(s.clone())
            }
        }
        (Value::String(s), ColumnKind::Real) => match s.trim().parse::<f64>() {
            Ok(f) => SqlValue::Real(f),
            Err(_) => SqlValue::Text(s.clone()),
        },
        (other, _) => SqlValue::Text(other.to_string()),
    }
}

/// Reject a document that cannot be restored, before anything is deleted.
fn validate(document: &Value) -> Result<&Map<String, Value>> {
    let root = document
        .as_object()
        .ok_or_else(|| anyhow!("Backup must be a JSON object"))?;

    for name in REQUIRED_TABLES {
        match root.get(name) {
            Some(Value::Array(_)) => {}
            Some(Value::Null) | None => bail!("Backup is missing the {} table", name),
            Some(_) => bail!("Backup table {} must be an array", name),
        }
    }

    for table in TABLES {
        match root.get(table.name) {
            None | Some(Value::Null) => {}
            Some(Value::Array(rows)) => {
                if let Some(i) = rows.iter().position(|r| !r.is_object()) {
                    bail!("Backup table {} row {} is not an object", table.name, i);
                }
            }
            Some(_) => bail!("Backup table {} must be an array", table.name),
        }
    }

    if let Some(version) = root.get("version").and_then(Value::as_i64) {
        if version > SNAPSHOT_VERSION {
            warn!(
                "Backup version {} is newer than {}; restoring known tables only",
                version, SNAPSHOT_VERSION
            );
        }
    }
    Ok(root)
}

async fn restore_table(
    conn: &mut SqliteConnection,
    table: &TableDef,
    rows: &[Value],
    skipped: &mut Vec<String>,
) -> Result<u64> {
    let Some(first) = rows.first().and_then(Value::as_object) else {
        return Ok(0);
    };

    let mut columns: Vec<&ColumnDef> = Vec::new();
    for key in first.keys() {
        match table.column(key) {
            Some(column) => columns.push(column),
            None => {
                warn!("Skipping unknown column {}.{}", table.name, key);
                skipped.push(format!("{}.{}", table.name, key));
            }
        }
    }
    if columns.is_empty() {
        warn!("No known columns for {}; nothing restored", table.name);
        return Ok(0);
    }

    let names: Vec<&str> = columns.iter().map(|c| c.name).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table.name,
        names.join(", "),
        placeholders.join(", ")
    );

    let mut restored = 0;
    for row in rows {
        let Some(row) = row.as_object() else {
            continue;
        };
        let mut query = sqlx::query::<Sqlite>(&sql);
        for column in &columns {
            query = match coerce(row.get(column.name), column.kind) {
                SqlValue::Null => match column.null_as {
                    Some(fallback) => query.bind(fallback),
                    None => query.bind(None::<i64>),
                },
                SqlValue::Integer(i) => query.bind(i),
                SqlValue::Real(f) => query.bind(f),
                SqlValue::Text(s) => query.bind(s),
            };
        }
        query
            .execute(&mut *conn)
            .await
            .with_context(|| format!("Failed to restore a row into {}", table.name))?;
        restored += 1;
    }
    Ok(restored)
}

async fn read_table<T>(conn: &mut SqliteConnection, table: &str, columns: &str) -> Result<Vec<T>>
where
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    let sql = format!("SELECT {} FROM {} ORDER BY id ASC", columns, table);
    sqlx::query_as::<_, T>(&sql)
        .fetch_all(&mut *conn)
        .await
        .with_context(|| format!("Failed to read {}", table))
}

impl Session {
    /// Every row of every table, read in one transaction.
    pub async fn export_snapshot(&self) -> Result<Snapshot> {
        let mut tx = self.db_pool.begin().await?;
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            exported_at: local_timestamp(),
            exercises: read_table(&mut tx, "exercises", EXERCISE_COLUMNS).await?,
            workouts: read_table(&mut tx, "workouts", WORKOUT_COLUMNS).await?,
            workout_exercises: read_table(&mut tx, "workout_exercises", LINK_ROW_COLUMNS).await?,
            history: read_table(&mut tx, "history", HISTORY_COLUMNS).await?,
            measurements: read_table(&mut tx, "measurements", MEASUREMENT_COLUMNS).await?,
            workout_plans: read_table(&mut tx, "workout_plans", "id, name").await?,
            plan_sections: read_table(&mut tx, "plan_sections", SECTION_ROW_COLUMNS).await?,
            plan_exercises: read_table(&mut tx, "plan_exercises", PLAN_ENTRY_ROW_COLUMNS).await?,
        };
        tx.commit().await?;
        debug!(
            "Exported {} exercises and {} history records",
            snapshot.exercises.len(),
            snapshot.history.len()
        );
        Ok(snapshot)
    }

    pub async fn export_json(&self) -> Result<String> {
        let snapshot = self.export_snapshot().await?;
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    pub async fn export_to_file(&self, path: &Path) -> Result<()> {
        let json = self.export_json().await?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote backup to {}", path.display());
        Ok(())
    }

    /// Replace the whole database with the contents of `document`.
    ///
    /// The document is validated before anything is touched; after that the
    /// tables are cleared and refilled in one transaction, so a failure at
    /// any point leaves the previous data in place.
    pub async fn import_snapshot(&self, document: &Value) -> Result<ImportSummary> {
        let root = validate(document)?;

        let _writer = self.writer().await;
        let mut tx = self.db_pool.begin().await?;
        drop_all_tables(&mut tx).await?;

        let mut summary = ImportSummary::default();
        for table in TABLES {
            let Some(rows) = root.get(table.name).and_then(Value::as_array) else {
                continue;
            };
            let count = restore_table(&mut tx, table, rows, &mut summary.skipped_columns).await?;
            summary.rows.push((table.name.to_string(), count));
        }
        tx.commit().await?;

        info!(
            "Restored {} rows across {} tables",
            summary.total_rows(),
            summary.rows.len()
        );
        Ok(summary)
    }

    pub async fn import_json(&self, json: &str) -> Result<ImportSummary> {
        let document: Value = serde_json::from_str(json).context("Backup is not valid JSON")?;
        self.import_snapshot(&document).await
    }

    pub async fn import_from_file(&self, path: &Path) -> Result<ImportSummary> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        self.import_json(&json).await
    }

    /// Delete every row of every table and reset the id counters.
    pub async fn reset_all(&self) -> Result<()> {
        let _writer = self.writer().await;
        let mut tx = self.db_pool.begin().await?;
        drop_all_tables(&mut tx).await?;
        tx.commit().await?;
        info!("Cleared all data");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{NewExercise, SetEntry};
    use crate::session::{PlanDefinition, SectionDefinition};
    use serde_json::json;

    async fn populated() -> Session {
        let session = Session::in_memory().await.unwrap();
        let id = session
            .add_exercise(&NewExercise {
                name: "Squat".into(),
                muscle_group: Some("Legs".into()),
                default_sets: Some(3),
                ..Default::default()
            })
            .await
            .unwrap();
        let link = session.ensure_link(id, "2024-01-01").await.unwrap();
        session
            .save_set(
                link,
                &SetEntry {
                    weight: 100.0,
                    reps: 5,
                    set_count: 3,
                    notes: Some("belt".into()),
                    completed: true,
                },
            )
            .await
            .unwrap();
        session
            .add_measurement("weight", 80.5, None, Some("2024-01-01T08:00:00"))
            .await
            .unwrap();
        session
            .create_plan_from_definition(&PlanDefinition {
                name: "Legs".into(),
                sections: vec![SectionDefinition {
                    title: "Main".into(),
                    exercise_ids: vec![id],
                }],
            })
            .await
            .unwrap();
        session
    }

    #[test]
    fn coercion_follows_column_kind() {
        assert!(matches!(
            coerce(Some(&json!("12")), ColumnKind::Integer),
            SqlValue::Integer(12)
        ));
        assert!(matches!(
            coerce(Some(&json!(true)), ColumnKind::Integer),
            SqlValue::Integer(1)
        ));
        assert!(matches!(
            coerce(Some(&json!(3)), ColumnKind::Real),
            SqlValue::Real(f) if f == 3.0
        ));
        assert!(matches!(
            coerce(Some(&json!("abc")), ColumnKind::Real),
            SqlValue::Text(_)
        ));
        assert!(matches!(coerce(None, ColumnKind::Text), SqlValue::Null));
    }

    #[test]
    fn validation_requires_history_and_exercises() {
        assert!(validate(&json!([])).is_err());
        assert!(validate(&json!({ "exercises": [] })).is_err());
        assert!(validate(&json!({ "exercises": [], "history": null })).is_err());
        assert!(validate(&json!({ "exercises": [], "history": {} })).is_err());
        assert!(validate(&json!({ "exercises": [], "history": [], "workouts": [1] })).is_err());
        assert!(validate(&json!({ "exercises": [], "history": [], "workouts": null })).is_ok());
    }

    #[tokio::test]
    async fn round_trip_restores_identical_rows() {
        let source = populated().await;
        let exported = source.export_snapshot().await.unwrap();

        let target = Session::in_memory().await.unwrap();
        let document = serde_json::to_value(&exported).unwrap();
        let summary = target.import_snapshot(&document).await.unwrap();
        assert!(summary.skipped_columns.is_empty());
        assert_eq!(summary.total_rows(), 8);

        let restored = target.export_snapshot().await.unwrap();
        assert_eq!(restored.exercises, exported.exercises);
        assert_eq!(restored.workouts, exported.workouts);
        assert_eq!(restored.workout_exercises, exported.workout_exercises);
        assert_eq!(restored.history, exported.history);
        assert_eq!(restored.measurements, exported.measurements);
        assert_eq!(restored.workout_plans, exported.workout_plans);
        assert_eq!(restored.plan_sections, exported.plan_sections);
        assert_eq!(restored.plan_exercises, exported.plan_exercises);
        assert_eq!(restored.plan_exercises.len(), 1);
    }

    #[tokio::test]
    async fn null_foreign_keys_survive_a_round_trip() {
        let source = Session::in_memory().await.unwrap();
        {
            let mut conn = source.conn().await.unwrap();
            sqlx::query("INSERT INTO workout_exercises (id, workout_id, exercise_id, weight) VALUES (7, NULL, 3, NULL)")
                .execute(&mut *conn)
                .await
                .unwrap();
            sqlx::query("INSERT INTO plan_sections (id, plan_id, title) VALUES (2, NULL, 'Loose')")
                .execute(&mut *conn)
                .await
                .unwrap();
            sqlx::query("INSERT INTO plan_exercises (id, section_id, exercise_id) VALUES (5, 2, NULL)")
                .execute(&mut *conn)
                .await
                .unwrap();
        }

        let exported = source.export_snapshot().await.unwrap();
        assert_eq!(exported.workout_exercises[0].workout_id, None);
        assert_eq!(exported.workout_exercises[0].weight, None);
        assert_eq!(exported.plan_sections[0].plan_id, None);
        assert_eq!(exported.plan_exercises[0].exercise_id, None);

        let document = serde_json::to_value(&exported).unwrap();
        assert!(document["workout_exercises"][0]["workout_id"].is_null());

        let target = Session::in_memory().await.unwrap();
        target.import_snapshot(&document).await.unwrap();
        let restored = target.export_snapshot().await.unwrap();
        assert_eq!(restored.workout_exercises, exported.workout_exercises);
        assert_eq!(restored.plan_sections, exported.plan_sections);
        assert_eq!(restored.plan_exercises, exported.plan_exercises);

        // The typed read path still sees a zeroed link.
        let link = target.link(7).await.unwrap().unwrap();
        assert_eq!((link.workout_id, link.weight), (0, 0.0));
    }

    #[tokio::test]
    async fn null_history_text_restores_as_empty() {
        let session = Session::in_memory().await.unwrap();
        let document = json!({
            "exercises": [],
            "history": [
                { "id": 1, "workout_date": null, "exercise_name": null, "weight": 50 },
                { "id": 2, "workout_date": "2024-02-01", "exercise_name": "Row", "weight": 60 },
            ],
            "workouts": [{ "id": 1, "name": null, "scheduled_date": "2024-02-01" }],
        });
        session.import_snapshot(&document).await.unwrap();

        let snapshot = session.export_snapshot().await.unwrap();
        assert_eq!(snapshot.history.len(), 2);
        assert_eq!(snapshot.history[0].workout_date, "");
        assert_eq!(snapshot.history[0].exercise_name, "");
        assert_eq!(snapshot.workouts[0].name, "Daily Log");
    }

    #[tokio::test]
    async fn rejected_import_leaves_data_alone() {
        let session = populated().await;
        let before = session.export_snapshot().await.unwrap();

        let err = session
            .import_json(r#"{"exercises": [], "history": "nope"}"#)
            .await;
        assert!(err.is_err());

        let after = session.export_snapshot().await.unwrap();
        assert_eq!(after.history, before.history);
        assert_eq!(after.exercises, before.exercises);
    }

    #[tokio::test]
    async fn failing_row_rolls_back() {
        let session = populated().await;
        // A NULL exercise name violates NOT NULL half way through the restore.
        let document = json!({
            "exercises": [{ "id": 1, "name": "Bench" }, { "id": 2, "name": null }],
            "history": [],
        });
        assert!(session.import_snapshot(&document).await.is_err());

        let exercises = session.all_exercises().await.unwrap();
        assert_eq!(exercises.len(), 1);
        assert_eq!(exercises[0].name, "Squat");
        assert_eq!(session.session_details("2024-01-01").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_columns_are_skipped() {
        let session = Session::in_memory().await.unwrap();
        let document = json!({
            "version": 1,
            "exercises": [{ "id": 4, "name": "Row", "color": "blue", "default_sets": "3" }],
            "history": [],
        });
        let summary = session.import_snapshot(&document).await.unwrap();
        assert_eq!(summary.skipped_columns, ["exercises.color"]);

        let row = session.exercise(4).await.unwrap().unwrap();
        assert_eq!(row.default_sets, Some(3));
    }

    #[tokio::test]
    async fn reset_clears_everything_and_counters() {
        let session = populated().await;
        session.reset_all().await.unwrap();

        let snapshot = session.export_snapshot().await.unwrap();
        assert!(snapshot.exercises.is_empty());
        assert!(snapshot.history.is_empty());
        assert!(snapshot.measurements.is_empty());

        let id = session
            .add_exercise(&NewExercise {
                name: "Bench".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(id, 1);
    }

    #[tokio::test]
    async fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");

        let source = populated().await;
        source.export_to_file(&path).await.unwrap();

        let target = Session::in_memory().await.unwrap();
        target.import_from_file(&path).await.unwrap();
        assert_eq!(target.session_details("2024-01-01").await.unwrap().len(), 1);
    }
}
