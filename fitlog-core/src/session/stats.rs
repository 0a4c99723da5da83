//! Read-only aggregates over history and measurements.

use crate::dates::{day_of, format_date, month_start, short_label, week_start};
use crate::db::models::HistoryRecord;
use crate::db::operations::{
    get_exercise, get_history_for_date, get_latest_measurement, get_measurements_on,
};
use crate::session::Session;
use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

/// Measurement types charted on the progress screen, in display order.
pub const TRACKED_MEASUREMENTS: [&str; 4] = ["weight", "arm", "forearm", "chest"];

const SERIES_DAYS: i64 = 7;
const PROGRESS_DAYS: i64 = 10;

/// One logged day in the history list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub date: String,
    pub total_sets: i64,
    pub exercise_count: i64,
    pub exercises: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumePoint {
    pub date: String,
    /// `DD/MM`
    pub label: String,
    pub volume: f64,
}

#[derive(FromRow, Debug, Clone, PartialEq, Serialize)]
pub struct PersonalRecord {
    pub exercise_name: String,
    pub max_weight: f64,
}

#[derive(FromRow, Debug, Clone, PartialEq, Serialize)]
pub struct ProgressPoint {
    pub workout_date: String,
    pub weight: Option<f64>,
    pub reps: Option<i64>,
    pub sets: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestStat {
    pub kind: String,
    pub value: f64,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodyStatLine {
    pub kind: String,
    /// One entry per day of the series; `None` where nothing was measured.
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BodyStatSeries {
    pub dates: Vec<String>,
    pub labels: Vec<String>,
    pub lines: Vec<BodyStatLine>,
}

impl Session {
    /// Distinct logged days on or after `boundary`.
    pub async fn workouts_since(&self, boundary: &str) -> Result<i64> {
        let mut conn = self.conn().await?;
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(DISTINCT workout_date) FROM history WHERE workout_date >= ?1",
        )
        .bind(boundary)
        .fetch_one(&mut *conn)
        .await?;
        Ok(count)
    }

    /// Days logged in the Monday-started week containing `on`.
    pub async fn weekly_workout_count(&self, on: NaiveDate) -> Result<i64> {
        self.workouts_since(&format_date(week_start(on))).await
    }

    pub async fn monthly_workout_count(&self, on: NaiveDate) -> Result<i64> {
        self.workouts_since(&format_date(month_start(on))).await
    }

    /// Total volume (weight x reps x sets) of the seven most recent logged
    /// days, oldest first.
    pub async fn volume_last_7(&self) -> Result<Vec<VolumePoint>> {
        let mut conn = self.conn().await?;
        let rows = sqlx::query_as::<_, (String, f64)>(
            "SELECT workout_date,
                    CAST(COALESCE(SUM(COALESCE(weight, 0) * COALESCE(reps, 0) * COALESCE(sets, 0)), 0) AS REAL)
             FROM history
             GROUP BY workout_date
             ORDER BY workout_date DESC
             LIMIT ?1",
        )
        .bind(SERIES_DAYS)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows
            .into_iter()
            .rev()
            .map(|(date, volume)| VolumePoint {
                label: short_label(&date),
                date,
                volume,
            })
            .collect())
    }

    /// Heaviest weight ever recorded per exercise name, heaviest first.
    pub async fn personal_records(&self) -> Result<Vec<PersonalRecord>> {
        self.records_query("ORDER BY max_weight DESC, exercise_name ASC", -1, 0)
            .await
    }

    pub async fn top_personal_records(&self, limit: i64) -> Result<Vec<PersonalRecord>> {
        self.records_query("ORDER BY max_weight DESC, exercise_name ASC", limit, 0)
            .await
    }

    /// Personal records in alphabetical pages.
    pub async fn personal_records_page(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PersonalRecord>> {
        self.records_query("ORDER BY exercise_name ASC", limit, offset)
            .await
    }

    pub async fn personal_record_count(&self) -> Result<i64> {
        let mut conn = self.conn().await?;
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(DISTINCT exercise_name) FROM history WHERE weight IS NOT NULL",
        )
        .fetch_one(&mut *conn)
        .await?;
        Ok(count)
    }

    async fn records_query(
        &self,
        order: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PersonalRecord>> {
        let mut conn = self.conn().await?;
        let sql = format!(
            "SELECT exercise_name, CAST(MAX(weight) AS REAL) AS max_weight
             FROM history
             WHERE weight IS NOT NULL
             GROUP BY exercise_name
             {}
             LIMIT ?1 OFFSET ?2",
            order
        );
        let records = sqlx::query_as::<_, PersonalRecord>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *conn)
            .await?;
        Ok(records)
    }

    /// Body measurements of the seven most recent measured days, oldest
    /// first, one line per tracked type. Gaps stay `None`.
    pub async fn body_stat_series(&self) -> Result<BodyStatSeries> {
        let mut conn = self.conn().await?;
        let mut dates = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT substr(date, 1, 10) AS day FROM measurements
             ORDER BY day DESC LIMIT ?1",
        )
        .bind(SERIES_DAYS)
        .fetch_all(&mut *conn)
        .await?;
        dates.reverse();

        let mut lines: Vec<BodyStatLine> = TRACKED_MEASUREMENTS
            .iter()
            .map(|kind| BodyStatLine {
                kind: kind.to_string(),
                values: Vec::with_capacity(dates.len()),
            })
            .collect();

        for day in &dates {
            // Latest sample first, so the first match is the day's value.
            let samples = get_measurements_on(&mut conn, day).await?;
            for line in &mut lines {
                let value = samples.iter().find(|m| m.kind == line.kind).map(|m| m.value);
                line.values.push(value);
            }
        }

        Ok(BodyStatSeries {
            labels: dates.iter().map(|d| short_label(d)).collect(),
            dates,
            lines,
        })
    }

    /// Most recent sample of each tracked type that has one.
    pub async fn latest_body_stats(&self) -> Result<Vec<LatestStat>> {
        let mut conn = self.conn().await?;
        let mut stats = Vec::new();
        for kind in TRACKED_MEASUREMENTS {
            if let Some(m) = get_latest_measurement(&mut conn, kind).await? {
                stats.push(LatestStat {
                    kind: m.kind,
                    value: m.value,
                    date: day_of(&m.date).to_string(),
                });
            }
        }
        Ok(stats)
    }

    pub async fn latest_weight(&self) -> Result<Option<f64>> {
        let mut conn = self.conn().await?;
        Ok(get_latest_measurement(&mut conn, "weight")
            .await?
            .map(|m| m.value))
    }

    /// Distinct muscle groups archived on `date`, alphabetically.
    pub async fn muscles_trained_on(&self, date: &str) -> Result<Vec<String>> {
        let mut conn = self.conn().await?;
        let muscles = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT muscle_group FROM history
             WHERE workout_date = ?1 AND muscle_group IS NOT NULL AND muscle_group <> ''
             ORDER BY muscle_group ASC",
        )
        .bind(date)
        .fetch_all(&mut *conn)
        .await?;
        Ok(muscles)
    }

    /// Logged days, newest first.
    pub async fn workout_history(&self, limit: i64, offset: i64) -> Result<Vec<DaySummary>> {
        let mut conn = self.conn().await?;
        let dates = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT workout_date FROM history
             ORDER BY workout_date DESC LIMIT ?1 OFFSET ?2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await?;

        let mut days = Vec::with_capacity(dates.len());
        for date in dates {
            let records = get_history_for_date(&mut conn, &date).await?;
            days.push(DaySummary {
                total_sets: records.iter().map(|r| r.sets.unwrap_or(0)).sum(),
                exercise_count: records.len() as i64,
                exercises: records.into_iter().map(|r| r.exercise_name).collect(),
                date,
            });
        }
        Ok(days)
    }

    pub async fn workout_history_count(&self) -> Result<i64> {
        let mut conn = self.conn().await?;
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(DISTINCT workout_date) FROM history")
            .fetch_one(&mut *conn)
            .await?;
        Ok(count)
    }

    /// Archived records of one day in the order they were written.
    pub async fn session_details(&self, date: &str) -> Result<Vec<HistoryRecord>> {
        let mut conn = self.conn().await?;
        get_history_for_date(&mut conn, date).await
    }

    /// Every logged day, oldest first.
    pub async fn workout_dates(&self) -> Result<Vec<String>> {
        let mut conn = self.conn().await?;
        let dates = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT workout_date FROM history ORDER BY workout_date ASC",
        )
        .fetch_all(&mut *conn)
        .await?;
        Ok(dates)
    }

    /// Per-day best weight, best reps and total sets for one exercise over
    /// its ten most recent logged days, oldest first.
    pub async fn exercise_progress(&self, exercise_id: i64) -> Result<Vec<ProgressPoint>> {
        let mut conn = self.conn().await?;
        let exercise = get_exercise(&mut conn, exercise_id)
            .await?
            .ok_or_else(|| anyhow!("No exercise with id {}", exercise_id))?;

        let mut points = sqlx::query_as::<_, ProgressPoint>(
            "SELECT workout_date,
                    CAST(MAX(weight) AS REAL) AS weight,
                    CAST(MAX(reps) AS INTEGER) AS reps,
                    CAST(COALESCE(SUM(sets), 0) AS INTEGER) AS sets
             FROM history
             WHERE exercise_name = ?1
             GROUP BY workout_date
             ORDER BY workout_date DESC
             LIMIT ?2",
        )
        .bind(&exercise.name)
        .bind(PROGRESS_DAYS)
        .fetch_all(&mut *conn)
        .await?;
        points.reverse();
        Ok(points)
    }
}
