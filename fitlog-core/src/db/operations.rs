use anyhow::Result;
use sqlx::sqlite::SqliteConnection;

use crate::db::models::{
    Exercise, HistoryRecord, Measurement, NewExercise, NewHistoryRecord, PlanExercise,
    PlanSection, SessionExercise, WorkoutPlan, WorkoutSession,
};

// Column lists normalise NULLs and storage classes so rows restored from
// older backups still decode into the models.
pub(crate) const EXERCISE_COLUMNS: &str = "id, name, muscle_group, notes, \
     CAST(default_sets AS INTEGER) AS default_sets, \
     CAST(default_reps AS INTEGER) AS default_reps";

pub(crate) const WORKOUT_COLUMNS: &str = "id, name, scheduled_date, status";

pub(crate) const SESSION_EXERCISE_COLUMNS: &str = "id, \
     COALESCE(workout_id, 0) AS workout_id, \
     COALESCE(exercise_id, 0) AS exercise_id, \
     order_index, notes, \
     CAST(COALESCE(weight, 0) AS REAL) AS weight, \
     CAST(COALESCE(reps, 0) AS INTEGER) AS reps, \
     CAST(COALESCE(set_count, 0) AS INTEGER) AS set_count, \
     COALESCE(is_completed, 0) AS is_completed";

pub(crate) const HISTORY_COLUMNS: &str = "id, workout_date, exercise_name, muscle_group, \
     CAST(weight AS REAL) AS weight, \
     CAST(reps AS INTEGER) AS reps, \
     CAST(sets AS INTEGER) AS sets, \
     notes";

pub(crate) const MEASUREMENT_COLUMNS: &str =
    "id, type, CAST(value AS REAL) AS value, unit, date";

pub(crate) const PLAN_SECTION_COLUMNS: &str =
    "id, COALESCE(plan_id, 0) AS plan_id, title, order_index";

pub(crate) const PLAN_EXERCISE_COLUMNS: &str =
    "id, COALESCE(section_id, 0) AS section_id, COALESCE(exercise_id, 0) AS exercise_id, order_index";

// Exercises
pub async fn insert_exercise(conn: &mut SqliteConnection, exercise: &NewExercise) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO exercises (name, muscle_group, notes, default_sets, default_reps)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(&exercise.name)
    .bind(&exercise.muscle_group)
    .bind(&exercise.notes)
    .bind(exercise.default_sets)
    .bind(exercise.default_reps)
    .execute(&mut *conn)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn get_exercise(conn: &mut SqliteConnection, exercise_id: i64) -> Result<Option<Exercise>> {
    let sql = format!("SELECT {} FROM exercises WHERE id = ?1", EXERCISE_COLUMNS);
    sqlx::query_as::<_, Exercise>(&sql)
        .bind(exercise_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(Into::into)
}

pub async fn get_all_exercises(conn: &mut SqliteConnection) -> Result<Vec<Exercise>> {
    let sql = format!("SELECT {} FROM exercises ORDER BY name ASC, id ASC", EXERCISE_COLUMNS);
    sqlx::query_as::<_, Exercise>(&sql)
        .fetch_all(&mut *conn)
        .await
        .map_err(Into::into)
}

pub async fn delete_exercise(conn: &mut SqliteConnection, exercise_id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM exercises WHERE id = ?1")
        .bind(exercise_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn update_exercise_notes(
    conn: &mut SqliteConnection,
    exercise_id: i64,
    notes: &str,
) -> Result<u64> {
    let result = sqlx::query("UPDATE exercises SET notes = ?1 WHERE id = ?2")
        .bind(notes)
        .bind(exercise_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn update_exercise_defaults(
    conn: &mut SqliteConnection,
    exercise_id: i64,
    default_sets: Option<i64>,
    default_reps: Option<i64>,
) -> Result<u64> {
    let result =
        sqlx::query("UPDATE exercises SET default_sets = ?1, default_reps = ?2 WHERE id = ?3")
            .bind(default_sets)
            .bind(default_reps)
            .bind(exercise_id)
            .execute(&mut *conn)
            .await?;
    Ok(result.rows_affected())
}

/// Plan entries pointing at an exercise; removed along with the exercise.
pub async fn delete_plan_exercises_for_exercise(
    conn: &mut SqliteConnection,
    exercise_id: i64,
) -> Result<u64> {
    let result = sqlx::query("DELETE FROM plan_exercises WHERE exercise_id = ?1")
        .bind(exercise_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

// Daily logs
pub async fn find_workout_by_date(
    conn: &mut SqliteConnection,
    date: &str,
) -> Result<Option<WorkoutSession>> {
    let sql = format!(
        "SELECT {} FROM workouts WHERE scheduled_date = ?1 ORDER BY id ASC LIMIT 1",
        WORKOUT_COLUMNS
    );
    sqlx::query_as::<_, WorkoutSession>(&sql)
        .bind(date)
        .fetch_optional(&mut *conn)
        .await
        .map_err(Into::into)
}

pub async fn create_daily_log(conn: &mut SqliteConnection, date: &str) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO workouts (name, scheduled_date, status) VALUES ('Daily Log', ?1, 'pending')",
    )
    .bind(date)
    .execute(&mut *conn)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn get_all_workout_sessions(conn: &mut SqliteConnection) -> Result<Vec<WorkoutSession>> {
    let sql = format!(
        "SELECT {} FROM workouts ORDER BY scheduled_date ASC, id ASC",
        WORKOUT_COLUMNS
    );
    sqlx::query_as::<_, WorkoutSession>(&sql)
        .fetch_all(&mut *conn)
        .await
        .map_err(Into::into)
}

// Session exercises
pub async fn find_link(
    conn: &mut SqliteConnection,
    workout_id: i64,
    exercise_id: i64,
) -> Result<Option<i64>> {
    sqlx::query_scalar::<_, i64>(
        "SELECT id FROM workout_exercises WHERE workout_id = ?1 AND exercise_id = ?2
         ORDER BY id ASC LIMIT 1",
    )
    .bind(workout_id)
    .bind(exercise_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(Into::into)
}

/// Inserts a zeroed link, ordered after the links already in the session.
pub async fn create_link(conn: &mut SqliteConnection, workout_id: i64, exercise_id: i64) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO workout_exercises
            (workout_id, exercise_id, order_index, weight, reps, set_count, is_completed)
         VALUES (?1, ?2, (SELECT COUNT(*) FROM workout_exercises WHERE workout_id = ?1), 0, 0, 0, 0)",
    )
    .bind(workout_id)
    .bind(exercise_id)
    .execute(&mut *conn)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn get_link(conn: &mut SqliteConnection, link_id: i64) -> Result<Option<SessionExercise>> {
    let sql = format!(
        "SELECT {} FROM workout_exercises WHERE id = ?1",
        SESSION_EXERCISE_COLUMNS
    );
    sqlx::query_as::<_, SessionExercise>(&sql)
        .bind(link_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(Into::into)
}

pub async fn get_links_for_date(conn: &mut SqliteConnection, date: &str) -> Result<Vec<SessionExercise>> {
    let sql = format!(
        "SELECT {} FROM workout_exercises
         WHERE workout_id IN (SELECT id FROM workouts WHERE scheduled_date = ?1)
         ORDER BY id ASC",
        SESSION_EXERCISE_COLUMNS
    );
    sqlx::query_as::<_, SessionExercise>(&sql)
        .bind(date)
        .fetch_all(&mut *conn)
        .await
        .map_err(Into::into)
}

pub async fn update_link_values(
    conn: &mut SqliteConnection,
    link_id: i64,
    weight: f64,
    reps: i64,
    set_count: i64,
    notes: &str,
    completed: bool,
) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE workout_exercises
         SET weight = ?1, reps = ?2, set_count = ?3, notes = ?4, is_completed = ?5
         WHERE id = ?6",
    )
    .bind(weight)
    .bind(reps)
    .bind(set_count)
    .bind(notes)
    .bind(completed)
    .bind(link_id)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected())
}

/// What a link archives under: exercise name, muscle group and session date.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct LinkArchiveTarget {
    pub exercise_name: String,
    pub muscle_group: Option<String>,
    pub workout_date: Option<String>,
}

pub async fn get_link_archive_target(
    conn: &mut SqliteConnection,
    link_id: i64,
) -> Result<Option<LinkArchiveTarget>> {
    sqlx::query_as::<_, LinkArchiveTarget>(
        "SELECT e.name AS exercise_name, e.muscle_group AS muscle_group,
                w.scheduled_date AS workout_date
         FROM workout_exercises we
         JOIN workouts w ON we.workout_id = w.id
         JOIN exercises e ON we.exercise_id = e.id
         WHERE we.id = ?1",
    )
    .bind(link_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(Into::into)
}

// History
/// Delete any record for (date, exercise name), then insert the new one.
/// Callers run this inside a transaction.
pub async fn replace_history_record(
    conn: &mut SqliteConnection,
    record: &NewHistoryRecord,
) -> Result<i64> {
    sqlx::query("DELETE FROM history WHERE workout_date = ?1 AND exercise_name = ?2")
        .bind(&record.workout_date)
        .bind(&record.exercise_name)
        .execute(&mut *conn)
        .await?;
    let result = sqlx::query(
        "INSERT INTO history (workout_date, exercise_name, muscle_group, weight, reps, sets, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(&record.workout_date)
    .bind(&record.exercise_name)
    .bind(&record.muscle_group)
    .bind(record.weight)
    .bind(record.reps)
    .bind(record.sets)
    .bind(&record.notes)
    .execute(&mut *conn)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Most recent record for an exercise name; same-day ties go to the newest row.
pub async fn get_last_history_for_name(
    conn: &mut SqliteConnection,
    exercise_name: &str,
) -> Result<Option<HistoryRecord>> {
    let sql = format!(
        "SELECT {} FROM history WHERE exercise_name = ?1
         ORDER BY workout_date DESC, id DESC LIMIT 1",
        HISTORY_COLUMNS
    );
    sqlx::query_as::<_, HistoryRecord>(&sql)
        .bind(exercise_name)
        .fetch_optional(&mut *conn)
        .await
        .map_err(Into::into)
}

pub async fn get_history_for_date(conn: &mut SqliteConnection, date: &str) -> Result<Vec<HistoryRecord>> {
    let sql = format!(
        "SELECT {} FROM history WHERE workout_date = ?1 ORDER BY id ASC",
        HISTORY_COLUMNS
    );
    sqlx::query_as::<_, HistoryRecord>(&sql)
        .bind(date)
        .fetch_all(&mut *conn)
        .await
        .map_err(Into::into)
}

pub async fn delete_history_by_date(conn: &mut SqliteConnection, date: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM history WHERE workout_date = ?1")
        .bind(date)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

// Measurements
pub async fn insert_measurement(
    conn: &mut SqliteConnection,
    kind: &str,
    value: f64,
    unit: &str,
    timestamp: &str,
) -> Result<i64> {
    let result =
        sqlx::query("INSERT INTO measurements (type, value, unit, date) VALUES (?1, ?2, ?3, ?4)")
            .bind(kind)
            .bind(value)
            .bind(unit)
            .bind(timestamp)
            .execute(&mut *conn)
            .await?;
    Ok(result.last_insert_rowid())
}

pub async fn get_latest_measurement(
    conn: &mut SqliteConnection,
    kind: &str,
) -> Result<Option<Measurement>> {
    let sql = format!(
        "SELECT {} FROM measurements WHERE type = ?1 ORDER BY date DESC, id DESC LIMIT 1",
        MEASUREMENT_COLUMNS
    );
    sqlx::query_as::<_, Measurement>(&sql)
        .bind(kind)
        .fetch_optional(&mut *conn)
        .await
        .map_err(Into::into)
}

/// Samples taken on a calendar day, latest first.
pub async fn get_measurements_on(conn: &mut SqliteConnection, day: &str) -> Result<Vec<Measurement>> {
    let sql = format!(
        "SELECT {} FROM measurements WHERE substr(date, 1, 10) = ?1 ORDER BY date DESC, id DESC",
        MEASUREMENT_COLUMNS
    );
    sqlx::query_as::<_, Measurement>(&sql)
        .bind(day)
        .fetch_all(&mut *conn)
        .await
        .map_err(Into::into)
}

pub async fn get_all_measurements(conn: &mut SqliteConnection) -> Result<Vec<Measurement>> {
    let sql = format!(
        "SELECT {} FROM measurements ORDER BY date DESC, id DESC",
        MEASUREMENT_COLUMNS
    );
    sqlx::query_as::<_, Measurement>(&sql)
        .fetch_all(&mut *conn)
        .await
        .map_err(Into::into)
}

pub async fn delete_measurements_on(conn: &mut SqliteConnection, day: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM measurements WHERE substr(date, 1, 10) = ?1")
        .bind(day)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

// Plans
pub async fn insert_plan(conn: &mut SqliteConnection, name: &str) -> Result<i64> {
    let result = sqlx::query("INSERT INTO workout_plans (name) VALUES (?1)")
        .bind(name)
        .execute(&mut *conn)
        .await?;
    Ok(result.last_insert_rowid())
}

pub async fn insert_section(
    conn: &mut SqliteConnection,
    plan_id: i64,
    title: &str,
    order_index: i64,
) -> Result<i64> {
    let result =
        sqlx::query("INSERT INTO plan_sections (plan_id, title, order_index) VALUES (?1, ?2, ?3)")
            .bind(plan_id)
            .bind(title)
            .bind(order_index)
            .execute(&mut *conn)
            .await?;
    Ok(result.last_insert_rowid())
}

pub async fn insert_plan_exercise(
    conn: &mut SqliteConnection,
    section_id: i64,
    exercise_id: i64,
    order_index: i64,
) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO plan_exercises (section_id, exercise_id, order_index) VALUES (?1, ?2, ?3)",
    )
    .bind(section_id)
    .bind(exercise_id)
    .bind(order_index)
    .execute(&mut *conn)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn get_all_plans(conn: &mut SqliteConnection) -> Result<Vec<WorkoutPlan>> {
    sqlx::query_as::<_, WorkoutPlan>("SELECT id, name FROM workout_plans ORDER BY id ASC")
        .fetch_all(&mut *conn)
        .await
        .map_err(Into::into)
}

pub async fn get_plan(conn: &mut SqliteConnection, plan_id: i64) -> Result<Option<WorkoutPlan>> {
    sqlx::query_as::<_, WorkoutPlan>("SELECT id, name FROM workout_plans WHERE id = ?1")
        .bind(plan_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(Into::into)
}

pub async fn get_sections_for_plan(conn: &mut SqliteConnection, plan_id: i64) -> Result<Vec<PlanSection>> {
    let sql = format!(
        "SELECT {} FROM plan_sections WHERE plan_id = ?1 ORDER BY order_index ASC, id ASC",
        PLAN_SECTION_COLUMNS
    );
    sqlx::query_as::<_, PlanSection>(&sql)
        .bind(plan_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(Into::into)
}

pub async fn get_plan_exercises_for_section(
    conn: &mut SqliteConnection,
    section_id: i64,
) -> Result<Vec<PlanExercise>> {
    let sql = format!(
        "SELECT {} FROM plan_exercises WHERE section_id = ?1 ORDER BY order_index ASC, id ASC",
        PLAN_EXERCISE_COLUMNS
    );
    sqlx::query_as::<_, PlanExercise>(&sql)
        .bind(section_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(Into::into)
}

/// Removes plan-exercises, then sections, then the plan row. Returns whether
/// the plan existed.
pub async fn delete_plan_tree(conn: &mut SqliteConnection, plan_id: i64) -> Result<bool> {
    sqlx::query(
        "DELETE FROM plan_exercises
         WHERE section_id IN (SELECT id FROM plan_sections WHERE plan_id = ?1)",
    )
    .bind(plan_id)
    .execute(&mut *conn)
    .await?;
    sqlx::query("DELETE FROM plan_sections WHERE plan_id = ?1")
        .bind(plan_id)
        .execute(&mut *conn)
        .await?;
    let result = sqlx::query("DELETE FROM workout_plans WHERE id = ?1")
        .bind(plan_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
