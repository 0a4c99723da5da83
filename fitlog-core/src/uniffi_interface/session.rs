//! Functions screens call. Each one drives the async engine to completion on
//! the global runtime.

use crate::dates::{local_date, today};
use crate::db::models::{NewExercise, SetEntry};
use crate::runtime::init_global_runtime_blocking;
use crate::session::Session;
use crate::uniffi_interface::errors::FitlogError;
use crate::uniffi_interface::objects::{
    BodyStat, BodyStatChart, DayLog, DraftValues, Exercise, ExerciseCard, HistoryDay,
    HistoryEntry, ImportResult, MeasurementDayEntry, PersonalRecordEntry, PlanInput, PlanSummary,
    PlanView, ProgressEntry, SaveResult, VolumeEntry, WorkoutCounts,
};
use log::*;
use std::future::Future;
use std::sync::Arc;

type FfiResult<T> = std::result::Result<T, FitlogError>;

fn run<T>(future: impl Future<Output = anyhow::Result<T>>) -> FfiResult<T> {
    let rt = init_global_runtime_blocking()?;
    rt.block_on(future).map_err(|e| {
        error!("{:#}", e);
        FitlogError::from(e)
    })
}

#[uniffi::export]
pub fn create_session(db_path: &str) -> FfiResult<Arc<Session>> {
    let session = run(Session::new(db_path))?;
    Ok(Arc::new(session))
}

/// Delete all data and start from empty tables.
#[uniffi::export]
pub fn reset_database(session: &Session) -> FfiResult<()> {
    run(session.reset_all())
}

// Workout

/// Link id for the exercise on `date` (today if absent), or `None` when the
/// link cannot be created.
#[uniffi::export]
pub fn ensure_workout_session(
    session: &Session,
    exercise_id: i64,
    date: Option<String>,
) -> Option<i64> {
    let date = date.unwrap_or_else(local_date);
    run(session.ensure_link(exercise_id, &date)).ok()
}

/// Save the text fields of a set. Anything that does not read as a number
/// is saved as 0.
#[uniffi::export]
pub fn save_exercise_session(
    session: &Session,
    link_id: i64,
    weight: String,
    reps: String,
    set_count: String,
    notes: Option<String>,
    completed: bool,
) -> FfiResult<SaveResult> {
    let entry = SetEntry::from_text(&weight, &reps, &set_count, notes, completed);
    let outcome = run(session.save_set(link_id, &entry))?;
    Ok(outcome.into())
}

#[uniffi::export]
pub fn get_day_logs(session: &Session, date: Option<String>) -> FfiResult<Vec<DayLog>> {
    let date = date.unwrap_or_else(local_date);
    let logs = run(session.day_logs(&date))?;
    let mut logs: Vec<DayLog> = logs.into_values().map(DayLog::from).collect();
    logs.sort_by_key(|l| l.link_id);
    Ok(logs)
}

#[uniffi::export]
pub fn get_workout_session_details(session: &Session, link_id: i64) -> FfiResult<Option<DayLog>> {
    Ok(run(session.link(link_id))?.map(DayLog::from))
}

#[uniffi::export]
pub fn get_exercise_cards(session: &Session, date: Option<String>) -> FfiResult<Vec<ExerciseCard>> {
    let date = date.unwrap_or_else(local_date);
    let drafts = run(session.drafts_for_day(&date))?;
    Ok(drafts.into_iter().map(ExerciseCard::from).collect())
}

#[uniffi::export]
pub fn get_draft(
    session: &Session,
    exercise_id: i64,
    date: Option<String>,
) -> FfiResult<Option<DraftValues>> {
    let date = date.unwrap_or_else(local_date);
    Ok(run(session.draft_for(exercise_id, &date))?.map(DraftValues::from))
}

#[uniffi::export]
pub fn get_last_session_stats(
    session: &Session,
    exercise_id: i64,
) -> FfiResult<Option<Arc<HistoryEntry>>> {
    let last = run(session.last_history_for(exercise_id))?;
    Ok(last.map(|h| Arc::new(HistoryEntry::from(h))))
}

// Library

#[uniffi::export]
pub fn get_all_exercises(session: &Session) -> FfiResult<Vec<Arc<Exercise>>> {
    let exercises = run(session.all_exercises())?;
    Ok(exercises
        .into_iter()
        .map(|e| Arc::new(Exercise::from(e)))
        .collect())
}

#[uniffi::export]
pub fn add_exercise(
    session: &Session,
    name: String,
    muscle_group: Option<String>,
    notes: Option<String>,
) -> FfiResult<i64> {
    debug!("Adding exercise {}", name);
    run(session.add_exercise(&NewExercise {
        name,
        muscle_group,
        notes,
        ..Default::default()
    }))
}

#[uniffi::export]
pub fn delete_exercise(session: &Session, exercise_id: i64) -> FfiResult<bool> {
    run(session.delete_exercise(exercise_id))
}

#[uniffi::export]
pub fn update_exercise_notes(session: &Session, exercise_id: i64, notes: String) -> FfiResult<()> {
    run(session.update_exercise_notes(exercise_id, &notes))
}

#[uniffi::export]
pub fn update_exercise_defaults(
    session: &Session,
    exercise_id: i64,
    default_sets: Option<i64>,
    default_reps: Option<i64>,
) -> FfiResult<()> {
    run(session.update_exercise_defaults(exercise_id, default_sets, default_reps))
}

#[uniffi::export]
pub fn delete_history_by_date(session: &Session, date: String) -> FfiResult<u64> {
    run(session.delete_history_by_date(&date))
}

#[uniffi::export]
pub fn seed_fullbody_plan(session: &Session) -> FfiResult<i64> {
    run(session.seed_fullbody_plan())
}

// Stats

#[uniffi::export]
pub fn get_workout_counts(session: &Session) -> FfiResult<WorkoutCounts> {
    let on = today();
    run(async {
        Ok(WorkoutCounts {
            weekly: session.weekly_workout_count(on).await?,
            monthly: session.monthly_workout_count(on).await?,
        })
    })
}

#[uniffi::export]
pub fn get_volume_last_7_days(session: &Session) -> FfiResult<Vec<VolumeEntry>> {
    let points = run(session.volume_last_7())?;
    Ok(points.into_iter().map(VolumeEntry::from).collect())
}

/// Heaviest lifts first; all of them when `limit` is absent.
#[uniffi::export]
pub fn get_personal_records(
    session: &Session,
    limit: Option<i64>,
) -> FfiResult<Vec<PersonalRecordEntry>> {
    let records = match limit {
        Some(limit) => run(session.top_personal_records(limit))?,
        None => run(session.personal_records())?,
    };
    Ok(records.into_iter().map(PersonalRecordEntry::from).collect())
}

#[uniffi::export]
pub fn get_paginated_personal_records(
    session: &Session,
    limit: i64,
    offset: i64,
) -> FfiResult<Vec<PersonalRecordEntry>> {
    let records = run(session.personal_records_page(limit, offset))?;
    Ok(records.into_iter().map(PersonalRecordEntry::from).collect())
}

#[uniffi::export]
pub fn get_pr_count(session: &Session) -> FfiResult<i64> {
    run(session.personal_record_count())
}

#[uniffi::export]
pub fn get_muscles_trained_on_date(
    session: &Session,
    date: Option<String>,
) -> FfiResult<Vec<String>> {
    let date = date.unwrap_or_else(local_date);
    run(session.muscles_trained_on(&date))
}

#[uniffi::export]
pub fn get_workout_history(
    session: &Session,
    limit: i64,
    offset: i64,
) -> FfiResult<Vec<HistoryDay>> {
    let days = run(session.workout_history(limit, offset))?;
    Ok(days.into_iter().map(HistoryDay::from).collect())
}

#[uniffi::export]
pub fn get_workout_history_count(session: &Session) -> FfiResult<i64> {
    run(session.workout_history_count())
}

#[uniffi::export]
pub fn get_session_details(session: &Session, date: String) -> FfiResult<Vec<Arc<HistoryEntry>>> {
    let records = run(session.session_details(&date))?;
    Ok(records
        .into_iter()
        .map(|r| Arc::new(HistoryEntry::from(r)))
        .collect())
}

#[uniffi::export]
pub fn get_workout_dates(session: &Session) -> FfiResult<Vec<String>> {
    run(session.workout_dates())
}

#[uniffi::export]
pub fn get_exercise_history_data(
    session: &Session,
    exercise_id: i64,
) -> FfiResult<Vec<ProgressEntry>> {
    let points = run(session.exercise_progress(exercise_id))?;
    Ok(points.into_iter().map(ProgressEntry::from).collect())
}

#[uniffi::export]
pub fn get_body_stats_history(session: &Session) -> FfiResult<BodyStatChart> {
    Ok(run(session.body_stat_series())?.into())
}

#[uniffi::export]
pub fn get_latest_body_stats(session: &Session) -> FfiResult<Vec<BodyStat>> {
    let stats = run(session.latest_body_stats())?;
    Ok(stats.into_iter().map(BodyStat::from).collect())
}

#[uniffi::export]
pub fn get_latest_weight(session: &Session) -> FfiResult<Option<f64>> {
    run(session.latest_weight())
}

// Measurements

#[uniffi::export]
pub fn add_measurement(
    session: &Session,
    kind: String,
    value: f64,
    unit: Option<String>,
    date: Option<String>,
) -> FfiResult<i64> {
    run(session.add_measurement(&kind, value, unit.as_deref(), date.as_deref()))
}

#[uniffi::export]
pub fn get_measurement_history(session: &Session) -> FfiResult<Vec<MeasurementDayEntry>> {
    let days = run(session.measurement_history())?;
    Ok(days.into_iter().map(MeasurementDayEntry::from).collect())
}

#[uniffi::export]
pub fn get_last_measurement_date(session: &Session) -> FfiResult<Option<String>> {
    run(session.last_measurement_date())
}

#[uniffi::export]
pub fn delete_measurements_by_date(session: &Session, date: String) -> FfiResult<u64> {
    run(session.delete_measurements_on(&date))
}

// Plans

#[uniffi::export]
pub fn get_workout_plans(session: &Session) -> FfiResult<Vec<PlanSummary>> {
    let plans = run(session.list_plans())?;
    Ok(plans.into_iter().map(PlanSummary::from).collect())
}

#[uniffi::export]
pub fn create_workout_plan(session: &Session, name: String) -> FfiResult<i64> {
    run(session.create_plan(&name))
}

#[uniffi::export]
pub fn add_section_to_plan(
    session: &Session,
    plan_id: i64,
    title: String,
    order_index: i64,
) -> FfiResult<i64> {
    run(session.add_section(plan_id, &title, order_index))
}

#[uniffi::export]
pub fn add_exercise_to_section(
    session: &Session,
    section_id: i64,
    exercise_id: i64,
    order_index: i64,
) -> FfiResult<i64> {
    run(session.add_exercise_to_section(section_id, exercise_id, order_index))
}

#[uniffi::export]
pub fn create_plan_from_input(session: &Session, plan: PlanInput) -> FfiResult<i64> {
    run(session.create_plan_from_definition(&plan.into()))
}

/// Returns the id of the rebuilt plan.
#[uniffi::export]
pub fn replace_workout_plan(session: &Session, plan_id: i64, plan: PlanInput) -> FfiResult<i64> {
    run(session.replace_plan(plan_id, &plan.into()))
}

#[uniffi::export]
pub fn delete_workout_plan(session: &Session, plan_id: i64) -> FfiResult<bool> {
    run(session.delete_plan(plan_id))
}

#[uniffi::export]
pub fn get_plan_details(session: &Session, plan_id: i64) -> FfiResult<Option<PlanView>> {
    Ok(run(session.plan_details(plan_id))?.map(PlanView::from))
}

// Backup

#[uniffi::export]
pub fn export_database_to_json(session: &Session) -> FfiResult<String> {
    run(session.export_json())
}

#[uniffi::export]
pub fn import_json_to_database(session: &Session, json: String) -> FfiResult<ImportResult> {
    Ok(run(session.import_json(&json))?.into())
}
