use fitlog::db::models::{NewExercise, SetEntry};
use fitlog::session::{HistoryMirror, PlanDefinition, SectionDefinition, Session};

async fn add(session: &Session, name: &str, muscle: &str) -> i64 {
    session
        .add_exercise(&NewExercise {
            name: name.to_string(),
            muscle_group: Some(muscle.to_string()),
            ..Default::default()
        })
        .await
        .unwrap()
}

async fn complete(session: &Session, exercise_id: i64, date: &str, weight: f64, reps: i64) {
    let link = session.ensure_link(exercise_id, date).await.unwrap();
    let entry = SetEntry {
        weight,
        reps,
        set_count: 3,
        notes: None,
        completed: true,
    };
    let outcome = session.save_set(link, &entry).await.unwrap();
    assert!(matches!(outcome.history, HistoryMirror::Archived { .. }));
}

#[tokio::test]
async fn logged_day_carries_into_the_next() {
    let session = Session::in_memory().await.unwrap();
    let squat = add(&session, "Squat", "Legs").await;

    let link = session.ensure_link(squat, "2024-03-04").await.unwrap();
    assert_eq!(session.ensure_link(squat, "2024-03-04").await.unwrap(), link);

    complete(&session, squat, "2024-03-04", 80.0, 5).await;
    complete(&session, squat, "2024-03-04", 85.0, 5).await;

    let details = session.session_details("2024-03-04").await.unwrap();
    assert_eq!(details.len(), 1);
    assert_eq!(details[0].weight, Some(85.0));

    let draft = session.draft_for(squat, "2024-03-05").await.unwrap().unwrap();
    assert_eq!(draft.weight, Some(85.0));
    assert_eq!(draft.reps, Some(5));
    assert_eq!(draft.sets, Some(3));
}

#[tokio::test]
async fn records_survive_insert_order() {
    let session = Session::in_memory().await.unwrap();
    let bench = add(&session, "Bench Press", "Chest").await;

    complete(&session, bench, "2024-03-06", 100.0, 5).await;
    complete(&session, bench, "2024-03-01", 110.0, 3).await;
    complete(&session, bench, "2024-03-03", 105.0, 4).await;

    let records = session.personal_records().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].max_weight, 110.0);

    let history = session.workout_history(10, 0).await.unwrap();
    let dates: Vec<&str> = history.iter().map(|d| d.date.as_str()).collect();
    assert_eq!(dates, ["2024-03-06", "2024-03-03", "2024-03-01"]);
}

#[tokio::test]
async fn backup_restores_into_a_fresh_database() {
    let source = Session::in_memory().await.unwrap();
    let row = add(&source, "Seated Row", "Back").await;
    complete(&source, row, "2024-02-10", 60.0, 10).await;
    source
        .add_measurement("weight", 81.5, None, Some("2024-02-10"))
        .await
        .unwrap();
    source
        .create_plan_from_definition(&PlanDefinition {
            name: "Pull".into(),
            sections: vec![SectionDefinition {
                title: "Back".into(),
                exercise_ids: vec![row],
            }],
        })
        .await
        .unwrap();

    let json = source.export_json().await.unwrap();

    let target = Session::in_memory().await.unwrap();
    add(&target, "Leftover", "Arms").await;
    let summary = target.import_json(&json).await.unwrap();
    assert!(summary.skipped_columns.is_empty());

    assert_eq!(
        target.export_snapshot().await.unwrap().history,
        source.export_snapshot().await.unwrap().history
    );
    let names: Vec<String> = target
        .all_exercises()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, ["Seated Row"]);
    assert_eq!(target.latest_weight().await.unwrap(), Some(81.5));

    let plans = target.list_plans().await.unwrap();
    let details = target.plan_details(plans[0].id).await.unwrap().unwrap();
    assert_eq!(details.sections[0].exercises[0].exercise.id, row);
}

#[tokio::test]
async fn rejected_backup_keeps_existing_data() {
    let session = Session::in_memory().await.unwrap();
    let curl = add(&session, "Curl", "Arms").await;
    complete(&session, curl, "2024-01-02", 15.0, 12).await;

    assert!(session.import_json("{\"history\": []}").await.is_err());
    assert!(session.import_json("not json").await.is_err());

    assert_eq!(session.workout_history_count().await.unwrap(), 1);
    assert_eq!(session.all_exercises().await.unwrap().len(), 1);
}

#[tokio::test]
async fn database_file_persists_between_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fitlog.db");
    let path = path.to_str().unwrap();

    let session = Session::new(path).await.unwrap();
    let press = add(&session, "Overhead Press", "Shoulders").await;
    complete(&session, press, "2024-04-01", 40.0, 8).await;
    session.db_pool.close().await;

    let reopened = Session::new(path).await.unwrap();
    let report = reopened.ensure_schema().await.unwrap();
    assert!(report.is_clean());
    assert!(report.applied.is_empty());
    assert_eq!(reopened.workout_dates().await.unwrap(), ["2024-04-01"]);
    assert_eq!(
        reopened.last_history_for(press).await.unwrap().unwrap().weight,
        Some(40.0)
    );
}

#[tokio::test]
async fn history_outranks_exercise_defaults() {
    let session = Session::in_memory().await.unwrap();
    let lunge = add(&session, "Lunge", "Legs").await;
    session
        .update_exercise_defaults(lunge, Some(4), Some(12))
        .await
        .unwrap();

    let fresh = session.draft_for(lunge, "2024-05-01").await.unwrap().unwrap();
    assert_eq!((fresh.weight, fresh.reps, fresh.sets), (None, Some(12), Some(4)));

    complete(&session, lunge, "2024-05-01", 20.0, 10).await;
    let next = session.draft_for(lunge, "2024-05-02").await.unwrap().unwrap();
    assert_eq!((next.weight, next.reps, next.sets), (Some(20.0), Some(10), Some(3)));
}

#[tokio::test]
async fn week_starts_on_monday() {
    let session = Session::in_memory().await.unwrap();
    let dip = add(&session, "Dip", "Chest").await;
    // Sunday, then Monday and Wednesday of the following week.
    for date in ["2024-01-07", "2024-01-08", "2024-01-10"] {
        complete(&session, dip, date, 0.0, 10).await;
    }

    let wednesday = chrono::NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
    assert_eq!(session.weekly_workout_count(wednesday).await.unwrap(), 2);
    assert_eq!(session.monthly_workout_count(wednesday).await.unwrap(), 3);
}
