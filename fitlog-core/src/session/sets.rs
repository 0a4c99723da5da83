use crate::db::models::{NewHistoryRecord, SetEntry};
use crate::db::operations::{get_link_archive_target, replace_history_record, update_link_values};
use crate::session::Session;
use anyhow::{Context, Result, anyhow};
use log::{debug, warn};
use sqlx::Connection;
use sqlx::sqlite::SqliteConnection;

/// What happened to the history mirror during a save.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryMirror {
    /// The set was saved as a draft only.
    Skipped,
    Archived { history_id: i64 },
    /// The draft was saved but could not be archived.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome {
    pub link_id: i64,
    pub history: HistoryMirror,
}

impl Session {
    /// Save the draft values of a link and, when `entry.completed` is set,
    /// replace the history record for that day and exercise.
    ///
    /// The draft write stands even if archiving fails; the failure is
    /// reported in [`SaveOutcome::history`].
    pub async fn save_set(&self, link_id: i64, entry: &SetEntry) -> Result<SaveOutcome> {
        let (weight, reps, set_count, notes) = entry.coerced();
        let _writer = self.writer().await;
        let mut conn = self.conn().await?;

        let updated = update_link_values(
            &mut conn,
            link_id,
            weight,
            reps,
            set_count,
            &notes,
            entry.completed,
        )
        .await
        .with_context(|| format!("Failed to save set for link {}", link_id))?;
        if updated == 0 {
            return Err(anyhow!("No session exercise with id {}", link_id));
        }
        debug!(
            "Saved link {}: {}kg x {} x {} completed={}",
            link_id, weight, reps, set_count, entry.completed
        );

        if !entry.completed {
            return Ok(SaveOutcome {
                link_id,
                history: HistoryMirror::Skipped,
            });
        }

        let history = match archive_link(&mut conn, link_id, weight, reps, set_count, notes).await {
            Ok(history_id) => HistoryMirror::Archived { history_id },
            Err(e) => {
                warn!("Draft {} saved but not archived: {:#}", link_id, e);
                HistoryMirror::Failed(format!("{:#}", e))
            }
        };
        Ok(SaveOutcome { link_id, history })
    }
}

async fn archive_link(
    conn: &mut SqliteConnection,
    link_id: i64,
    weight: f64,
    reps: i64,
    sets: i64,
    notes: String,
) -> Result<i64> {
    let target = get_link_archive_target(conn, link_id)
        .await?
        .ok_or_else(|| anyhow!("Link {} has no exercise or daily log", link_id))?;
    let workout_date = target
        .workout_date
        .filter(|d| !d.is_empty())
        .ok_or_else(|| anyhow!("Daily log for link {} has no date", link_id))?;

    let record = NewHistoryRecord {
        workout_date,
        exercise_name: target.exercise_name,
        muscle_group: target.muscle_group,
        weight,
        reps,
        sets,
        notes,
    };

    let mut tx = conn.begin().await?;
    let history_id = replace_history_record(&mut tx, &record).await?;
    tx.commit().await?;
    debug!(
        "Archived {} on {} as history {}",
        record.exercise_name, record.workout_date, history_id
    );
    Ok(history_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::NewExercise;

    async fn link_for(session: &Session, name: &str, date: &str) -> i64 {
        let id = session
            .add_exercise(&NewExercise {
                name: name.into(),
                muscle_group: Some("Legs".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        session.ensure_link(id, date).await.unwrap()
    }

    fn entry(weight: f64, completed: bool) -> SetEntry {
        SetEntry {
            weight,
            reps: 10,
            set_count: 3,
            notes: Some("ok".into()),
            completed,
        }
    }

    #[tokio::test]
    async fn draft_save_does_not_touch_history() {
        let session = Session::in_memory().await.unwrap();
        let link = link_for(&session, "Squat", "2024-01-01").await;

        let outcome = session.save_set(link, &entry(80.0, false)).await.unwrap();
        assert_eq!(outcome.history, HistoryMirror::Skipped);

        let saved = session.link(link).await.unwrap().unwrap();
        assert_eq!(saved.weight, 80.0);
        assert_eq!(saved.set_count, 3);
        assert_eq!(saved.notes.as_deref(), Some("ok"));
        assert!(session.session_details("2024-01-01").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn completing_twice_keeps_one_history_record() {
        let session = Session::in_memory().await.unwrap();
        let link = link_for(&session, "Squat", "2024-01-01").await;

        session.save_set(link, &entry(80.0, true)).await.unwrap();
        let outcome = session.save_set(link, &entry(85.0, true)).await.unwrap();
        assert!(matches!(outcome.history, HistoryMirror::Archived { .. }));

        let records = session.session_details("2024-01-01").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].exercise_name, "Squat");
        assert_eq!(records[0].weight, Some(85.0));
        assert_eq!(records[0].muscle_group.as_deref(), Some("Legs"));
    }

    #[tokio::test]
    async fn nan_weight_is_saved_as_zero() {
        let session = Session::in_memory().await.unwrap();
        let link = link_for(&session, "Squat", "2024-01-01").await;

        let mut values = entry(f64::NAN, false);
        values.notes = None;
        session.save_set(link, &values).await.unwrap();

        let saved = session.link(link).await.unwrap().unwrap();
        assert_eq!(saved.weight, 0.0);
        assert_eq!(saved.notes.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn unknown_link_is_an_error() {
        let session = Session::in_memory().await.unwrap();
        assert!(session.save_set(42, &entry(80.0, true)).await.is_err());
    }

    #[tokio::test]
    async fn draft_survives_failed_archive() {
        let session = Session::in_memory().await.unwrap();
        let link = link_for(&session, "Squat", "2024-01-01").await;

        // Remove the exercise so the link can no longer be resolved.
        {
            let mut conn = session.conn().await.unwrap();
            sqlx::query("DELETE FROM exercises")
                .execute(&mut *conn)
                .await
                .unwrap();
        }

        let outcome = session.save_set(link, &entry(90.0, true)).await.unwrap();
        assert!(matches!(outcome.history, HistoryMirror::Failed(_)));

        let saved = session.link(link).await.unwrap().unwrap();
        assert_eq!(saved.weight, 90.0);
        assert!(saved.is_completed);
    }
}
