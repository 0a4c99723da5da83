//! Daily log and link management.

use crate::dates::parse_date;
use crate::db::models::{SessionExercise, WorkoutSession};
use crate::db::operations::{
    create_daily_log, create_link, find_link, find_workout_by_date, get_all_workout_sessions,
    get_exercise, get_link, get_links_for_date,
};
use crate::session::Session;
use anyhow::{Result, anyhow};
use log::debug;
use std::collections::HashMap;

impl Session {
    /// Find or create the daily log for `date` and its link to `exercise_id`,
    /// returning the link id. Calling it again with the same arguments
    /// returns the same id and creates nothing.
    pub async fn ensure_link(&self, exercise_id: i64, date: &str) -> Result<i64> {
        parse_date(date)?;
        let _writer = self.writer().await;
        let mut tx = self.db_pool.begin().await?;

        if get_exercise(&mut tx, exercise_id).await?.is_none() {
            return Err(anyhow!("No exercise with id {}", exercise_id));
        }

        let workout_id = match find_workout_by_date(&mut tx, date).await? {
            Some(workout) => workout.id,
            None => {
                let id = create_daily_log(&mut tx, date).await?;
                debug!("Created daily log {} for {}", id, date);
                id
            }
        };

        let link_id = match find_link(&mut tx, workout_id, exercise_id).await? {
            Some(id) => id,
            None => {
                let id = create_link(&mut tx, workout_id, exercise_id).await?;
                debug!(
                    "Linked exercise {} to daily log {} as {}",
                    exercise_id, workout_id, id
                );
                id
            }
        };

        tx.commit().await?;
        Ok(link_id)
    }

    /// Every link logged on `date`, keyed by exercise id.
    pub async fn day_logs(&self, date: &str) -> Result<HashMap<i64, SessionExercise>> {
        let mut conn = self.conn().await?;
        let links = get_links_for_date(&mut conn, date).await?;
        Ok(links.into_iter().map(|l| (l.exercise_id, l)).collect())
    }

    pub async fn link(&self, link_id: i64) -> Result<Option<SessionExercise>> {
        let mut conn = self.conn().await?;
        get_link(&mut conn, link_id).await
    }

    pub async fn daily_log(&self, date: &str) -> Result<Option<WorkoutSession>> {
        let mut conn = self.conn().await?;
        find_workout_by_date(&mut conn, date).await
    }

    pub async fn all_daily_logs(&self) -> Result<Vec<WorkoutSession>> {
        let mut conn = self.conn().await?;
        get_all_workout_sessions(&mut conn).await
    }
}

#[cfg(test)]
mod tests {
    use crate::db::models::NewExercise;
    use crate::session::Session;

    async fn session_with_exercise() -> (Session, i64) {
        let session = Session::in_memory().await.unwrap();
        let id = session
            .add_exercise(&NewExercise {
                name: "Squat".into(),
                muscle_group: Some("Legs".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        (session, id)
    }

    #[tokio::test]
    async fn ensure_link_is_idempotent() {
        let (session, exercise_id) = session_with_exercise().await;

        let first = session.ensure_link(exercise_id, "2024-01-01").await.unwrap();
        let second = session.ensure_link(exercise_id, "2024-01-01").await.unwrap();
        assert_eq!(first, second);

        let mut conn = session.conn().await.unwrap();
        let sessions: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM workouts WHERE scheduled_date = '2024-01-01'")
                .fetch_one(&mut *conn)
                .await
                .unwrap();
        let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM workout_exercises")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(sessions, 1);
        assert_eq!(links, 1);
    }

    #[tokio::test]
    async fn different_days_get_different_links() {
        let (session, exercise_id) = session_with_exercise().await;

        let monday = session.ensure_link(exercise_id, "2024-01-08").await.unwrap();
        let tuesday = session.ensure_link(exercise_id, "2024-01-09").await.unwrap();
        assert_ne!(monday, tuesday);
        assert_eq!(session.all_daily_logs().await.unwrap().len(), 2);

        let log = session.daily_log("2024-01-08").await.unwrap().unwrap();
        assert_eq!(log.name, "Daily Log");
        assert_eq!(log.status.as_deref(), Some("pending"));
    }

    #[tokio::test]
    async fn new_links_start_zeroed_and_ordered() {
        let (session, squat) = session_with_exercise().await;
        let bench = session
            .add_exercise(&NewExercise {
                name: "Bench".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        session.ensure_link(squat, "2024-01-08").await.unwrap();
        let bench_link = session.ensure_link(bench, "2024-01-08").await.unwrap();

        let link = session.link(bench_link).await.unwrap().unwrap();
        assert_eq!(link.order_index, Some(1));
        assert_eq!(link.weight, 0.0);
        assert_eq!(link.reps, 0);
        assert!(!link.is_completed);

        let logs = session.day_logs("2024-01-08").await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[&bench].id, bench_link);
    }

    #[tokio::test]
    async fn unknown_exercise_or_bad_date_fails() {
        let (session, exercise_id) = session_with_exercise().await;
        assert!(session.ensure_link(exercise_id + 100, "2024-01-01").await.is_err());
        assert!(session.ensure_link(exercise_id, "01/01/2024").await.is_err());
        assert!(session.all_daily_logs().await.unwrap().is_empty());
    }
}
