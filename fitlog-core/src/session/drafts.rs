//! Ghost-set defaults.
//!
//! When a link has no value for a field yet, the screen shows a suggestion
//! instead: the last archived value for the exercise, then the exercise's
//! own hint, then nothing. Each field falls back on its own.

use crate::db::models::{Exercise, HistoryRecord, SessionExercise};
use crate::db::operations::{
    get_all_exercises, get_exercise, get_last_history_for_name, get_links_for_date,
};
use crate::session::Session;
use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Draft {
    pub weight: Option<f64>,
    pub reps: Option<i64>,
    pub sets: Option<i64>,
    pub notes: String,
}

/// One library exercise as the active-workout screen sees it for a day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseDraft {
    pub exercise: Exercise,
    pub link: Option<SessionExercise>,
    pub draft: Draft,
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.is_empty())
}

/// Resolve display values for `exercise`. `current` is the day's link, if
/// any, and `last` the most recent history record for the exercise name.
/// Zero in the link means "not entered yet".
pub fn resolve_draft(
    exercise: &Exercise,
    current: Option<&SessionExercise>,
    last: Option<&HistoryRecord>,
) -> Draft {
    let weight = current
        .map(|c| c.weight)
        .filter(|w| *w > 0.0)
        .or_else(|| last.and_then(|h| h.weight));

    let reps = current
        .map(|c| c.reps)
        .filter(|r| *r > 0)
        .or_else(|| last.and_then(|h| h.reps))
        .or(exercise.default_reps.filter(|r| *r > 0));

    let sets = current
        .map(|c| c.set_count)
        .filter(|s| *s > 0)
        .or_else(|| last.and_then(|h| h.sets))
        .or(exercise.default_sets.filter(|s| *s > 0));

    let notes = non_empty(current.and_then(|c| c.notes.as_deref()))
        .or_else(|| non_empty(last.and_then(|h| h.notes.as_deref())))
        .or_else(|| non_empty(exercise.notes.as_deref()))
        .unwrap_or_default()
        .to_string();

    Draft {
        weight,
        reps,
        sets,
        notes,
    }
}

impl Session {
    /// The ghost-set source for an exercise: its latest history record.
    pub async fn last_history_for(&self, exercise_id: i64) -> Result<Option<HistoryRecord>> {
        let mut conn = self.conn().await?;
        let Some(exercise) = get_exercise(&mut conn, exercise_id).await? else {
            return Ok(None);
        };
        get_last_history_for_name(&mut conn, &exercise.name).await
    }

    /// Display values for one exercise on `date`, or `None` if the exercise
    /// does not exist.
    pub async fn draft_for(&self, exercise_id: i64, date: &str) -> Result<Option<Draft>> {
        let mut conn = self.conn().await?;
        let Some(exercise) = get_exercise(&mut conn, exercise_id).await? else {
            return Ok(None);
        };
        let current = get_links_for_date(&mut conn, date)
            .await?
            .into_iter()
            .rfind(|l| l.exercise_id == exercise_id);
        let last = get_last_history_for_name(&mut conn, &exercise.name).await?;
        Ok(Some(resolve_draft(&exercise, current.as_ref(), last.as_ref())))
    }

    /// Display values for every library exercise on `date`, by name.
    pub async fn drafts_for_day(&self, date: &str) -> Result<Vec<ExerciseDraft>> {
        let mut conn = self.conn().await?;
        let exercises = get_all_exercises(&mut conn).await?;
        let mut links: HashMap<i64, SessionExercise> = get_links_for_date(&mut conn, date)
            .await?
            .into_iter()
            .map(|l| (l.exercise_id, l))
            .collect();

        let mut drafts = Vec::with_capacity(exercises.len());
        for exercise in exercises {
            let link = links.remove(&exercise.id);
            let last = get_last_history_for_name(&mut conn, &exercise.name).await?;
            let draft = resolve_draft(&exercise, link.as_ref(), last.as_ref());
            drafts.push(ExerciseDraft {
                exercise,
                link,
                draft,
            });
        }
        Ok(drafts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{NewExercise, SetEntry};

    fn exercise() -> Exercise {
        Exercise {
            id: 1,
            name: "Squat".into(),
            muscle_group: Some("Legs".into()),
            notes: Some("brace".into()),
            default_sets: Some(3),
            default_reps: Some(10),
        }
    }

    fn link(weight: f64, reps: i64, set_count: i64, notes: Option<&str>) -> SessionExercise {
        SessionExercise {
            id: 7,
            workout_id: 1,
            exercise_id: 1,
            order_index: Some(0),
            notes: notes.map(String::from),
            weight,
            reps,
            set_count,
            is_completed: false,
        }
    }

    fn history(weight: f64, reps: i64, sets: i64, notes: Option<&str>) -> HistoryRecord {
        HistoryRecord {
            id: 3,
            workout_date: "2024-01-01".into(),
            exercise_name: "Squat".into(),
            muscle_group: Some("Legs".into()),
            weight: Some(weight),
            reps: Some(reps),
            sets: Some(sets),
            notes: notes.map(String::from),
        }
    }

    #[test]
    fn history_outranks_exercise_defaults() {
        let draft = resolve_draft(&exercise(), None, Some(&history(100.0, 8, 4, None)));
        assert_eq!(draft.weight, Some(100.0));
        assert_eq!(draft.reps, Some(8));
        assert_eq!(draft.sets, Some(4));
        assert_eq!(draft.notes, "brace");
    }

    #[test]
    fn current_values_win_field_by_field() {
        let current = link(120.0, 0, 5, Some("felt strong"));
        let draft = resolve_draft(
            &exercise(),
            Some(&current),
            Some(&history(100.0, 8, 4, Some("old note"))),
        );
        assert_eq!(draft.weight, Some(120.0));
        assert_eq!(draft.reps, Some(8));
        assert_eq!(draft.sets, Some(5));
        assert_eq!(draft.notes, "felt strong");
    }

    #[test]
    fn falls_back_to_hints_then_nothing() {
        let zeroed = link(0.0, 0, 0, Some(""));
        let draft = resolve_draft(&exercise(), Some(&zeroed), None);
        assert_eq!(draft.weight, None);
        assert_eq!(draft.reps, Some(10));
        assert_eq!(draft.sets, Some(3));
        assert_eq!(draft.notes, "brace");

        let bare = Exercise {
            notes: None,
            default_sets: None,
            default_reps: None,
            ..exercise()
        };
        assert_eq!(resolve_draft(&bare, None, None), Draft::default());
    }

    #[test]
    fn history_note_beats_exercise_note() {
        let draft = resolve_draft(&exercise(), None, Some(&history(100.0, 8, 4, Some("belt"))));
        assert_eq!(draft.notes, "belt");
    }

    #[test]
    fn resolution_is_deterministic() {
        let last = history(100.0, 8, 4, Some("belt"));
        let a = resolve_draft(&exercise(), None, Some(&last));
        let b = resolve_draft(&exercise(), None, Some(&last));
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn draft_uses_latest_history_by_date_then_id() {
        let session = Session::in_memory().await.unwrap();
        let id = session
            .add_exercise(&NewExercise {
                name: "Squat".into(),
                default_sets: Some(3),
                default_reps: Some(10),
                ..Default::default()
            })
            .await
            .unwrap();

        for (date, weight) in [("2024-01-08", 110.0), ("2024-01-01", 100.0)] {
            let link = session.ensure_link(id, date).await.unwrap();
            session
                .save_set(
                    link,
                    &SetEntry {
                        weight,
                        reps: 8,
                        set_count: 4,
                        notes: None,
                        completed: true,
                    },
                )
                .await
                .unwrap();
        }

        let draft = session.draft_for(id, "2024-01-15").await.unwrap().unwrap();
        assert_eq!(draft.weight, Some(110.0));
        assert_eq!(draft.sets, Some(4));
        assert!(session.draft_for(id + 1, "2024-01-15").await.unwrap().is_none());

        let day = session.drafts_for_day("2024-01-08").await.unwrap();
        assert_eq!(day.len(), 1);
        assert!(day[0].link.as_ref().is_some_and(|l| l.is_completed));
    }
}
