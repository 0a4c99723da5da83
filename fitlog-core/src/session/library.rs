use crate::db::models::{Exercise, NewExercise};
use crate::db::operations::{
    delete_exercise, delete_history_by_date, delete_plan_exercises_for_exercise, get_all_exercises,
    get_exercise, insert_exercise, update_exercise_defaults, update_exercise_notes,
};
use crate::session::Session;
use crate::session::plans::{PlanDefinition, SectionDefinition, insert_definition};
use anyhow::{Result, anyhow};
use log::{debug, info};

// (name, muscle group, notes, default sets, default reps)
const FULLBODY_LIBRARY: &[(&str, &str, &str, i64, i64)] = &[
    ("Leg Press", "Legs", "10-12 reps", 3, 11),
    ("Leg Curl (Hamstring)", "Legs", "12-15 reps", 3, 14),
    ("Incline Dumbbell Press", "Chest", "8-10 reps, slow negatives", 3, 9),
    ("Lat Pull Down", "Back", "10-12 reps", 3, 10),
    ("Flat Bench Press", "Chest", "8-10 reps, 2s pause", 3, 8),
    ("Seated Row Machine", "Back", "10-12 reps", 3, 11),
    ("Shoulder Press", "Shoulders", "8-10 reps", 3, 10),
    ("Dips", "Chest", "To failure", 3, 10),
    ("Butterfly", "Chest", "12-15 reps", 3, 13),
    ("Lateral Raise", "Shoulders", "12-15 reps", 3, 15),
    ("Rear Delt Machine", "Shoulders", "15-20 reps", 3, 16),
    ("Rope Push Down", "Arms", "12-15 reps", 3, 13),
    ("Overhead Extension Machine", "Arms", "10-12 reps", 3, 10),
    ("Hammer Curl", "Arms", "10-12 reps", 3, 12),
    ("Zottman Curl", "Arms", "10-12 reps", 3, 12),
    ("Cable Crunch", "Core", "10-15 reps", 3, 13),
    ("Hanging Leg Raises", "Core", "8-12 reps", 3, 9),
    ("Plank", "Core", "Hold until shaking (seconds)", 3, 60),
    ("Russian Twist", "Core", "15-20 per side", 3, 15),
];

const FULLBODY_SECTIONS: &[(&str, &[&str])] = &[
    ("Legs", &["Leg Press", "Leg Curl (Hamstring)"]),
    (
        "Push & Pull",
        &[
            "Incline Dumbbell Press",
            "Lat Pull Down",
            "Flat Bench Press",
            "Seated Row Machine",
            "Shoulder Press",
        ],
    ),
    (
        "Isolation & Detail",
        &["Dips", "Butterfly", "Lateral Raise", "Rear Delt Machine"],
    ),
    (
        "Arms",
        &[
            "Rope Push Down",
            "Overhead Extension Machine",
            "Hammer Curl",
            "Zottman Curl",
        ],
    ),
    (
        "Core",
        &["Cable Crunch", "Hanging Leg Raises", "Plank", "Russian Twist"],
    ),
];

impl Session {
    pub async fn add_exercise(&self, exercise: &NewExercise) -> Result<i64> {
        if exercise.name.trim().is_empty() {
            return Err(anyhow!("Exercise name must not be empty"));
        }
        let _writer = self.writer().await;
        let mut conn = self.conn().await?;
        let id = insert_exercise(&mut conn, exercise).await?;
        debug!("Added exercise {} ({})", exercise.name, id);
        Ok(id)
    }

    /// The whole library, by name.
    pub async fn all_exercises(&self) -> Result<Vec<Exercise>> {
        let mut conn = self.conn().await?;
        get_all_exercises(&mut conn).await
    }

    pub async fn exercise(&self, exercise_id: i64) -> Result<Option<Exercise>> {
        let mut conn = self.conn().await?;
        get_exercise(&mut conn, exercise_id).await
    }

    /// Remove an exercise and the plan entries that point at it. History
    /// keeps its own copy of the name and is left alone. Returns whether the
    /// exercise existed.
    pub async fn delete_exercise(&self, exercise_id: i64) -> Result<bool> {
        let _writer = self.writer().await;
        let mut tx = self.db_pool.begin().await?;
        let entries = delete_plan_exercises_for_exercise(&mut tx, exercise_id).await?;
        let deleted = delete_exercise(&mut tx, exercise_id).await?;
        tx.commit().await?;
        debug!(
            "Deleted exercise {} ({} plan entries)",
            exercise_id, entries
        );
        Ok(deleted > 0)
    }

    pub async fn update_exercise_notes(&self, exercise_id: i64, notes: &str) -> Result<()> {
        let _writer = self.writer().await;
        let mut conn = self.conn().await?;
        if update_exercise_notes(&mut conn, exercise_id, notes).await? == 0 {
            return Err(anyhow!("No exercise with id {}", exercise_id));
        }
        Ok(())
    }

    /// Set the set/rep hints used when there is no history to fall back on.
    pub async fn update_exercise_defaults(
        &self,
        exercise_id: i64,
        default_sets: Option<i64>,
        default_reps: Option<i64>,
    ) -> Result<()> {
        let _writer = self.writer().await;
        let mut conn = self.conn().await?;
        let updated =
            update_exercise_defaults(&mut conn, exercise_id, default_sets, default_reps).await?;
        if updated == 0 {
            return Err(anyhow!("No exercise with id {}", exercise_id));
        }
        Ok(())
    }

    /// Forget every archived record of one day. Returns the number removed.
    pub async fn delete_history_by_date(&self, date: &str) -> Result<u64> {
        let _writer = self.writer().await;
        let mut conn = self.conn().await?;
        let removed = delete_history_by_date(&mut conn, date).await?;
        info!("Deleted {} history records for {}", removed, date);
        Ok(removed)
    }

    /// Insert the built-in exercise library and the "Fullbody" plan built
    /// from it. Returns the plan id.
    pub async fn seed_fullbody_plan(&self) -> Result<i64> {
        let _writer = self.writer().await;
        let mut tx = self.db_pool.begin().await?;

        let mut ids = Vec::with_capacity(FULLBODY_LIBRARY.len());
        for &(name, muscle, notes, sets, reps) in FULLBODY_LIBRARY {
            let exercise = NewExercise {
                name: name.to_string(),
                muscle_group: Some(muscle.to_string()),
                notes: Some(notes.to_string()),
                default_sets: Some(sets),
                default_reps: Some(reps),
            };
            ids.push((name, insert_exercise(&mut tx, &exercise).await?));
        }

        let sections = FULLBODY_SECTIONS
            .iter()
            .map(|&(title, names)| SectionDefinition {
                title: title.to_string(),
                exercise_ids: names
                    .iter()
                    .filter_map(|n| ids.iter().find(|(name, _)| name == n).map(|(_, id)| *id))
                    .collect(),
            })
            .collect();
        let definition = PlanDefinition {
            name: "Fullbody".to_string(),
            sections,
        };
        let plan_id = insert_definition(&mut tx, &definition).await?;
        tx.commit().await?;

        info!(
            "Seeded {} exercises and plan {}",
            FULLBODY_LIBRARY.len(),
            plan_id
        );
        Ok(plan_id)
    }
}
