use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

// Exercise library
#[derive(FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Exercise {
    pub id: i64,
    pub name: String,
    pub muscle_group: Option<String>,
    pub notes: Option<String>,
    pub default_sets: Option<i64>,
    pub default_reps: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct NewExercise {
    pub name: String,
    pub muscle_group: Option<String>,
    pub notes: Option<String>,
    pub default_sets: Option<i64>,
    pub default_reps: Option<i64>,
}

// Daily log
#[derive(FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WorkoutSession {
    pub id: i64,
    pub name: String,
    pub scheduled_date: Option<String>,
    pub status: Option<String>,
}

// Link between a daily log and one exercise, holding the draft values.
#[derive(FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SessionExercise {
    pub id: i64,
    pub workout_id: i64,
    pub exercise_id: i64,
    pub order_index: Option<i64>,
    pub notes: Option<String>,
    pub weight: f64,
    pub reps: i64,
    pub set_count: i64,
    pub is_completed: bool,
}

/// Values written by the set recorder.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetEntry {
    pub weight: f64,
    pub reps: i64,
    pub set_count: i64,
    pub notes: Option<String>,
    pub completed: bool,
}

impl SetEntry {
    /// Build an entry from raw text fields. Anything that does not parse as a
    /// number counts as 0.
    pub fn from_text(
        weight: &str,
        reps: &str,
        set_count: &str,
        notes: Option<String>,
        completed: bool,
    ) -> Self {
        Self {
            weight: parse_weight(weight),
            reps: parse_count(reps),
            set_count: parse_count(set_count),
            notes,
            completed,
        }
    }

    /// The entry as it is stored: non-finite weight becomes 0, missing notes
    /// become the empty string.
    pub fn coerced(&self) -> (f64, i64, i64, String) {
        let weight = if self.weight.is_finite() { self.weight } else { 0.0 };
        (
            weight,
            self.reps,
            self.set_count,
            self.notes.clone().unwrap_or_default(),
        )
    }
}

pub fn parse_weight(text: &str) -> f64 {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|w| w.is_finite())
        .unwrap_or(0.0)
}

/// Integer fields accept a leading integer ("8 reps" → 8) the way a numeric
/// keypad field is read; anything else is 0.
pub fn parse_count(text: &str) -> i64 {
    let trimmed = text.trim();
    let end = trimmed
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());
    trimmed[..end].parse::<i64>().unwrap_or(0)
}

// Archived fact of a completed exercise on a given date.
#[derive(FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    pub id: i64,
    pub workout_date: String,
    pub exercise_name: String,
    pub muscle_group: Option<String>,
    pub weight: Option<f64>,
    pub reps: Option<i64>,
    pub sets: Option<i64>,
    pub notes: Option<String>,
}

impl fmt::Display for HistoryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {:.1}kg x {} reps x {} sets",
            self.workout_date,
            self.exercise_name,
            self.weight.unwrap_or(0.0),
            self.reps.unwrap_or(0),
            self.sets.unwrap_or(0)
        )?;
        match self.notes.as_deref() {
            Some(notes) if !notes.is_empty() => write!(f, " ({})", notes),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewHistoryRecord {
    pub workout_date: String,
    pub exercise_name: String,
    pub muscle_group: Option<String>,
    pub weight: f64,
    pub reps: i64,
    pub sets: i64,
    pub notes: String,
}

// Body measurements
#[derive(FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Measurement {
    pub id: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    pub value: f64,
    pub unit: Option<String>,
    pub date: String,
}

// Plans
#[derive(FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WorkoutPlan {
    pub id: i64,
    pub name: String,
}

#[derive(FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PlanSection {
    pub id: i64,
    pub plan_id: i64,
    pub title: Option<String>,
    pub order_index: Option<i64>,
}

#[derive(FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PlanExercise {
    pub id: i64,
    pub section_id: i64,
    pub exercise_id: i64,
    pub order_index: Option<i64>,
}
