use std::sync::Arc;

use crate::db;
use crate::session::{
    BodyStatSeries, DaySummary, Draft, ExerciseDraft, HistoryMirror, ImportSummary, LatestStat,
    MeasurementDay, PersonalRecord, PlanDefinition, PlanDetails, ProgressPoint, SaveOutcome,
    SectionDefinition, VolumePoint,
};

#[derive(uniffi::Object)]
pub struct Exercise {
    id: i64,
    name: String,
    muscle_group: Option<String>,
    notes: Option<String>,
    default_sets: Option<i64>,
    default_reps: Option<i64>,
}

#[uniffi::export]
impl Exercise {
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> String {
        self.name.clone()
    }

    pub fn muscle_group(&self) -> Option<String> {
        self.muscle_group.clone()
    }

    pub fn notes(&self) -> Option<String> {
        self.notes.clone()
    }

    pub fn default_sets(&self) -> Option<i64> {
        self.default_sets
    }

    pub fn default_reps(&self) -> Option<i64> {
        self.default_reps
    }
}

impl From<db::models::Exercise> for Exercise {
    fn from(e: db::models::Exercise) -> Self {
        Exercise {
            id: e.id,
            name: e.name,
            muscle_group: e.muscle_group,
            notes: e.notes,
            default_sets: e.default_sets,
            default_reps: e.default_reps,
        }
    }
}

/// An archived, completed exercise.
#[derive(uniffi::Object)]
pub struct HistoryEntry {
    record: db::models::HistoryRecord,
}

#[uniffi::export]
impl HistoryEntry {
    pub fn id(&self) -> i64 {
        self.record.id
    }

    pub fn workout_date(&self) -> String {
        self.record.workout_date.clone()
    }

    pub fn exercise_name(&self) -> String {
        self.record.exercise_name.clone()
    }

    pub fn muscle_group(&self) -> Option<String> {
        self.record.muscle_group.clone()
    }

    pub fn weight(&self) -> Option<f64> {
        self.record.weight
    }

    pub fn reps(&self) -> Option<i64> {
        self.record.reps
    }

    pub fn sets(&self) -> Option<i64> {
        self.record.sets
    }

    pub fn notes(&self) -> Option<String> {
        self.record.notes.clone()
    }

    /// One-line description for list rows.
    pub fn summary(&self) -> String {
        self.record.to_string()
    }
}

impl From<db::models::HistoryRecord> for HistoryEntry {
    fn from(record: db::models::HistoryRecord) -> Self {
        HistoryEntry { record }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct DayLog {
    pub link_id: i64,
    pub exercise_id: i64,
    pub weight: f64,
    pub reps: i64,
    pub set_count: i64,
    pub notes: String,
    pub completed: bool,
}

impl From<db::models::SessionExercise> for DayLog {
    fn from(l: db::models::SessionExercise) -> Self {
        DayLog {
            link_id: l.id,
            exercise_id: l.exercise_id,
            weight: l.weight,
            reps: l.reps,
            set_count: l.set_count,
            notes: l.notes.unwrap_or_default(),
            completed: l.is_completed,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct DraftValues {
    pub weight: Option<f64>,
    pub reps: Option<i64>,
    pub sets: Option<i64>,
    pub notes: String,
}

impl From<Draft> for DraftValues {
    fn from(d: Draft) -> Self {
        DraftValues {
            weight: d.weight,
            reps: d.reps,
            sets: d.sets,
            notes: d.notes,
        }
    }
}

/// What the active-workout screen renders for one exercise.
#[derive(Clone, uniffi::Record)]
pub struct ExerciseCard {
    pub exercise: Arc<Exercise>,
    pub link_id: Option<i64>,
    pub completed: bool,
    pub draft: DraftValues,
}

impl From<ExerciseDraft> for ExerciseCard {
    fn from(d: ExerciseDraft) -> Self {
        ExerciseCard {
            exercise: Arc::new(Exercise::from(d.exercise)),
            link_id: d.link.as_ref().map(|l| l.id),
            completed: d.link.as_ref().is_some_and(|l| l.is_completed),
            draft: d.draft.into(),
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct SaveResult {
    pub link_id: i64,
    pub archived: bool,
    pub history_id: Option<i64>,
    pub archive_error: Option<String>,
}

impl From<SaveOutcome> for SaveResult {
    fn from(o: SaveOutcome) -> Self {
        let (archived, history_id, archive_error) = match o.history {
            HistoryMirror::Skipped => (false, None, None),
            HistoryMirror::Archived { history_id } => (true, Some(history_id), None),
            HistoryMirror::Failed(message) => (false, None, Some(message)),
        };
        SaveResult {
            link_id: o.link_id,
            archived,
            history_id,
            archive_error,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct WorkoutCounts {
    pub weekly: i64,
    pub monthly: i64,
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct VolumeEntry {
    pub date: String,
    pub label: String,
    pub volume: f64,
}

impl From<VolumePoint> for VolumeEntry {
    fn from(p: VolumePoint) -> Self {
        VolumeEntry {
            date: p.date,
            label: p.label,
            volume: p.volume,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct PersonalRecordEntry {
    pub exercise_name: String,
    pub max_weight: f64,
}

impl From<PersonalRecord> for PersonalRecordEntry {
    fn from(r: PersonalRecord) -> Self {
        PersonalRecordEntry {
            exercise_name: r.exercise_name,
            max_weight: r.max_weight,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct ProgressEntry {
    pub workout_date: String,
    pub weight: Option<f64>,
    pub reps: Option<i64>,
    pub sets: i64,
}

impl From<ProgressPoint> for ProgressEntry {
    fn from(p: ProgressPoint) -> Self {
        ProgressEntry {
            workout_date: p.workout_date,
            weight: p.weight,
            reps: p.reps,
            sets: p.sets,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct HistoryDay {
    pub date: String,
    pub total_sets: i64,
    pub exercise_count: i64,
    pub exercises: Vec<String>,
}

impl From<DaySummary> for HistoryDay {
    fn from(d: DaySummary) -> Self {
        HistoryDay {
            date: d.date,
            total_sets: d.total_sets,
            exercise_count: d.exercise_count,
            exercises: d.exercises,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct BodyStat {
    pub kind: String,
    pub value: f64,
    pub date: String,
}

impl From<LatestStat> for BodyStat {
    fn from(s: LatestStat) -> Self {
        BodyStat {
            kind: s.kind,
            value: s.value,
            date: s.date,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct BodyStatLineEntry {
    pub kind: String,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct BodyStatChart {
    pub labels: Vec<String>,
    pub lines: Vec<BodyStatLineEntry>,
}

impl From<BodyStatSeries> for BodyStatChart {
    fn from(s: BodyStatSeries) -> Self {
        BodyStatChart {
            labels: s.labels,
            lines: s
                .lines
                .into_iter()
                .map(|l| BodyStatLineEntry {
                    kind: l.kind,
                    values: l.values,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct MeasurementEntry {
    pub id: i64,
    pub kind: String,
    pub value: f64,
    pub unit: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct MeasurementDayEntry {
    pub date: String,
    pub entries: Vec<MeasurementEntry>,
}

impl From<MeasurementDay> for MeasurementDayEntry {
    fn from(day: MeasurementDay) -> Self {
        MeasurementDayEntry {
            date: day.date,
            entries: day
                .samples
                .into_iter()
                .map(|m| MeasurementEntry {
                    id: m.id,
                    kind: m.kind,
                    value: m.value,
                    unit: m.unit.unwrap_or_default(),
                    timestamp: m.date,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct PlanSummary {
    pub id: i64,
    pub name: String,
}

impl From<db::models::WorkoutPlan> for PlanSummary {
    fn from(p: db::models::WorkoutPlan) -> Self {
        PlanSummary {
            id: p.id,
            name: p.name,
        }
    }
}

#[derive(Clone, uniffi::Record)]
pub struct PlanItem {
    pub plan_exercise_id: i64,
    pub exercise: Arc<Exercise>,
}

#[derive(Clone, uniffi::Record)]
pub struct PlanSectionView {
    pub section_id: i64,
    pub title: String,
    pub order_index: i64,
    pub items: Vec<PlanItem>,
}

#[derive(Clone, uniffi::Record)]
pub struct PlanView {
    pub id: i64,
    pub name: String,
    pub sections: Vec<PlanSectionView>,
}

impl From<PlanDetails> for PlanView {
    fn from(d: PlanDetails) -> Self {
        PlanView {
            id: d.plan.id,
            name: d.plan.name,
            sections: d
                .sections
                .into_iter()
                .map(|s| PlanSectionView {
                    section_id: s.section.id,
                    title: s.section.title.unwrap_or_default(),
                    order_index: s.section.order_index.unwrap_or_default(),
                    items: s
                        .exercises
                        .into_iter()
                        .map(|e| PlanItem {
                            plan_exercise_id: e.plan_exercise_id,
                            exercise: Arc::new(Exercise::from(e.exercise)),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct SectionInput {
    pub title: String,
    pub exercise_ids: Vec<i64>,
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct PlanInput {
    pub name: String,
    pub sections: Vec<SectionInput>,
}

impl From<PlanInput> for PlanDefinition {
    fn from(p: PlanInput) -> Self {
        PlanDefinition {
            name: p.name,
            sections: p
                .sections
                .into_iter()
                .map(|s| SectionDefinition {
                    title: s.title,
                    exercise_ids: s.exercise_ids,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct ImportResult {
    pub rows_restored: u64,
    pub skipped_columns: Vec<String>,
}

impl From<ImportSummary> for ImportResult {
    fn from(s: ImportSummary) -> Self {
        ImportResult {
            rows_restored: s.total_rows(),
            skipped_columns: s.skipped_columns,
        }
    }
}
