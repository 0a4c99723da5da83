//! Session module: the workout engine.
//!
//! [`Session`] owns the connection pool; each concern adds its operations in
//! its own file:
//!
//! - `workout`: daily logs and their per-exercise links
//! - `sets`: draft saves and the history mirror
//! - `drafts`: ghost-set defaults
//! - `stats`: read-only aggregates
//! - `plans`: plan templates
//! - `backup`: snapshot export/import and reset
//! - `library`: the exercise library and the built-in seed plan
//! - `measurements`: body measurement samples

mod backup;
mod drafts;
mod library;
mod measurements;
mod plans;
mod session;
mod sets;
mod stats;
mod workout;

pub use backup::{ImportSummary, LinkRow, PlanEntryRow, SNAPSHOT_VERSION, SectionRow, Snapshot};
pub use drafts::{Draft, ExerciseDraft, resolve_draft};
pub use measurements::MeasurementDay;
pub use plans::{PlanDefinition, PlanDetails, PlanEntry, SectionDefinition, SectionDetails};
pub use session::Session;
pub use sets::{HistoryMirror, SaveOutcome};
pub use stats::{
    BodyStatLine, BodyStatSeries, DaySummary, LatestStat, PersonalRecord, ProgressPoint,
    TRACKED_MEASUREMENTS, VolumePoint,
};
