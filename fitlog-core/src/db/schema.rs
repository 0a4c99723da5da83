//! Table definitions shared by the migrations and the snapshot importer.

/// Storage class a column's values are coerced to on restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Real,
    Text,
}

#[derive(Debug)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnKind,
    /// Type and constraints as written after the column name in DDL.
    pub decl: &'static str,
    /// Value restored in place of a NULL for a `NOT NULL DEFAULT` column.
    pub null_as: Option<&'static str>,
}

#[derive(Debug)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
}

impl TableDef {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    pub fn create_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| format!("{} {}", c.name, c.decl))
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE {} ({})", self.name, columns)
    }
}

const fn col(name: &'static str, kind: ColumnKind, decl: &'static str) -> ColumnDef {
    ColumnDef {
        name,
        kind,
        decl,
        null_as: None,
    }
}

const fn text_or(name: &'static str, decl: &'static str, fallback: &'static str) -> ColumnDef {
    ColumnDef {
        name,
        kind: ColumnKind::Text,
        decl,
        null_as: Some(fallback),
    }
}

use ColumnKind::{Integer, Real, Text};

const ID: ColumnDef = col("id", Integer, "INTEGER PRIMARY KEY AUTOINCREMENT");

pub const EXERCISES: TableDef = TableDef {
    name: "exercises",
    columns: &[
        ID,
        col("name", Text, "TEXT NOT NULL"),
        col("muscle_group", Text, "TEXT"),
        col("notes", Text, "TEXT"),
        col("default_sets", Integer, "INTEGER"),
        col("default_reps", Integer, "INTEGER"),
    ],
};

pub const WORKOUTS: TableDef = TableDef {
    name: "workouts",
    columns: &[
        ID,
        text_or("name", "TEXT NOT NULL DEFAULT 'Daily Log'", "Daily Log"),
        col("scheduled_date", Text, "TEXT"),
        col("status", Text, "TEXT DEFAULT 'pending'"),
    ],
};

pub const WORKOUT_EXERCISES: TableDef = TableDef {
    name: "workout_exercises",
    columns: &[
        ID,
        col("workout_id", Integer, "INTEGER"),
        col("exercise_id", Integer, "INTEGER"),
        col("order_index", Integer, "INTEGER"),
        col("notes", Text, "TEXT"),
        col("weight", Real, "REAL DEFAULT 0"),
        col("reps", Integer, "INTEGER DEFAULT 0"),
        col("set_count", Integer, "INTEGER DEFAULT 0"),
        col("is_completed", Integer, "INTEGER DEFAULT 0"),
    ],
};

pub const HISTORY: TableDef = TableDef {
    name: "history",
    columns: &[
        ID,
        text_or("workout_date", "TEXT NOT NULL DEFAULT ''", ""),
        text_or("exercise_name", "TEXT NOT NULL DEFAULT ''", ""),
        col("muscle_group", Text, "TEXT"),
        col("weight", Real, "REAL"),
        col("reps", Integer, "INTEGER"),
        col("sets", Integer, "INTEGER"),
        col("notes", Text, "TEXT"),
    ],
};

pub const MEASUREMENTS: TableDef = TableDef {
    name: "measurements",
    columns: &[
        ID,
        col("type", Text, "TEXT NOT NULL"),
        col("value", Real, "REAL NOT NULL"),
        col("unit", Text, "TEXT DEFAULT 'kg'"),
        col("date", Text, "TEXT NOT NULL"),
    ],
};

pub const WORKOUT_PLANS: TableDef = TableDef {
    name: "workout_plans",
    columns: &[ID, col("name", Text, "TEXT NOT NULL")],
};

pub const PLAN_SECTIONS: TableDef = TableDef {
    name: "plan_sections",
    columns: &[
        ID,
        col("plan_id", Integer, "INTEGER"),
        col("title", Text, "TEXT"),
        col("order_index", Integer, "INTEGER"),
    ],
};

pub const PLAN_EXERCISES: TableDef = TableDef {
    name: "plan_exercises",
    columns: &[
        ID,
        col("section_id", Integer, "INTEGER"),
        col("exercise_id", Integer, "INTEGER"),
        col("order_index", Integer, "INTEGER"),
    ],
};

/// Every content table, in restore order (parents before children).
pub const TABLES: &[&TableDef] = &[
    &EXERCISES,
    &WORKOUTS,
    &WORKOUT_EXERCISES,
    &HISTORY,
    &MEASUREMENTS,
    &WORKOUT_PLANS,
    &PLAN_SECTIONS,
    &PLAN_EXERCISES,
];

pub fn table(name: &str) -> Option<&'static TableDef> {
    TABLES.iter().copied().find(|t| t.name == name)
}
