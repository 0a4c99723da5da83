//! Reusable workout templates.
//!
//! A plan is a tree: plan -> ordered sections -> ordered exercise entries.
//! Edits replace the whole tree, so section and entry ids are not stable
//! across edits.

use crate::db::models::{Exercise, PlanSection, WorkoutPlan};
use crate::db::operations::{
    delete_plan_tree, get_all_plans, get_exercise, get_plan, get_plan_exercises_for_section,
    get_sections_for_plan, insert_plan, insert_plan_exercise, insert_section,
};
use crate::session::Session;
use anyhow::{Result, anyhow};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteConnection;

/// Full contents of a plan. Sections and their exercises are ordered by
/// position.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlanDefinition {
    pub name: String,
    pub sections: Vec<SectionDefinition>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SectionDefinition {
    pub title: String,
    pub exercise_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanEntry {
    pub plan_exercise_id: i64,
    pub order_index: Option<i64>,
    pub exercise: Exercise,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionDetails {
    pub section: PlanSection,
    pub exercises: Vec<PlanEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanDetails {
    pub plan: WorkoutPlan,
    pub sections: Vec<SectionDetails>,
}

/// Insert a plan tree on the caller's connection. Callers own the transaction.
pub(crate) async fn insert_definition(
    conn: &mut SqliteConnection,
    definition: &PlanDefinition,
) -> Result<i64> {
    if definition.name.trim().is_empty() {
        return Err(anyhow!("Plan name must not be empty"));
    }
    let plan_id = insert_plan(conn, &definition.name).await?;
    for (order, section) in definition.sections.iter().enumerate() {
        let section_id = insert_section(conn, plan_id, &section.title, order as i64).await?;
        for (position, exercise_id) in section.exercise_ids.iter().enumerate() {
            if get_exercise(conn, *exercise_id).await?.is_none() {
                return Err(anyhow!("No exercise with id {}", exercise_id));
            }
            insert_plan_exercise(conn, section_id, *exercise_id, position as i64).await?;
        }
    }
    Ok(plan_id)
}

impl Session {
    pub async fn create_plan(&self, name: &str) -> Result<i64> {
        if name.trim().is_empty() {
            return Err(anyhow!("Plan name must not be empty"));
        }
        let _writer = self.writer().await;
        let mut conn = self.conn().await?;
        let id = insert_plan(&mut conn, name).await?;
        debug!("Created plan {} ({})", name, id);
        Ok(id)
    }

    pub async fn add_section(&self, plan_id: i64, title: &str, order_index: i64) -> Result<i64> {
        let _writer = self.writer().await;
        let mut conn = self.conn().await?;
        if get_plan(&mut conn, plan_id).await?.is_none() {
            return Err(anyhow!("No plan with id {}", plan_id));
        }
        insert_section(&mut conn, plan_id, title, order_index).await
    }

    pub async fn add_exercise_to_section(
        &self,
        section_id: i64,
        exercise_id: i64,
        order_index: i64,
    ) -> Result<i64> {
        let _writer = self.writer().await;
        let mut conn = self.conn().await?;
        let section_exists: Option<i64> =
            sqlx::query_scalar("SELECT id FROM plan_sections WHERE id = ?1")
                .bind(section_id)
                .fetch_optional(&mut *conn)
                .await?;
        if section_exists.is_none() {
            return Err(anyhow!("No plan section with id {}", section_id));
        }
        if get_exercise(&mut conn, exercise_id).await?.is_none() {
            return Err(anyhow!("No exercise with id {}", exercise_id));
        }
        insert_plan_exercise(&mut conn, section_id, exercise_id, order_index).await
    }

    /// Build a whole plan in one transaction.
    pub async fn create_plan_from_definition(&self, definition: &PlanDefinition) -> Result<i64> {
        let _writer = self.writer().await;
        let mut tx = self.db_pool.begin().await?;
        let plan_id = insert_definition(&mut tx, definition).await?;
        tx.commit().await?;
        info!(
            "Created plan {} with {} sections",
            plan_id,
            definition.sections.len()
        );
        Ok(plan_id)
    }

    /// Replace a plan and its subtree with `definition`. The old tree is
    /// removed and a new one built in the same transaction; returns the new
    /// plan id.
    pub async fn replace_plan(&self, plan_id: i64, definition: &PlanDefinition) -> Result<i64> {
        let _writer = self.writer().await;
        let mut tx = self.db_pool.begin().await?;
        if !delete_plan_tree(&mut tx, plan_id).await? {
            return Err(anyhow!("No plan with id {}", plan_id));
        }
        let new_id = insert_definition(&mut tx, definition).await?;
        tx.commit().await?;
        info!("Replaced plan {} with {}", plan_id, new_id);
        Ok(new_id)
    }

    /// Remove a plan with its sections and entries. Returns whether it existed.
    pub async fn delete_plan(&self, plan_id: i64) -> Result<bool> {
        let _writer = self.writer().await;
        let mut tx = self.db_pool.begin().await?;
        let existed = delete_plan_tree(&mut tx, plan_id).await?;
        tx.commit().await?;
        if existed {
            info!("Deleted plan {}", plan_id);
        }
        Ok(existed)
    }

    pub async fn list_plans(&self) -> Result<Vec<WorkoutPlan>> {
        let mut conn = self.conn().await?;
        get_all_plans(&mut conn).await
    }

    /// A plan with its sections and their exercises, all in order. Entries
    /// whose exercise no longer exists are left out.
    pub async fn plan_details(&self, plan_id: i64) -> Result<Option<PlanDetails>> {
        let mut conn = self.conn().await?;
        let Some(plan) = get_plan(&mut conn, plan_id).await? else {
            return Ok(None);
        };

        let mut sections = Vec::new();
        for section in get_sections_for_plan(&mut conn, plan_id).await? {
            let mut exercises = Vec::new();
            for entry in get_plan_exercises_for_section(&mut conn, section.id).await? {
                match get_exercise(&mut conn, entry.exercise_id).await? {
                    Some(exercise) => exercises.push(PlanEntry {
                        plan_exercise_id: entry.id,
                        order_index: entry.order_index,
                        exercise,
                    }),
                    None => warn!(
                        "Plan entry {} points at missing exercise {}",
                        entry.id, entry.exercise_id
                    ),
                }
            }
            sections.push(SectionDetails { section, exercises });
        }
        Ok(Some(PlanDetails { plan, sections }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::NewExercise;

    async fn exercises(session: &Session, names: &[&str]) -> Vec<i64> {
        let mut ids = Vec::new();
        for name in names {
            ids.push(
                session
                    .add_exercise(&NewExercise {
                        name: name.to_string(),
                        ..Default::default()
                    })
                    .await
                    .unwrap(),
            );
        }
        ids
    }

    async fn count(session: &Session, table: &str) -> i64 {
        let mut conn = session.conn().await.unwrap();
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&mut *conn)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn builders_keep_caller_order() {
        let session = Session::in_memory().await.unwrap();
        let ids = exercises(&session, &["Squat", "Bench"]).await;

        let plan = session.create_plan("Strength").await.unwrap();
        let second = session.add_section(plan, "Upper", 2).await.unwrap();
        let first = session.add_section(plan, "Lower", 1).await.unwrap();
        session.add_exercise_to_section(first, ids[0], 0).await.unwrap();
        session.add_exercise_to_section(second, ids[1], 0).await.unwrap();

        let details = session.plan_details(plan).await.unwrap().unwrap();
        assert_eq!(details.sections[0].section.id, first);
        assert_eq!(details.sections[1].exercises[0].exercise.name, "Bench");

        assert!(session.add_section(plan + 1, "Nope", 0).await.is_err());
        assert!(session.add_exercise_to_section(first, 999, 1).await.is_err());
    }

    #[tokio::test]
    async fn replace_swaps_the_whole_tree() {
        let session = Session::in_memory().await.unwrap();
        let ids = exercises(&session, &["Squat", "Bench", "Row"]).await;

        let original = PlanDefinition {
            name: "A".into(),
            sections: vec![SectionDefinition {
                title: "All".into(),
                exercise_ids: ids.clone(),
            }],
        };
        let plan = session.create_plan_from_definition(&original).await.unwrap();

        let edited = PlanDefinition {
            name: "B".into(),
            sections: vec![
                SectionDefinition {
                    title: "Legs".into(),
                    exercise_ids: vec![ids[0]],
                },
                SectionDefinition {
                    title: "Pull".into(),
                    exercise_ids: vec![ids[2]],
                },
            ],
        };
        let new_id = session.replace_plan(plan, &edited).await.unwrap();

        assert!(session.plan_details(plan).await.unwrap().is_none());
        let details = session.plan_details(new_id).await.unwrap().unwrap();
        assert_eq!(details.plan.name, "B");
        assert_eq!(details.sections.len(), 2);
        assert_eq!(count(&session, "plan_sections").await, 2);
        assert_eq!(count(&session, "plan_exercises").await, 2);
    }

    #[tokio::test]
    async fn failed_replace_keeps_old_plan() {
        let session = Session::in_memory().await.unwrap();
        let ids = exercises(&session, &["Squat"]).await;
        let plan = session
            .create_plan_from_definition(&PlanDefinition {
                name: "A".into(),
                sections: vec![SectionDefinition {
                    title: "Legs".into(),
                    exercise_ids: ids,
                }],
            })
            .await
            .unwrap();

        let broken = PlanDefinition {
            name: "B".into(),
            sections: vec![SectionDefinition {
                title: "Ghost".into(),
                exercise_ids: vec![404],
            }],
        };
        assert!(session.replace_plan(plan, &broken).await.is_err());

        let details = session.plan_details(plan).await.unwrap().unwrap();
        assert_eq!(details.plan.name, "A");
        assert_eq!(details.sections[0].exercises.len(), 1);
    }

    #[tokio::test]
    async fn delete_removes_subtree() {
        let session = Session::in_memory().await.unwrap();
        let ids = exercises(&session, &["Squat", "Bench"]).await;
        let plan = session
            .create_plan_from_definition(&PlanDefinition {
                name: "A".into(),
                sections: vec![SectionDefinition {
                    title: "All".into(),
                    exercise_ids: ids,
                }],
            })
            .await
            .unwrap();

        assert!(session.delete_plan(plan).await.unwrap());
        assert!(!session.delete_plan(plan).await.unwrap());
        assert!(session.list_plans().await.unwrap().is_empty());
        assert_eq!(count(&session, "plan_sections").await, 0);
        assert_eq!(count(&session, "plan_exercises").await, 0);
        assert_eq!(count(&session, "exercises").await, 2);
    }
}
