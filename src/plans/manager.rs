//! Training plan management.

use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::types::{PlanUpdate, TrainingPlan};
use crate::storage::database::{format_timestamp, parse_timestamp};

/// Manager for training plans.
pub struct PlanManager<'a> {
    conn: &'a Connection,
}

impl<'a> PlanManager<'a> {
    /// Create a new plan manager with a database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Store a new plan as the user's active plan.
    pub fn create(&self, plan: &TrainingPlan) -> Result<(), PlanError> {
        validate_name(&plan.name)?;

        let tx = self.conn.unchecked_transaction()?;

        // Only one active plan per user
        tx.execute(
            "UPDATE training_plans SET is_active = 0 WHERE user_id = ?1 AND is_active = 1",
            params![plan.user_id.to_string()],
        )?;

        tx.execute(
            "INSERT INTO training_plans
             (id, user_id, name, exercises_json, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6)",
            params![
                plan.id.to_string(),
                plan.user_id.to_string(),
                plan.name.trim(),
                serde_json::to_string(&plan.exercises)?,
                format_timestamp(&plan.created_at),
                format_timestamp(&plan.updated_at),
            ],
        )?;

        tx.commit()?;

        tracing::debug!(plan_id = %plan.id, user_id = %plan.user_id, "Created training plan");
        Ok(())
    }

    /// Get a plan by ID.
    pub fn get(&self, id: Uuid) -> Result<Option<TrainingPlan>, PlanError> {
        self.conn
            .query_row(
                "SELECT id, user_id, name, exercises_json, is_active, created_at, updated_at
                 FROM training_plans WHERE id = ?1",
                params![id.to_string()],
                parse_plan_row,
            )
            .optional()
            .map_err(PlanError::from)
    }

    /// All plans for a user, newest first.
    pub fn list(&self, user_id: Uuid) -> Result<Vec<TrainingPlan>, PlanError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, name, exercises_json, is_active, created_at, updated_at
             FROM training_plans
             WHERE user_id = ?1
             ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map(params![user_id.to_string()], parse_plan_row)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(PlanError::from)
    }

    /// The user's active plan, if any.
    pub fn active(&self, user_id: Uuid) -> Result<Option<TrainingPlan>, PlanError> {
        self.conn
            .query_row(
                "SELECT id, user_id, name, exercises_json, is_active, created_at, updated_at
                 FROM training_plans
                 WHERE user_id = ?1 AND is_active = 1
                 ORDER BY updated_at DESC
                 LIMIT 1",
                params![user_id.to_string()],
                parse_plan_row,
            )
            .optional()
            .map_err(PlanError::from)
    }

    /// A plan by ID, only if `user_id` owns it.
    pub fn get_owned(&self, user_id: Uuid, id: Uuid) -> Result<Option<TrainingPlan>, PlanError> {
        self.conn
            .query_row(
                "SELECT id, user_id, name, exercises_json, is_active, created_at, updated_at
                 FROM training_plans WHERE id = ?1 AND user_id = ?2",
                params![id.to_string(), user_id.to_string()],
                parse_plan_row,
            )
            .optional()
            .map_err(PlanError::from)
    }

    /// Apply a partial update to one of the user's plans and return it.
    ///
    /// Activating a plan deactivates the user's other plans. A plan owned by
    /// someone else is reported as not found.
    pub fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        update: &PlanUpdate,
    ) -> Result<TrainingPlan, PlanError> {
        let mut plan = self
            .get_owned(user_id, id)?
            .ok_or(PlanError::NotFound(id))?;

        if let Some(name) = &update.name {
            validate_name(name)?;
            plan.name = name.trim().to_string();
        }
        if let Some(exercises) = &update.exercises {
            plan.exercises = exercises.clone();
        }
        if let Some(is_active) = update.is_active {
            plan.is_active = is_active;
        }
        plan.updated_at = Utc::now();

        let tx = self.conn.unchecked_transaction()?;

        if update.is_active == Some(true) {
            tx.execute(
                "UPDATE training_plans SET is_active = 0
                 WHERE user_id = ?1 AND id != ?2 AND is_active = 1",
                params![plan.user_id.to_string(), id.to_string()],
            )?;
        }

        tx.execute(
            "UPDATE training_plans SET name = ?1, exercises_json = ?2, is_active = ?3, updated_at = ?4
             WHERE id = ?5 AND user_id = ?6",
            params![
                plan.name,
                serde_json::to_string(&plan.exercises)?,
                plan.is_active,
                format_timestamp(&plan.updated_at),
                id.to_string(),
                user_id.to_string(),
            ],
        )?;

        tx.commit()?;

        Ok(plan)
    }

    /// Delete one of the user's plans.
    pub fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), PlanError> {
        let deleted = self.conn.execute(
            "DELETE FROM training_plans WHERE id = ?1 AND user_id = ?2",
            params![id.to_string(), user_id.to_string()],
        )?;

        if deleted == 0 {
            return Err(PlanError::NotFound(id));
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), PlanError> {
    if name.trim().is_empty() {
        return Err(PlanError::ValidationError(
            "Plan name must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Parse a database row into a TrainingPlan.
fn parse_plan_row(row: &rusqlite::Row) -> rusqlite::Result<TrainingPlan> {
    let id_str: String = row.get(0)?;
    let user_id_str: String = row.get(1)?;
    let exercises_json: String = row.get(3)?;
    let created_at_str: String = row.get(5)?;
    let updated_at_str: String = row.get(6)?;

    Ok(TrainingPlan {
        id: Uuid::parse_str(&id_str).map_err(|e| conversion_error(0, e))?,
        user_id: Uuid::parse_str(&user_id_str).map_err(|e| conversion_error(1, e))?,
        name: row.get(2)?,
        exercises: serde_json::from_str(&exercises_json)
            .map_err(|e| conversion_error(3, e))?,
        is_active: row.get(4)?,
        created_at: parse_timestamp(&created_at_str).map_err(|e| conversion_error(5, e))?,
        updated_at: parse_timestamp(&updated_at_str).map_err(|e| conversion_error(6, e))?,
    })
}

fn conversion_error<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

/// Plan management errors.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Plan not found: {0}")]
    NotFound(Uuid),
}
