//! Progression service.
//!
//! Runs the workout pipeline (score, ledger, achievements, quests) against
//! the store. Every mutating operation reads and writes inside one immediate
//! transaction, so concurrent submissions for a user are serialized by the
//! database write lock.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::achievements::{self, AchievementInstance};
use super::catalog::Catalog;
use super::ledger::{LevelChange, ProgressionRecord};
use super::quests::{self, CompletedQuest, QuestInstance};
use crate::plans::PlanManager;
use crate::storage::config::ProgressionSettings;
use crate::storage::database::{Database, DatabaseError};
use crate::storage::progress_store::{ProgressStore, WorkoutStats};
use crate::workouts::{score, WorkoutDetails, WorkoutError, WorkoutRecord};

/// Everything a workout submission changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkoutOutcome {
    /// The logged workout
    pub workout: WorkoutRecord,
    /// Progression record after all grants
    pub progression: ProgressionRecord,
    /// Level before and after the submission
    pub level_change: LevelChange,
    /// Achievement ids unlocked by this workout
    pub unlocked_achievements: Vec<String>,
    /// Quests completed by this workout
    pub completed_quests: Vec<CompletedQuest>,
    /// XP granted by achievements and quests on top of the workout's own
    pub bonus_xp: u32,
}

/// Progression service over a database and a shared catalog.
pub struct ProgressionService {
    db: Database,
    catalog: Arc<Catalog>,
    settings: ProgressionSettings,
}

impl ProgressionService {
    pub fn new(db: Database, catalog: Arc<Catalog>, settings: ProgressionSettings) -> Self {
        Self {
            db,
            catalog,
            settings,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn settings(&self) -> &ProgressionSettings {
        &self.settings
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Training plan manager on the service's connection.
    pub fn plans(&self) -> PlanManager<'_> {
        PlanManager::new(self.db.connection())
    }

    // ========== Lifecycle ==========

    /// Create the progression record for a new account, with one achievement
    /// instance per catalog entry and one quest instance per template.
    pub fn initialize_progression(
        &mut self,
        user_id: Uuid,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<ProgressionRecord, ProgressionError> {
        let catalog = Arc::clone(&self.catalog);
        let tx = self.db.transaction()?;

        let record = {
            let store = ProgressStore::new(&tx);

            if store.get_user(&user_id)?.is_some() {
                return Err(ProgressionError::AlreadyInitialized(user_id));
            }

            let record = ProgressionRecord::new(user_id, username, now);
            match store.insert_user(&record) {
                Err(DatabaseError::ConstraintViolation(_)) => {
                    return Err(ProgressionError::UsernameTaken(username.to_string()));
                }
                other => other?,
            }

            for definition in &catalog.achievements {
                store.insert_achievement(&AchievementInstance::from_definition(
                    user_id, definition,
                ))?;
            }

            for quest in quests::refresh(user_id, &[], &catalog.quests, now).created {
                store.insert_quest(&quest)?;
            }

            record
        };

        commit(tx)?;

        tracing::info!(
            user_id = %user_id,
            username,
            achievements = catalog.achievements.len(),
            quests = catalog.quests.len(),
            "Initialized progression"
        );

        Ok(record)
    }

    // ========== Workout Pipeline ==========

    /// Log a workout and apply its consequences.
    ///
    /// Returns `Ok(None)` when the user has no progression record. Payloads
    /// with non-finite or negative measurements are rejected before anything
    /// is written.
    pub fn submit_workout(
        &mut self,
        user_id: Uuid,
        details: WorkoutDetails,
        now: DateTime<Utc>,
    ) -> Result<Option<WorkoutOutcome>, ProgressionError> {
        details.validate()?;

        let cascade = self.settings.cascade_bonus_xp;
        let tx = self.db.transaction()?;

        let outcome = {
            let store = ProgressStore::new(&tx);

            let Some(mut record) = store.get_user(&user_id)? else {
                tracing::debug!(user_id = %user_id, "Workout submitted for unknown user");
                return Ok(None);
            };
            let level_before = record.level;

            let reward = score(&details);
            record.apply_workout(reward.xp, &reward.stats);
            let workout = WorkoutRecord::new(user_id, details, reward.xp, reward.stats, now);

            let mut locked = store.locked_achievements(&user_id)?;
            let evaluation = achievements::evaluate(&record, &mut locked, now);
            record.grant_xp(evaluation.bonus_xp, cascade);

            let mut active = store.quests_for_user(&user_id)?;
            let advance = quests::advance(&mut active, workout.kind(), now);
            record.grant_xp(advance.bonus_xp, cascade);

            store.insert_workout(&workout)?;
            store.update_user(&record)?;

            for instance in locked
                .iter()
                .filter(|a| evaluation.unlocked.contains(&a.achievement_id))
            {
                store.save_unlock(instance)?;
            }

            for quest in active.iter().filter(|q| advance.advanced.contains(&q.id)) {
                store.save_quest_progress(quest)?;
            }

            let bonus_xp = evaluation.bonus_xp.saturating_add(advance.bonus_xp);
            tracing::debug!(
                user_id = %user_id,
                kind = workout.kind(),
                xp = workout.xp_earned,
                bonus_xp,
                "Workout recorded"
            );

            WorkoutOutcome {
                level_change: LevelChange {
                    from: level_before,
                    to: record.level,
                },
                bonus_xp,
                unlocked_achievements: evaluation.unlocked,
                completed_quests: advance.completed,
                workout,
                progression: record,
            }
        };

        commit(tx)?;
        Ok(Some(outcome))
    }

    /// Drop expired quest instances and create missing ones.
    ///
    /// Returns the newly created instances, or `Ok(None)` for an unknown user.
    pub fn refresh_quests(
        &mut self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Vec<QuestInstance>>, ProgressionError> {
        let catalog = Arc::clone(&self.catalog);
        let tx = self.db.transaction()?;

        let created = {
            let store = ProgressStore::new(&tx);

            if store.get_user(&user_id)?.is_none() {
                return Ok(None);
            }

            let existing = store.quests_for_user(&user_id)?;
            let plan = quests::refresh(user_id, &existing, &catalog.quests, now);

            store.delete_quests(&plan.expired)?;
            for quest in &plan.created {
                store.insert_quest(quest)?;
            }

            if !plan.expired.is_empty() || !plan.created.is_empty() {
                tracing::info!(
                    user_id = %user_id,
                    expired = plan.expired.len(),
                    created = plan.created.len(),
                    "Refreshed quests"
                );
            }

            plan.created
        };

        commit(tx)?;
        Ok(Some(created))
    }

    // ========== Read Models ==========

    /// The user's progression record.
    pub fn profile(&self, user_id: Uuid) -> Result<Option<ProgressionRecord>, ProgressionError> {
        Ok(self.store().get_user(&user_id)?)
    }

    /// Look up a progression record by username.
    pub fn find_user(&self, username: &str) -> Result<Option<ProgressionRecord>, ProgressionError> {
        Ok(self.store().get_user_by_username(username)?)
    }

    /// Most recent workouts first.
    pub fn workout_history(
        &self,
        user_id: Uuid,
        limit: u32,
    ) -> Result<Vec<WorkoutRecord>, ProgressionError> {
        Ok(self.store().recent_workouts(&user_id, limit)?)
    }

    pub fn workout_stats(&self, user_id: Uuid) -> Result<WorkoutStats, ProgressionError> {
        Ok(self.store().workout_stats(&user_id)?)
    }

    /// All achievement instances, locked and unlocked.
    pub fn achievements(&self, user_id: Uuid) -> Result<Vec<AchievementInstance>, ProgressionError> {
        Ok(self.store().achievements_for_user(&user_id)?)
    }

    /// Quest instances that have not yet expired, completed ones included.
    pub fn active_quests(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<QuestInstance>, ProgressionError> {
        let mut quests = self.store().quests_for_user(&user_id)?;
        quests.retain(|q| q.expires_at > now);
        Ok(quests)
    }

    /// Top users by level, then XP.
    pub fn leaderboard(&self, limit: u32) -> Result<Vec<ProgressionRecord>, ProgressionError> {
        Ok(self.store().leaderboard(limit)?)
    }

    fn store(&self) -> ProgressStore<'_> {
        ProgressStore::new(self.db.connection())
    }
}

fn commit(tx: rusqlite::Transaction<'_>) -> Result<(), DatabaseError> {
    tx.commit()
        .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))
}

/// Progression service errors.
#[derive(Debug, thiserror::Error)]
pub enum ProgressionError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Progression already initialized for user {0}")]
    AlreadyInitialized(Uuid),

    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    #[error("Invalid workout: {0}")]
    InvalidWorkout(#[from] WorkoutError),
}
