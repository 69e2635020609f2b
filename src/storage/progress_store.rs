//! Progression data storage operations.
//!
//! Provides persistence for:
//! - User progression records
//! - Workout log
//! - Achievement instances
//! - Quest instances

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use uuid::Uuid;

use crate::progression::achievements::{AchievementInstance, UnlockCondition};
use crate::progression::ledger::ProgressionRecord;
use crate::progression::quests::{QuestInstance, QuestType};
use crate::storage::database::{format_timestamp, parse_timestamp, DatabaseError};
use crate::workouts::{StatGains, WorkoutDetails, WorkoutRecord, WorkoutType};

/// Aggregate workout counts for a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkoutStats {
    pub total_workouts: u32,
    pub weightlifting_count: u32,
    pub cardio_count: u32,
    pub total_xp_earned: u64,
}

/// Store for progression state. Works on a plain connection or inside a
/// transaction.
pub struct ProgressStore<'a> {
    conn: &'a Connection,
}

impl<'a> ProgressStore<'a> {
    /// Create a new progress store with the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    // ========== User Operations ==========

    /// Insert a new progression record.
    pub fn insert_user(&self, user: &ProgressionRecord) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO users (id, username, level, xp, xp_to_next_level,
             strength, endurance, agility, total_workouts, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                user.user_id.to_string(),
                user.username,
                user.level,
                user.xp,
                user.xp_to_next_level,
                user.strength,
                user.endurance,
                user.agility,
                user.total_workouts,
                format_timestamp(&user.created_at),
            ],
        )?;
        Ok(())
    }

    /// Get a progression record by user ID.
    pub fn get_user(&self, user_id: &Uuid) -> Result<Option<ProgressionRecord>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, username, level, xp, xp_to_next_level,
                        strength, endurance, agility, total_workouts, created_at
                 FROM users WHERE id = ?1",
                params![user_id.to_string()],
                UserRow::from_row,
            )
            .optional()?;

        row.map(UserRow::into_record).transpose()
    }

    /// Get a progression record by username.
    pub fn get_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<ProgressionRecord>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, username, level, xp, xp_to_next_level,
                        strength, endurance, agility, total_workouts, created_at
                 FROM users WHERE username = ?1",
                params![username],
                UserRow::from_row,
            )
            .optional()?;

        row.map(UserRow::into_record).transpose()
    }

    /// Persist every mutable progression field.
    pub fn update_user(&self, user: &ProgressionRecord) -> Result<(), DatabaseError> {
        let updated = self.conn.execute(
            "UPDATE users SET level = ?1, xp = ?2, xp_to_next_level = ?3,
             strength = ?4, endurance = ?5, agility = ?6, total_workouts = ?7
             WHERE id = ?8",
            params![
                user.level,
                user.xp,
                user.xp_to_next_level,
                user.strength,
                user.endurance,
                user.agility,
                user.total_workouts,
                user.user_id.to_string(),
            ],
        )?;

        if updated == 0 {
            return Err(DatabaseError::NotFound(user.user_id.to_string()));
        }
        Ok(())
    }

    /// Top users by level, then XP.
    pub fn leaderboard(&self, limit: u32) -> Result<Vec<ProgressionRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, username, level, xp, xp_to_next_level,
                    strength, endurance, agility, total_workouts, created_at
             FROM users
             ORDER BY level DESC, xp DESC, username ASC
             LIMIT ?1",
        )?;

        let rows = stmt
            .query_map(params![limit], UserRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(UserRow::into_record).collect()
    }

    // ========== Workout Operations ==========

    /// Append a workout to the log.
    pub fn insert_workout(&self, workout: &WorkoutRecord) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO workouts (id, user_id, workout_type, details_json, xp_earned,
             strength_gained, endurance_gained, agility_gained, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                workout.id.to_string(),
                workout.user_id.to_string(),
                workout.kind(),
                workout.details.payload_json()?,
                workout.xp_earned,
                workout.stats_gained.strength,
                workout.stats_gained.endurance,
                workout.stats_gained.agility,
                format_timestamp(&workout.created_at),
            ],
        )?;
        Ok(())
    }

    /// Most recent workouts first.
    pub fn recent_workouts(
        &self,
        user_id: &Uuid,
        limit: u32,
    ) -> Result<Vec<WorkoutRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, workout_type, details_json, xp_earned,
                    strength_gained, endurance_gained, agility_gained, created_at
             FROM workouts
             WHERE user_id = ?1
             ORDER BY created_at DESC
             LIMIT ?2",
        )?;

        let rows = stmt
            .query_map(params![user_id.to_string(), limit], |row| {
                Ok(WorkoutRow {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    workout_type: row.get(2)?,
                    details_json: row.get(3)?,
                    xp_earned: row.get(4)?,
                    strength_gained: row.get(5)?,
                    endurance_gained: row.get(6)?,
                    agility_gained: row.get(7)?,
                    created_at: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(WorkoutRow::into_record).collect()
    }

    /// Workout counts and XP totals for a user.
    pub fn workout_stats(&self, user_id: &Uuid) -> Result<WorkoutStats, DatabaseError> {
        let stats = self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE WHEN workout_type = ?2 THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN workout_type = ?3 THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(xp_earned), 0)
             FROM workouts WHERE user_id = ?1",
            params![
                user_id.to_string(),
                WorkoutType::Weightlifting.as_str(),
                WorkoutType::Cardio.as_str(),
            ],
            |row| {
                Ok(WorkoutStats {
                    total_workouts: row.get(0)?,
                    weightlifting_count: row.get(1)?,
                    cardio_count: row.get(2)?,
                    total_xp_earned: row.get::<_, i64>(3)?.max(0) as u64,
                })
            },
        )?;
        Ok(stats)
    }

    // ========== Achievement Operations ==========

    /// Insert an achievement instance.
    pub fn insert_achievement(&self, achievement: &AchievementInstance) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO achievements (user_id, achievement_id, name, description, icon,
             xp_reward, condition_json, unlocked, unlocked_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                achievement.user_id.to_string(),
                achievement.achievement_id,
                achievement.name,
                achievement.description,
                achievement.icon,
                achievement.xp_reward,
                serde_json::to_string(&achievement.condition)?,
                achievement.unlocked,
                achievement.unlocked_at.as_ref().map(format_timestamp),
            ],
        )?;
        Ok(())
    }

    /// All achievement instances for a user.
    pub fn achievements_for_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<AchievementInstance>, DatabaseError> {
        self.query_achievements(
            "SELECT user_id, achievement_id, name, description, icon, xp_reward,
                    condition_json, unlocked, unlocked_at
             FROM achievements WHERE user_id = ?1
             ORDER BY rowid",
            user_id,
        )
    }

    /// Achievement instances still waiting to unlock.
    pub fn locked_achievements(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<AchievementInstance>, DatabaseError> {
        self.query_achievements(
            "SELECT user_id, achievement_id, name, description, icon, xp_reward,
                    condition_json, unlocked, unlocked_at
             FROM achievements WHERE user_id = ?1 AND unlocked = 0
             ORDER BY rowid",
            user_id,
        )
    }

    /// Persist an unlock. Already unlocked rows are left untouched.
    pub fn save_unlock(&self, achievement: &AchievementInstance) -> Result<bool, DatabaseError> {
        let updated = self.conn.execute(
            "UPDATE achievements SET unlocked = 1, unlocked_at = ?1
             WHERE user_id = ?2 AND achievement_id = ?3 AND unlocked = 0",
            params![
                achievement.unlocked_at.as_ref().map(format_timestamp),
                achievement.user_id.to_string(),
                achievement.achievement_id,
            ],
        )?;
        Ok(updated > 0)
    }

    fn query_achievements(
        &self,
        sql: &str,
        user_id: &Uuid,
    ) -> Result<Vec<AchievementInstance>, DatabaseError> {
        let mut stmt = self.conn.prepare(sql)?;

        let rows = stmt
            .query_map(params![user_id.to_string()], |row| {
                Ok(AchievementRow {
                    user_id: row.get(0)?,
                    achievement_id: row.get(1)?,
                    name: row.get(2)?,
                    description: row.get(3)?,
                    icon: row.get(4)?,
                    xp_reward: row.get(5)?,
                    condition_json: row.get(6)?,
                    unlocked: row.get(7)?,
                    unlocked_at: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(AchievementRow::into_instance).collect()
    }

    // ========== Quest Operations ==========

    /// Insert a quest instance.
    pub fn insert_quest(&self, quest: &QuestInstance) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO quests (id, user_id, template_id, name, description, quest_type,
             target, progress, xp_reward, completed, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                quest.id.to_string(),
                quest.user_id.to_string(),
                quest.template_id,
                quest.name,
                quest.description,
                quest.quest_type.as_str(),
                quest.target,
                quest.progress,
                quest.xp_reward,
                quest.completed,
                format_timestamp(&quest.expires_at),
            ],
        )?;
        Ok(())
    }

    /// Every quest instance held by a user, soonest expiry first.
    pub fn quests_for_user(&self, user_id: &Uuid) -> Result<Vec<QuestInstance>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, template_id, name, description, quest_type,
                    target, progress, xp_reward, completed, expires_at
             FROM quests WHERE user_id = ?1
             ORDER BY expires_at ASC, rowid ASC",
        )?;

        let rows = stmt
            .query_map(params![user_id.to_string()], |row| {
                Ok(QuestRow {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    template_id: row.get(2)?,
                    name: row.get(3)?,
                    description: row.get(4)?,
                    quest_type: row.get(5)?,
                    target: row.get(6)?,
                    progress: row.get(7)?,
                    xp_reward: row.get(8)?,
                    completed: row.get(9)?,
                    expires_at: row.get(10)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(QuestRow::into_instance).collect()
    }

    /// Persist quest progress. Completed rows are never rewritten.
    pub fn save_quest_progress(&self, quest: &QuestInstance) -> Result<bool, DatabaseError> {
        let updated = self.conn.execute(
            "UPDATE quests SET progress = ?1, completed = ?2
             WHERE id = ?3 AND completed = 0",
            params![quest.progress, quest.completed, quest.id.to_string()],
        )?;
        Ok(updated > 0)
    }

    /// Delete quest instances by ID.
    pub fn delete_quests(&self, ids: &[Uuid]) -> Result<usize, DatabaseError> {
        let mut stmt = self.conn.prepare("DELETE FROM quests WHERE id = ?1")?;
        let mut deleted = 0;
        for id in ids {
            deleted += stmt.execute(params![id.to_string()])?;
        }
        Ok(deleted)
    }
}

fn parse_uuid(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::DeserializationError(format!("bad id {s:?}: {e}")))
}

/// Raw users row.
struct UserRow {
    id: String,
    username: String,
    level: u32,
    xp: u32,
    xp_to_next_level: u32,
    strength: u32,
    endurance: u32,
    agility: u32,
    total_workouts: u32,
    created_at: String,
}

impl UserRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            level: row.get(2)?,
            xp: row.get(3)?,
            xp_to_next_level: row.get(4)?,
            strength: row.get(5)?,
            endurance: row.get(6)?,
            agility: row.get(7)?,
            total_workouts: row.get(8)?,
            created_at: row.get(9)?,
        })
    }

    fn into_record(self) -> Result<ProgressionRecord, DatabaseError> {
        Ok(ProgressionRecord {
            user_id: parse_uuid(&self.id)?,
            username: self.username,
            level: self.level,
            xp: self.xp,
            xp_to_next_level: self.xp_to_next_level,
            strength: self.strength,
            endurance: self.endurance,
            agility: self.agility,
            total_workouts: self.total_workouts,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

/// Raw workouts row.
struct WorkoutRow {
    id: String,
    user_id: String,
    workout_type: String,
    details_json: String,
    xp_earned: u32,
    strength_gained: u32,
    endurance_gained: u32,
    agility_gained: u32,
    created_at: String,
}

impl WorkoutRow {
    fn into_record(self) -> Result<WorkoutRecord, DatabaseError> {
        let details = WorkoutDetails::from_parts(&self.workout_type, &self.details_json)
            .map_err(|e| DatabaseError::DeserializationError(e.to_string()))?;

        Ok(WorkoutRecord {
            id: parse_uuid(&self.id)?,
            user_id: parse_uuid(&self.user_id)?,
            details,
            xp_earned: self.xp_earned,
            stats_gained: StatGains {
                strength: self.strength_gained,
                endurance: self.endurance_gained,
                agility: self.agility_gained,
            },
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

/// Raw achievements row.
struct AchievementRow {
    user_id: String,
    achievement_id: String,
    name: String,
    description: String,
    icon: String,
    xp_reward: u32,
    condition_json: String,
    unlocked: bool,
    unlocked_at: Option<String>,
}

impl AchievementRow {
    fn into_instance(self) -> Result<AchievementInstance, DatabaseError> {
        let condition: UnlockCondition = serde_json::from_str(&self.condition_json)
            .map_err(|e| DatabaseError::DeserializationError(e.to_string()))?;

        Ok(AchievementInstance {
            user_id: parse_uuid(&self.user_id)?,
            achievement_id: self.achievement_id,
            name: self.name,
            description: self.description,
            icon: self.icon,
            xp_reward: self.xp_reward,
            condition,
            unlocked: self.unlocked,
            unlocked_at: self.unlocked_at.as_deref().map(parse_timestamp).transpose()?,
        })
    }
}

/// Raw quests row.
struct QuestRow {
    id: String,
    user_id: String,
    template_id: String,
    name: String,
    description: String,
    quest_type: String,
    target: u32,
    progress: u32,
    xp_reward: u32,
    completed: bool,
    expires_at: String,
}

impl QuestRow {
    fn into_instance(self) -> Result<QuestInstance, DatabaseError> {
        let quest_type = QuestType::from_str(&self.quest_type).ok_or_else(|| {
            DatabaseError::DeserializationError(format!("unknown quest type {:?}", self.quest_type))
        })?;

        Ok(QuestInstance {
            id: parse_uuid(&self.id)?,
            user_id: parse_uuid(&self.user_id)?,
            template_id: self.template_id,
            name: self.name,
            description: self.description,
            quest_type,
            target: self.target,
            progress: self.progress,
            xp_reward: self.xp_reward,
            completed: self.completed,
            expires_at: parse_timestamp(&self.expires_at)?,
        })
    }
}
