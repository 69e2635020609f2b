//! Achievement and quest catalogs.
//!
//! The catalog is read once at startup and shared read-only. A TOML file can
//! replace the built-in tables:
//!
//! ```toml
//! [[achievements]]
//! id = "workout_10"
//! name = "Warrior"
//! description = "Complete 10 workouts"
//! icon = "trophy"
//! xp_reward = 100
//! condition = { total_workouts = 10 }
//!
//! [[quests]]
//! id = "daily_workout"
//! name = "Daily Grind"
//! description = "Complete 1 workout today"
//! quest_type = "daily"
//! target = 1
//! xp_reward = 25
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::achievements::{AchievementDefinition, UnlockCondition};
use super::ledger::StatKey;
use super::quests::{QuestTemplate, QuestType};
use crate::storage::config::ConfigError;

/// Immutable set of achievement definitions and quest templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub achievements: Vec<AchievementDefinition>,
    #[serde(default)]
    pub quests: Vec<QuestTemplate>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            achievements: default_achievements(),
            quests: default_quests(),
        }
    }
}

impl Catalog {
    /// Parse and validate a TOML catalog.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let catalog: Catalog =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let catalog = Self::from_toml_str(&content)?;

        tracing::info!(
            path = %path.display(),
            achievements = catalog.achievements.len(),
            quests = catalog.quests.len(),
            "Loaded catalog"
        );

        Ok(catalog)
    }

    /// Reject duplicate ids and quests that can never complete.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for achievement in &self.achievements {
            if !seen.insert(achievement.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate achievement id: {}",
                    achievement.id
                )));
            }
        }

        let mut seen = HashSet::new();
        for quest in &self.quests {
            if !seen.insert(quest.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate quest id: {}",
                    quest.id
                )));
            }
            if quest.target == 0 {
                return Err(ConfigError::Invalid(format!(
                    "quest {} must have a positive target",
                    quest.id
                )));
            }
        }

        Ok(())
    }
}

fn default_achievements() -> Vec<AchievementDefinition> {
    use StatKey::*;

    let entry = |id, name, description, icon, xp_reward, key, threshold| {
        AchievementDefinition::new(
            id,
            name,
            description,
            icon,
            xp_reward,
            UnlockCondition::single(key, threshold),
        )
    };

    vec![
        // Workout count
        entry("first_workout", "First Steps", "Complete your first workout", "sword", 20, TotalWorkouts, 1),
        entry("workout_5", "Getting Serious", "Complete 5 workouts", "shield", 50, TotalWorkouts, 5),
        entry("workout_10", "Warrior", "Complete 10 workouts", "trophy", 100, TotalWorkouts, 10),
        entry("workout_25", "Champion", "Complete 25 workouts", "crown", 200, TotalWorkouts, 25),
        entry("workout_50", "Legend", "Complete 50 workouts", "star", 500, TotalWorkouts, 50),
        // Stats
        entry("strength_20", "Mighty", "Reach 20 Strength", "dumbbell", 75, Strength, 20),
        entry("strength_50", "Titan", "Reach 50 Strength", "mountain", 150, Strength, 50),
        entry("endurance_20", "Runner", "Reach 20 Endurance", "heart", 75, Endurance, 20),
        entry("endurance_50", "Marathoner", "Reach 50 Endurance", "flame", 150, Endurance, 50),
        // Level
        entry("level_5", "Apprentice", "Reach Level 5", "badge", 100, Level, 5),
        entry("level_10", "Master", "Reach Level 10", "gem", 250, Level, 10),
    ]
}

fn default_quests() -> Vec<QuestTemplate> {
    vec![
        QuestTemplate::new(
            "daily_workout",
            "Daily Grind",
            "Complete 1 workout today",
            QuestType::Daily,
            1,
            25,
        ),
        QuestTemplate::new(
            "daily_double",
            "Double Down",
            "Complete 2 workouts today",
            QuestType::Daily,
            2,
            50,
        ),
        QuestTemplate::new(
            "weekly_warrior",
            "Weekly Warrior",
            "Complete 5 workouts this week",
            QuestType::Weekly,
            5,
            150,
        ),
        QuestTemplate::new(
            "weekly_champion",
            "Weekly Champion",
            "Complete 7 workouts this week",
            QuestType::Weekly,
            7,
            250,
        ),
    ]
}
