//! Achievement definitions, per-user instances and unlock evaluation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ledger::{ProgressionRecord, StatKey};

/// Conjunction of stat thresholds that must all hold to unlock.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, u32>", into = "BTreeMap<String, u32>")]
pub struct UnlockCondition(BTreeMap<StatKey, u32>);

impl TryFrom<BTreeMap<String, u32>> for UnlockCondition {
    type Error = String;

    fn try_from(raw: BTreeMap<String, u32>) -> Result<Self, Self::Error> {
        raw.into_iter()
            .map(|(name, threshold)| {
                StatKey::from_str(&name)
                    .map(|key| (key, threshold))
                    .ok_or_else(|| format!("unknown condition stat: {name}"))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()
            .map(Self)
    }
}

impl From<UnlockCondition> for BTreeMap<String, u32> {
    fn from(condition: UnlockCondition) -> Self {
        condition
            .0
            .into_iter()
            .map(|(key, threshold)| (key.as_str().to_string(), threshold))
            .collect()
    }
}

impl UnlockCondition {
    /// Condition on a single stat.
    pub fn single(key: StatKey, threshold: u32) -> Self {
        Self(BTreeMap::from([(key, threshold)]))
    }

    /// Add another required threshold.
    pub fn and(mut self, key: StatKey, threshold: u32) -> Self {
        self.0.insert(key, threshold);
        self
    }

    pub fn thresholds(&self) -> impl Iterator<Item = (StatKey, u32)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    /// Check every threshold against the record.
    pub fn is_met(&self, record: &ProgressionRecord) -> bool {
        self.0
            .iter()
            .all(|(key, threshold)| record.stat(*key) >= *threshold)
    }
}

/// Catalog entry for an achievement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementDefinition {
    /// Stable key (e.g. "workout_10")
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub xp_reward: u32,
    pub condition: UnlockCondition,
}

impl AchievementDefinition {
    pub fn new(
        id: &str,
        name: &str,
        description: &str,
        icon: &str,
        xp_reward: u32,
        condition: UnlockCondition,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
            xp_reward,
            condition,
        }
    }
}

/// A user's copy of an achievement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementInstance {
    pub user_id: Uuid,
    pub achievement_id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub xp_reward: u32,
    pub condition: UnlockCondition,
    pub unlocked: bool,
    pub unlocked_at: Option<DateTime<Utc>>,
}

impl AchievementInstance {
    /// Instantiate a locked copy of a catalog entry for a user.
    pub fn from_definition(user_id: Uuid, definition: &AchievementDefinition) -> Self {
        Self {
            user_id,
            achievement_id: definition.id.clone(),
            name: definition.name.clone(),
            description: definition.description.clone(),
            icon: definition.icon.clone(),
            xp_reward: definition.xp_reward,
            condition: definition.condition.clone(),
            unlocked: false,
            unlocked_at: None,
        }
    }

    /// Mark unlocked. Returns false if it already was; the timestamp never moves.
    pub fn unlock(&mut self, now: DateTime<Utc>) -> bool {
        if self.unlocked {
            return false;
        }
        self.unlocked = true;
        self.unlocked_at = Some(now);
        true
    }
}

/// Outcome of one evaluation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AchievementEvaluation {
    /// Achievement ids unlocked in this pass
    pub unlocked: Vec<String>,
    /// Sum of their XP rewards
    pub bonus_xp: u32,
}

/// Evaluate locked achievements against a progression snapshot.
///
/// Every instance sees the same snapshot, so bonus XP granted by one unlock
/// cannot trigger another in the same pass. Already unlocked instances are
/// skipped.
pub fn evaluate(
    record: &ProgressionRecord,
    instances: &mut [AchievementInstance],
    now: DateTime<Utc>,
) -> AchievementEvaluation {
    let mut evaluation = AchievementEvaluation::default();

    for instance in instances.iter_mut().filter(|a| !a.unlocked) {
        if instance.condition.is_met(record) && instance.unlock(now) {
            tracing::info!(
                user_id = %record.user_id,
                achievement = %instance.achievement_id,
                xp_reward = instance.xp_reward,
                "Achievement unlocked"
            );
            evaluation.unlocked.push(instance.achievement_id.clone());
            evaluation.bonus_xp = evaluation.bonus_xp.saturating_add(instance.xp_reward);
        }
    }

    evaluation
}
