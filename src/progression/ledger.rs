//! User progression record and the leveling ledger.
//!
//! XP accumulates toward the current level only. Crossing the threshold
//! carries the remainder into the next level, whose threshold is
//! `100 x level`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::workouts::StatGains;

/// XP needed per level; reaching level N+1 from N takes `XP_PER_LEVEL * N`.
pub const XP_PER_LEVEL: u32 = 100;

/// Starting value for every stat.
pub const BASE_STAT: u32 = 10;

/// XP threshold to advance from `level` to `level + 1`.
pub fn xp_to_level(level: u32) -> u32 {
    XP_PER_LEVEL.saturating_mul(level.max(1))
}

/// Named progression value an achievement can be conditioned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKey {
    Level,
    Strength,
    Endurance,
    Agility,
    TotalWorkouts,
}

impl StatKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatKey::Level => "level",
            StatKey::Strength => "strength",
            StatKey::Endurance => "endurance",
            StatKey::Agility => "agility",
            StatKey::TotalWorkouts => "total_workouts",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "level" => Some(StatKey::Level),
            "strength" => Some(StatKey::Strength),
            "endurance" => Some(StatKey::Endurance),
            "agility" => Some(StatKey::Agility),
            "total_workouts" => Some(StatKey::TotalWorkouts),
            _ => None,
        }
    }
}

impl std::fmt::Display for StatKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Cumulative progression state for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionRecord {
    pub user_id: Uuid,
    pub username: String,
    pub level: u32,
    /// XP accumulated toward the next level
    pub xp: u32,
    pub xp_to_next_level: u32,
    pub strength: u32,
    pub endurance: u32,
    pub agility: u32,
    pub total_workouts: u32,
    pub created_at: DateTime<Utc>,
}

impl ProgressionRecord {
    /// Fresh level 1 record.
    pub fn new(user_id: Uuid, username: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            username: username.into(),
            level: 1,
            xp: 0,
            xp_to_next_level: xp_to_level(1),
            strength: BASE_STAT,
            endurance: BASE_STAT,
            agility: BASE_STAT,
            total_workouts: 0,
            created_at,
        }
    }

    /// Current value of a condition stat.
    pub fn stat(&self, key: StatKey) -> u32 {
        match key {
            StatKey::Level => self.level,
            StatKey::Strength => self.strength,
            StatKey::Endurance => self.endurance,
            StatKey::Agility => self.agility,
            StatKey::TotalWorkouts => self.total_workouts,
        }
    }

    /// Apply a scored workout: add XP and stats, count the workout, level up.
    pub fn apply_workout(&mut self, xp: u32, stats: &StatGains) -> LevelChange {
        self.strength = self.strength.saturating_add(stats.strength);
        self.endurance = self.endurance.saturating_add(stats.endurance);
        self.agility = self.agility.saturating_add(stats.agility);
        self.total_workouts = self.total_workouts.saturating_add(1);

        self.xp = self.xp.saturating_add(xp);
        self.resolve_level_ups()
    }

    /// Grant bonus XP from an achievement or quest.
    ///
    /// With `cascade` off the XP is added as-is and any level-up waits for the
    /// next workout.
    pub fn grant_xp(&mut self, xp: u32, cascade: bool) -> LevelChange {
        self.xp = self.xp.saturating_add(xp);
        if cascade {
            self.resolve_level_ups()
        } else {
            LevelChange::none(self.level)
        }
    }

    /// Whether stored XP has reached the threshold without being resolved.
    pub fn has_pending_level_up(&self) -> bool {
        self.xp >= self.xp_to_next_level
    }

    fn resolve_level_ups(&mut self) -> LevelChange {
        let from = self.level;

        while self.xp >= self.xp_to_next_level {
            self.xp -= self.xp_to_next_level;
            self.level += 1;
            self.xp_to_next_level = xp_to_level(self.level);
        }

        if self.level > from {
            tracing::info!(
                user_id = %self.user_id,
                from,
                to = self.level,
                "Level up"
            );
        }

        LevelChange {
            from,
            to: self.level,
        }
    }
}

/// Apply an XP and stat delta to a copy of `state`.
pub fn apply_xp(state: &ProgressionRecord, xp_delta: u32, stats: &StatGains) -> ProgressionRecord {
    let mut next = state.clone();
    next.apply_workout(xp_delta, stats);
    next
}

/// Level transition caused by an XP change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelChange {
    pub from: u32,
    pub to: u32,
}

impl LevelChange {
    fn none(level: u32) -> Self {
        Self {
            from: level,
            to: level,
        }
    }

    pub fn levels_gained(&self) -> u32 {
        self.to - self.from
    }

    pub fn leveled_up(&self) -> bool {
        self.to > self.from
    }
}
