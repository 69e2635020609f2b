//! Time-boxed quests.
//!
//! Each user holds one instance per quest template. An instance moves one way
//! from active to completed; expiry is separate from completion. Refresh
//! drops instances whose deadline has passed and re-creates any template the
//! user no longer holds.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Quest cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestType {
    /// Expires at the next UTC midnight
    Daily,
    /// Expires at the start of the next ISO week (Monday 00:00 UTC)
    Weekly,
}

impl QuestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestType::Daily => "daily",
            QuestType::Weekly => "weekly",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(QuestType::Daily),
            "weekly" => Some(QuestType::Weekly),
            _ => None,
        }
    }

    /// Deadline for an instance created at `now`.
    pub fn expiry_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            QuestType::Daily => next_midnight(now),
            QuestType::Weekly => next_week_boundary(now),
        }
    }
}

impl std::fmt::Display for QuestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Midnight (UTC) at the start of the day after `now`.
pub fn next_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    start_of_day(now + Duration::days(1))
}

/// Midnight (UTC) at the start of the next Monday. On a Monday this is a full
/// week ahead.
pub fn next_week_boundary(now: DateTime<Utc>) -> DateTime<Utc> {
    let days_left = 7 - i64::from(now.weekday().num_days_from_monday());
    start_of_day(now + Duration::days(days_left))
}

fn start_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&at.date_naive().and_time(NaiveTime::MIN))
}

/// Catalog entry for a quest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestTemplate {
    /// Stable key (e.g. "daily_workout")
    pub id: String,
    pub name: String,
    pub description: String,
    pub quest_type: QuestType,
    /// Workouts needed to complete
    pub target: u32,
    pub xp_reward: u32,
}

impl QuestTemplate {
    pub fn new(
        id: &str,
        name: &str,
        description: &str,
        quest_type: QuestType,
        target: u32,
        xp_reward: u32,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            quest_type,
            target,
            xp_reward,
        }
    }
}

/// A user's time-boxed copy of a quest template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestInstance {
    pub id: Uuid,
    pub user_id: Uuid,
    pub template_id: String,
    pub name: String,
    pub description: String,
    pub quest_type: QuestType,
    pub target: u32,
    pub progress: u32,
    pub xp_reward: u32,
    pub completed: bool,
    pub expires_at: DateTime<Utc>,
}

impl QuestInstance {
    /// Fresh instance of `template` for `user_id`, expiring per its cadence.
    pub fn from_template(user_id: Uuid, template: &QuestTemplate, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            template_id: template.id.clone(),
            name: template.name.clone(),
            description: template.description.clone(),
            quest_type: template.quest_type,
            target: template.target,
            progress: 0,
            xp_reward: template.xp_reward,
            completed: false,
            expires_at: template.quest_type.expiry_after(now),
        }
    }

    /// Past its deadline.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Still able to make progress.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.expires_at > now
    }

    /// Count one workout. Returns true when this completes the quest.
    fn record_workout(&mut self) -> bool {
        self.progress = self.progress.saturating_add(1);
        if self.progress >= self.target {
            self.completed = true;
        }
        self.completed
    }
}

/// A quest completed by a workout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletedQuest {
    pub quest_id: Uuid,
    pub template_id: String,
    pub xp_reward: u32,
}

/// Outcome of advancing a user's quests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QuestAdvance {
    /// Instances whose progress changed
    pub advanced: Vec<Uuid>,
    pub completed: Vec<CompletedQuest>,
    pub bonus_xp: u32,
}

/// Count a workout toward every active quest.
///
/// Every active quest advances regardless of `workout_kind`.
pub fn advance(
    instances: &mut [QuestInstance],
    workout_kind: &str,
    now: DateTime<Utc>,
) -> QuestAdvance {
    let mut outcome = QuestAdvance::default();

    for quest in instances.iter_mut().filter(|q| q.is_active(now)) {
        outcome.advanced.push(quest.id);

        if quest.record_workout() {
            tracing::info!(
                user_id = %quest.user_id,
                quest = %quest.template_id,
                workout_kind,
                xp_reward = quest.xp_reward,
                "Quest completed"
            );
            outcome.completed.push(CompletedQuest {
                quest_id: quest.id,
                template_id: quest.template_id.clone(),
                xp_reward: quest.xp_reward,
            });
            outcome.bonus_xp = outcome.bonus_xp.saturating_add(quest.xp_reward);
        }
    }

    outcome
}

/// Changes needed to bring a user's quests up to date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestRefresh {
    /// Instances to delete
    pub expired: Vec<Uuid>,
    /// Instances to insert
    pub created: Vec<QuestInstance>,
}

/// Plan a refresh of `existing` against the templates at `now`.
///
/// Instances with `expires_at < now` are dropped. Every template left without
/// an instance gets a new one.
pub fn refresh(
    user_id: Uuid,
    existing: &[QuestInstance],
    templates: &[QuestTemplate],
    now: DateTime<Utc>,
) -> QuestRefresh {
    let (expired, kept): (Vec<_>, Vec<_>) = existing.iter().partition(|q| q.expires_at < now);

    let held: HashSet<&str> = kept.iter().map(|q| q.template_id.as_str()).collect();

    let created = templates
        .iter()
        .filter(|t| !held.contains(t.id.as_str()))
        .map(|t| QuestInstance::from_template(user_id, t, now))
        .collect();

    QuestRefresh {
        expired: expired.iter().map(|q| q.id).collect(),
        created,
    }
}
