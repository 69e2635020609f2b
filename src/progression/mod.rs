//! Progression engine.
//!
//! Turns logged workouts into character growth:
//! - Leveling ledger (XP, levels, stats)
//! - Achievement evaluation against catalog thresholds
//! - Daily and weekly quest tracking
//! - Transactional orchestration over the store

pub mod achievements;
pub mod catalog;
pub mod ledger;
pub mod quests;
pub mod service;

pub use achievements::{
    evaluate, AchievementDefinition, AchievementEvaluation, AchievementInstance, UnlockCondition,
};
pub use catalog::Catalog;
pub use ledger::{apply_xp, xp_to_level, LevelChange, ProgressionRecord, StatKey};
pub use quests::{
    advance, refresh, CompletedQuest, QuestAdvance, QuestInstance, QuestRefresh, QuestTemplate,
    QuestType,
};
pub use service::{ProgressionError, ProgressionService, WorkoutOutcome};
