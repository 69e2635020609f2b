//! TrainHero - Gamified Workout Progression
//!
//! Turns logged weightlifting and cardio sessions into RPG-style character
//! growth. Provides workout scoring, XP and level tracking, catalog-driven
//! achievements, and daily and weekly quests over a SQLite store.

pub mod plans;
pub mod progression;
pub mod storage;
pub mod workouts;

// Re-export commonly used types
pub use plans::{PlanManager, TrainingPlan};
pub use progression::{Catalog, ProgressionRecord, ProgressionService, WorkoutOutcome};
pub use storage::config::AppConfig;
pub use storage::database::Database;
pub use workouts::{WorkoutDetails, WorkoutRecord};
