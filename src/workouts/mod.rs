//! Workout logging types and scoring.

pub mod scorer;
pub mod types;

pub use scorer::{score, WorkoutReward, XP_CAP, XP_FLOOR};
pub use types::{
    is_measurement, parse_reps, CardioSession, Exercise, StatGains, WeightliftingSession,
    WorkoutDetails, WorkoutError, WorkoutRecord, WorkoutType,
};
