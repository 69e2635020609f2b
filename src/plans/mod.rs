//! Training plans module.
//!
//! Users keep named lists of planned exercises. At most one plan per user is
//! active at a time.

pub mod manager;
pub mod types;

pub use manager::{PlanError, PlanManager};
pub use types::{PlanExercise, PlanUpdate, TrainingPlan};
