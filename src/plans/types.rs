//! Training plan type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named training plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingPlan {
    /// Unique identifier
    pub id: Uuid,
    /// User who owns this plan
    pub user_id: Uuid,
    /// Display name
    pub name: String,
    /// Planned exercises, in order
    pub exercises: Vec<PlanExercise>,
    /// Whether this is the user's current plan
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TrainingPlan {
    /// Create a new active plan.
    pub fn new(user_id: Uuid, name: impl Into<String>, exercises: Vec<PlanExercise>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: name.into(),
            exercises,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One exercise in a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanExercise {
    pub name: String,
    #[serde(default = "default_sets")]
    pub sets: u32,
    /// Rep count or range, e.g. "10" or "8-12"
    #[serde(default = "default_reps")]
    pub reps: String,
    /// Working weight in kg
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PlanExercise {
    /// Exercise with default sets and reps.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sets: default_sets(),
            reps: default_reps(),
            weight: None,
            notes: None,
        }
    }
}

fn default_sets() -> u32 {
    3
}

fn default_reps() -> String {
    "10".to_string()
}

/// Partial update to a plan. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanUpdate {
    pub name: Option<String>,
    pub exercises: Option<Vec<PlanExercise>>,
    pub is_active: Option<bool>,
}
