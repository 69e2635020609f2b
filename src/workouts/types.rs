//! Workout record and session detail types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of logged workout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutType {
    /// Resistance training with sets, reps and load
    Weightlifting,
    /// Running, cycling, swimming and similar sessions
    Cardio,
}

impl WorkoutType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutType::Weightlifting => "weightlifting",
            WorkoutType::Cardio => "cardio",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "weightlifting" => Some(WorkoutType::Weightlifting),
            "cardio" => Some(WorkoutType::Cardio),
            _ => None,
        }
    }
}

impl std::fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single exercise within a weightlifting session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    /// Exercise name (e.g. "Bench Press")
    pub name: String,
    /// Number of working sets
    pub sets: u32,
    /// Reps per set, either a number ("10") or a range ("8-12")
    pub reps: String,
    /// Load in kilograms
    pub weight: f64,
    /// Optional tempo notation, eccentric-hold-concentric (e.g. "3-1-2")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo: Option<String>,
}

impl Exercise {
    /// Create an exercise without tempo.
    pub fn new(name: impl Into<String>, sets: u32, reps: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            sets,
            reps: reps.into(),
            weight,
            tempo: None,
        }
    }

    /// Reps used for volume calculations.
    pub fn counted_reps(&self) -> u32 {
        parse_reps(&self.reps)
    }

    /// Training volume: sets x reps x weight.
    pub fn volume(&self) -> f64 {
        f64::from(self.sets) * f64::from(self.counted_reps()) * self.weight
    }
}

/// Parse a rep count or range into a single count.
///
/// Ranges count as their lower bound ("8-12" is 8). Anything that does not
/// start with a number counts as zero.
pub fn parse_reps(reps: &str) -> u32 {
    reps.split(['-', '–'])
        .next()
        .map(str::trim)
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(0)
}

/// Weightlifting session details.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeightliftingSession {
    pub exercises: Vec<Exercise>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Cardio session details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardioSession {
    /// Activity name (running, cycling, swimming, ...)
    pub activity: String,
    pub duration_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Type-specific workout payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "details", rename_all = "snake_case")]
pub enum WorkoutDetails {
    Weightlifting(WeightliftingSession),
    Cardio(CardioSession),
    /// A workout kind the scorer does not know about.
    Other { kind: String },
}

impl WorkoutDetails {
    /// Known workout type, if any.
    pub fn workout_type(&self) -> Option<WorkoutType> {
        match self {
            WorkoutDetails::Weightlifting(_) => Some(WorkoutType::Weightlifting),
            WorkoutDetails::Cardio(_) => Some(WorkoutType::Cardio),
            WorkoutDetails::Other { .. } => None,
        }
    }

    /// Stored type label.
    pub fn kind(&self) -> &str {
        match self {
            WorkoutDetails::Weightlifting(_) => WorkoutType::Weightlifting.as_str(),
            WorkoutDetails::Cardio(_) => WorkoutType::Cardio.as_str(),
            WorkoutDetails::Other { kind } => kind,
        }
    }

    /// Serialize the inner payload (without the type tag).
    pub fn payload_json(&self) -> Result<String, serde_json::Error> {
        match self {
            WorkoutDetails::Weightlifting(session) => serde_json::to_string(session),
            WorkoutDetails::Cardio(session) => serde_json::to_string(session),
            WorkoutDetails::Other { .. } => Ok("{}".to_string()),
        }
    }

    /// Check that every measurement can be stored and read back.
    ///
    /// JSON has no representation for NaN or infinity, and loads and
    /// distances are never negative.
    pub fn validate(&self) -> Result<(), WorkoutError> {
        match self {
            WorkoutDetails::Weightlifting(session) => {
                for exercise in &session.exercises {
                    if !is_measurement(exercise.weight) {
                        return Err(WorkoutError::InvalidWeight {
                            exercise: exercise.name.clone(),
                            weight: exercise.weight,
                        });
                    }
                }
                Ok(())
            }
            WorkoutDetails::Cardio(CardioSession {
                distance_km: Some(distance),
                ..
            }) if !is_measurement(*distance) => Err(WorkoutError::InvalidDistance(*distance)),
            _ => Ok(()),
        }
    }

    /// Rebuild details from a stored type label and payload.
    pub fn from_parts(kind: &str, payload: &str) -> Result<Self, serde_json::Error> {
        Ok(match WorkoutType::from_str(kind) {
            Some(WorkoutType::Weightlifting) => {
                WorkoutDetails::Weightlifting(serde_json::from_str(payload)?)
            }
            Some(WorkoutType::Cardio) => WorkoutDetails::Cardio(serde_json::from_str(payload)?),
            None => WorkoutDetails::Other {
                kind: kind.to_string(),
            },
        })
    }
}

/// A finite, non-negative quantity.
pub fn is_measurement(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// Workout payload errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorkoutError {
    #[error("Invalid weight {weight} for exercise '{exercise}'")]
    InvalidWeight { exercise: String, weight: f64 },

    #[error("Invalid distance: {0} km")]
    InvalidDistance(f64),
}

/// Stat increases produced by a workout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatGains {
    pub strength: u32,
    pub endurance: u32,
    pub agility: u32,
}

impl StatGains {
    pub fn is_zero(&self) -> bool {
        self.strength == 0 && self.endurance == 0 && self.agility == 0
    }
}

/// An immutable logged workout with the reward it earned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkoutRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(flatten)]
    pub details: WorkoutDetails,
    pub xp_earned: u32,
    pub stats_gained: StatGains,
    pub created_at: DateTime<Utc>,
}

impl WorkoutRecord {
    /// Create a record for a freshly scored workout.
    pub fn new(
        user_id: Uuid,
        details: WorkoutDetails,
        xp_earned: u32,
        stats_gained: StatGains,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            details,
            xp_earned,
            stats_gained,
            created_at,
        }
    }

    pub fn kind(&self) -> &str {
        self.details.kind()
    }
}
