//! Workout scoring.
//!
//! Converts a logged session into XP and stat gains. Scoring is pure and
//! deterministic so the same details always produce the same reward.

use serde::Serialize;

use super::types::{CardioSession, StatGains, WeightliftingSession, WorkoutDetails};

/// Upper bound on XP from a single workout.
pub const XP_CAP: u32 = 50;

/// Minimum XP awarded for any recognised workout.
pub const XP_FLOOR: u32 = 10;

/// Maximum strength or endurance gain from a single workout.
pub const MAX_PRIMARY_STAT_GAIN: u32 = 3;

/// XP granted per exercise in a weightlifting session.
const XP_PER_EXERCISE: u32 = 5;

/// Training volume (kg) per XP point.
const VOLUME_PER_XP: f64 = 100.0;

/// XP granted per kilometer of cardio.
const XP_PER_KM: f64 = 5.0;

/// Result of scoring a workout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct WorkoutReward {
    pub xp: u32,
    pub stats: StatGains,
}

/// Score a workout.
///
/// Unknown workout kinds score nothing and are not lifted to the XP floor.
pub fn score(details: &WorkoutDetails) -> WorkoutReward {
    match details {
        WorkoutDetails::Weightlifting(session) => score_weightlifting(session),
        WorkoutDetails::Cardio(session) => score_cardio(session),
        WorkoutDetails::Other { .. } => WorkoutReward::default(),
    }
}

/// Score a weightlifting session from its total volume and exercise count.
pub fn score_weightlifting(session: &WeightliftingSession) -> WorkoutReward {
    let exercise_count = u32::try_from(session.exercises.len()).unwrap_or(u32::MAX);
    let volume: f64 = session.exercises.iter().map(|e| e.volume()).sum();

    let volume_xp = floor_to_u32(volume / VOLUME_PER_XP);
    let xp = volume_xp
        .saturating_add(exercise_count.saturating_mul(XP_PER_EXERCISE))
        .min(XP_CAP);

    WorkoutReward {
        xp: xp.max(XP_FLOOR),
        stats: StatGains {
            strength: exercise_count.min(MAX_PRIMARY_STAT_GAIN),
            endurance: 0,
            agility: u32::from(exercise_count >= 3),
        },
    }
}

/// Score a cardio session from its duration and distance.
pub fn score_cardio(session: &CardioSession) -> WorkoutReward {
    let duration = session.duration_minutes;
    let distance_xp = floor_to_u32(session.distance_km.unwrap_or(0.0) * XP_PER_KM);
    let xp = (duration / 2).saturating_add(distance_xp).min(XP_CAP);

    WorkoutReward {
        xp: xp.max(XP_FLOOR),
        stats: StatGains {
            strength: 0,
            endurance: (duration / 10).min(MAX_PRIMARY_STAT_GAIN),
            agility: u32::from(duration >= 20),
        },
    }
}

/// Floor a non-negative quantity into XP. Negative and NaN inputs count as zero.
fn floor_to_u32(value: f64) -> u32 {
    if value.is_nan() || value <= 0.0 {
        0
    } else {
        // `as` saturates for out-of-range floats.
        value.floor() as u32
    }
}
