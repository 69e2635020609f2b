//! Unit tests for workout scoring.

use trainhero::workouts::scorer::{score_cardio, score_weightlifting};
use trainhero::workouts::{
    score, CardioSession, Exercise, WeightliftingSession, WorkoutDetails, XP_CAP, XP_FLOOR,
};

fn session(exercises: Vec<Exercise>) -> WeightliftingSession {
    WeightliftingSession {
        exercises,
        notes: None,
    }
}

fn cardio(duration_minutes: u32, distance_km: Option<f64>) -> CardioSession {
    CardioSession {
        activity: "cycling".to_string(),
        duration_minutes,
        distance_km,
        notes: None,
    }
}

#[test]
fn test_weightlifting_example() {
    // 3x10 at 50kg = 1500 volume -> 15 XP, plus 5 for one exercise
    let reward = score_weightlifting(&session(vec![Exercise::new("Bench", 3, "10", 50.0)]));
    assert_eq!(reward.xp, 20);
    assert_eq!(reward.stats.strength, 1);
    assert_eq!(reward.stats.endurance, 0);
    assert_eq!(reward.stats.agility, 0);
}

#[test]
fn test_rep_range_counts_lower_bound() {
    let ranged = score_weightlifting(&session(vec![Exercise::new("Row", 4, "8-12", 60.0)]));
    let fixed = score_weightlifting(&session(vec![Exercise::new("Row", 4, "8", 60.0)]));
    assert_eq!(ranged, fixed);
}

#[test]
fn test_empty_lifting_session_gets_floor() {
    let reward = score_weightlifting(&session(vec![]));
    assert_eq!(reward.xp, XP_FLOOR);
    assert!(reward.stats.is_zero());
}

#[test]
fn test_cardio_example() {
    // 40 min / 2 = 20, 6 km * 5 = 30 -> 50
    let reward = score_cardio(&cardio(40, Some(6.0)));
    assert_eq!(reward.xp, 50);
    assert_eq!(reward.stats.endurance, 3);
    assert_eq!(reward.stats.agility, 1);
}

#[test]
fn test_missing_distance_counts_as_zero() {
    assert_eq!(score_cardio(&cardio(30, None)), score_cardio(&cardio(30, Some(0.0))));
}

#[test]
fn test_xp_bounds_over_sessions() {
    for sets in [0, 1, 5, 20] {
        for weight in [0.0, 20.0, 250.0] {
            let exercises = (0..sets)
                .map(|i| Exercise::new(format!("Lift {i}"), sets, "12", weight))
                .collect();
            let xp = score_weightlifting(&session(exercises)).xp;
            assert!((XP_FLOOR..=XP_CAP).contains(&xp), "lifting xp {xp}");
        }
    }

    for minutes in [0, 1, 19, 20, 60, 600] {
        for distance in [None, Some(0.5), Some(42.2)] {
            let xp = score_cardio(&cardio(minutes, distance)).xp;
            assert!((XP_FLOOR..=XP_CAP).contains(&xp), "cardio xp {xp}");
        }
    }
}

#[test]
fn test_unknown_kind_scores_nothing() {
    let reward = score(&WorkoutDetails::Other {
        kind: "yoga".to_string(),
    });
    assert_eq!(reward.xp, 0);
    assert!(reward.stats.is_zero());
}
