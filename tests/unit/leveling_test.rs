//! Unit tests for the leveling ledger and achievement evaluation.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use trainhero::progression::{
    apply_xp, evaluate, xp_to_level, AchievementInstance, Catalog, ProgressionRecord,
};
use trainhero::workouts::StatGains;

fn at(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

fn fresh() -> ProgressionRecord {
    ProgressionRecord::new(Uuid::new_v4(), "tester", at("2024-03-01T00:00:00Z"))
}

#[test]
fn test_level_up_carries_remainder() {
    let mut record = fresh();
    record.xp = 95;

    let next = apply_xp(&record, 10, &StatGains::default());
    assert_eq!(next.level, 2);
    assert_eq!(next.xp, 5);
    assert_eq!(next.xp_to_next_level, 200);
    assert_eq!(next.total_workouts, 1);

    // The input snapshot is untouched
    assert_eq!(record.xp, 95);
}

#[test]
fn test_invariant_holds_for_any_delta() {
    for delta in [0, 1, 99, 100, 101, 299, 300, 1_000, 25_000] {
        let next = apply_xp(&fresh(), delta, &StatGains::default());
        assert!(next.xp < next.xp_to_next_level, "delta {delta}");
        assert_eq!(next.xp_to_next_level, xp_to_level(next.level));
    }
}

#[test]
fn test_large_grant_cascades_several_levels() {
    // 100 + 200 + 300 = 600 reaches level 4 exactly
    let next = apply_xp(&fresh(), 600, &StatGains::default());
    assert_eq!(next.level, 4);
    assert_eq!(next.xp, 0);
    assert_eq!(next.xp_to_next_level, 400);
}

#[test]
fn test_tenth_workout_unlocks_warrior() {
    let catalog = Catalog::default();
    let mut record = fresh();
    record.total_workouts = 9;

    let mut instances: Vec<_> = catalog
        .achievements
        .iter()
        .map(|d| AchievementInstance::from_definition(record.user_id, d))
        .collect();

    // Earlier milestones were already earned
    let earlier = at("2024-03-05T00:00:00Z");
    for instance in instances
        .iter_mut()
        .filter(|a| a.achievement_id == "first_workout" || a.achievement_id == "workout_5")
    {
        instance.unlock(earlier);
    }

    let record = apply_xp(&record, 20, &StatGains::default());
    let now = at("2024-03-14T09:00:00Z");
    let evaluation = evaluate(&record, &mut instances, now);

    assert_eq!(evaluation.unlocked, vec!["workout_10"]);
    assert_eq!(evaluation.bonus_xp, 100);

    // Re-evaluating a superset state never unlocks twice
    let mut stronger = record.clone();
    stronger.total_workouts = 30;
    stronger.strength = 60;
    let again = evaluate(&stronger, &mut instances, now + Duration::days(1));
    assert!(!again.unlocked.contains(&"workout_10".to_string()));

    let warrior = instances
        .iter()
        .find(|a| a.achievement_id == "workout_10")
        .unwrap();
    assert_eq!(warrior.unlocked_at, Some(now));

    let first = instances
        .iter()
        .find(|a| a.achievement_id == "first_workout")
        .unwrap();
    assert_eq!(first.unlocked_at, Some(earlier));
}
