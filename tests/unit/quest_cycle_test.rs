//! Unit tests for the quest lifecycle.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use trainhero::progression::{advance, refresh, Catalog, QuestType};

fn at(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

#[test]
fn test_refresh_from_nothing_creates_one_per_template() {
    let catalog = Catalog::default();
    let user_id = Uuid::new_v4();
    // Thursday
    let now = at("2024-03-14T09:00:00Z");

    let plan = refresh(user_id, &[], &catalog.quests, now);
    assert!(plan.expired.is_empty());
    assert_eq!(plan.created.len(), catalog.quests.len());

    for quest in &plan.created {
        assert_eq!(quest.user_id, user_id);
        assert_eq!(quest.progress, 0);
        assert!(!quest.completed);
        let expected = match quest.quest_type {
            QuestType::Daily => at("2024-03-15T00:00:00Z"),
            QuestType::Weekly => at("2024-03-18T00:00:00Z"),
        };
        assert_eq!(quest.expires_at, expected, "{}", quest.template_id);
    }
}

#[test]
fn test_daily_cycle() {
    let catalog = Catalog::default();
    let user_id = Uuid::new_v4();
    let morning = at("2024-03-14T09:00:00Z");

    let mut quests = refresh(user_id, &[], &catalog.quests, morning).created;

    let first = advance(&mut quests, "cardio", morning);
    let completed: Vec<_> = first.completed.iter().map(|c| c.template_id.as_str()).collect();
    assert_eq!(completed, vec!["daily_workout"]);
    assert_eq!(first.bonus_xp, 25);

    let second = advance(&mut quests, "weightlifting", morning + Duration::hours(2));
    let completed: Vec<_> = second.completed.iter().map(|c| c.template_id.as_str()).collect();
    assert_eq!(completed, vec!["daily_double"]);
    assert_eq!(second.bonus_xp, 50);

    // Next day: the two daily instances are replaced, weeklies keep progress
    let tomorrow = at("2024-03-15T07:00:00Z");
    let plan = refresh(user_id, &quests, &catalog.quests, tomorrow);
    assert_eq!(plan.expired.len(), 2);
    assert_eq!(plan.created.len(), 2);
    assert!(plan
        .created
        .iter()
        .all(|q| q.quest_type == QuestType::Daily && q.expires_at == at("2024-03-16T00:00:00Z")));

    let weekly = quests
        .iter()
        .find(|q| q.template_id == "weekly_warrior")
        .unwrap();
    assert_eq!(weekly.progress, 2);
}

#[test]
fn test_expired_quest_does_not_advance() {
    let catalog = Catalog::default();
    let user_id = Uuid::new_v4();
    let now = at("2024-03-14T09:00:00Z");
    let mut quests = refresh(user_id, &[], &catalog.quests, now).created;

    // Exactly at the daily boundary the instance is kept by refresh but inactive
    let midnight = at("2024-03-15T00:00:00Z");
    let plan = refresh(user_id, &quests, &catalog.quests, midnight);
    assert!(plan.expired.is_empty());
    assert!(plan.created.is_empty());

    let outcome = advance(&mut quests, "cardio", midnight);
    assert_eq!(outcome.advanced.len(), 2);
    assert!(quests
        .iter()
        .filter(|q| q.quest_type == QuestType::Daily)
        .all(|q| q.progress == 0));
}
