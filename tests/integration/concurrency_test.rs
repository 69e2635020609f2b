//! Integration tests for concurrent submissions.
//!
//! Several service instances share one database file, as separate request
//! handlers or processes would.

use std::sync::Arc;
use std::thread;

use chrono::{Duration, Utc};
use tempfile::TempDir;
use uuid::Uuid;

use trainhero::progression::{Catalog, ProgressionService};
use trainhero::storage::{Database, ProgressionSettings};
use trainhero::workouts::{CardioSession, WorkoutDetails};

const WORKERS: usize = 4;
const WORKOUTS_PER_WORKER: usize = 5;

#[test]
fn test_concurrent_submissions_do_not_lose_updates() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shared.db");
    let catalog = Arc::new(Catalog::default());
    let now = Utc::now();
    let user_id = Uuid::new_v4();

    {
        let db = Database::open(&path).unwrap();
        let mut service =
            ProgressionService::new(db, Arc::clone(&catalog), ProgressionSettings::default());
        service.initialize_progression(user_id, "ada", now).unwrap();
    }

    let handles: Vec<_> = (0..WORKERS)
        .map(|worker| {
            let path = path.clone();
            let catalog = Arc::clone(&catalog);
            thread::spawn(move || {
                let db = Database::open(&path).unwrap();
                let mut service =
                    ProgressionService::new(db, catalog, ProgressionSettings::default());

                for i in 0..WORKOUTS_PER_WORKER {
                    let details = WorkoutDetails::Cardio(CardioSession {
                        activity: format!("worker {worker}"),
                        duration_minutes: 20,
                        distance_km: None,
                        notes: None,
                    });
                    let at = now + Duration::seconds((worker * WORKOUTS_PER_WORKER + i) as i64);
                    service.submit_workout(user_id, details, at).unwrap().unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let db = Database::open(&path).unwrap();
    let service = ProgressionService::new(db, catalog, ProgressionSettings::default());
    let total = (WORKERS * WORKOUTS_PER_WORKER) as u32;

    let profile = service.profile(user_id).unwrap().unwrap();
    assert_eq!(profile.total_workouts, total);
    assert_eq!(profile.endurance, 10 + 2 * total);
    assert_eq!(profile.agility, 10 + total);
    assert!(profile.xp < profile.xp_to_next_level);

    let stats = service.workout_stats(user_id).unwrap();
    assert_eq!(stats.total_workouts, total);

    // Each achievement and quest paid out at most once
    let unlocked: Vec<_> = service
        .achievements(user_id)
        .unwrap()
        .into_iter()
        .filter(|a| a.unlocked)
        .map(|a| a.achievement_id)
        .collect();
    assert!(unlocked.contains(&"first_workout".to_string()));
    assert!(unlocked.contains(&"workout_5".to_string()));
    assert!(unlocked.contains(&"workout_10".to_string()));
    assert!(unlocked.contains(&"endurance_20".to_string()));
}
