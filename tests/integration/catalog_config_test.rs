//! Integration tests for configuration and custom catalogs.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tempfile::TempDir;
use uuid::Uuid;

use trainhero::progression::ProgressionService;
use trainhero::storage::config::{load_config_from, save_config_to, AppConfig};
use trainhero::storage::{ConfigError, Database};
use trainhero::workouts::{CardioSession, WorkoutDetails};

const CATALOG: &str = r#"
[[achievements]]
id = "first_run"
name = "Off the Couch"
description = "Log a workout"
icon = "shoe"
xp_reward = 30
condition = { total_workouts = 1 }

[[quests]]
id = "weekly_pair"
name = "Pair Up"
description = "Complete 2 workouts this week"
quest_type = "weekly"
target = 2
xp_reward = 40
"#;

fn at(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

#[test]
fn test_configured_catalog_drives_progression() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("catalog.toml"), CATALOG).unwrap();

    let config_path = dir.path().join("config.toml");
    let config = AppConfig {
        catalog_file: Some(PathBuf::from("catalog.toml")),
        ..Default::default()
    };
    save_config_to(&config_path, &config).unwrap();

    let config = load_config_from(&config_path, dir.path().to_path_buf()).unwrap();
    let catalog = config.load_catalog().unwrap();
    let db = Database::open(&config.database_path()).unwrap();
    let mut service = ProgressionService::new(db, Arc::new(catalog), config.progression.clone());

    let user_id = Uuid::new_v4();
    let now = at("2024-03-14T09:00:00Z");
    service.initialize_progression(user_id, "ada", now).unwrap();

    assert_eq!(service.achievements(user_id).unwrap().len(), 1);
    let quests = service.active_quests(user_id, now).unwrap();
    assert_eq!(quests.len(), 1);
    assert_eq!(quests[0].template_id, "weekly_pair");

    let run = || {
        WorkoutDetails::Cardio(CardioSession {
            activity: "running".to_string(),
            duration_minutes: 20,
            distance_km: None,
            notes: None,
        })
    };

    let first = service.submit_workout(user_id, run(), now).unwrap().unwrap();
    assert_eq!(first.unlocked_achievements, vec!["first_run"]);
    assert!(first.completed_quests.is_empty());

    let second = service.submit_workout(user_id, run(), now).unwrap().unwrap();
    assert_eq!(second.completed_quests.len(), 1);
    // 10 + 30, then 10 + 40
    assert_eq!(second.progression.xp, 90);

    assert!(config.database_path().exists());
}

#[test]
fn test_missing_catalog_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let config = AppConfig {
        data_dir: dir.path().to_path_buf(),
        catalog_file: Some(PathBuf::from("nope.toml")),
        ..Default::default()
    };

    assert!(matches!(config.load_catalog(), Err(ConfigError::IoError(_))));
}
