//! Database schema definitions for TrainHero.

/// SQL schema for creating all database tables.
pub const SCHEMA: &str = r#"
-- Users table (progression record)
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    level INTEGER NOT NULL DEFAULT 1,
    xp INTEGER NOT NULL DEFAULT 0,
    xp_to_next_level INTEGER NOT NULL DEFAULT 100,
    strength INTEGER NOT NULL DEFAULT 10,
    endurance INTEGER NOT NULL DEFAULT 10,
    agility INTEGER NOT NULL DEFAULT 10,
    total_workouts INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_users_level ON users(level DESC, xp DESC);

-- Workouts table (immutable log)
CREATE TABLE IF NOT EXISTS workouts (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    workout_type TEXT NOT NULL,
    details_json TEXT NOT NULL,
    xp_earned INTEGER NOT NULL,
    strength_gained INTEGER NOT NULL DEFAULT 0,
    endurance_gained INTEGER NOT NULL DEFAULT 0,
    agility_gained INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_workouts_user_id ON workouts(user_id);
CREATE INDEX IF NOT EXISTS idx_workouts_created_at ON workouts(user_id, created_at);

-- Achievement instances (one per user and catalog entry)
CREATE TABLE IF NOT EXISTS achievements (
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    achievement_id TEXT NOT NULL,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    icon TEXT NOT NULL,
    xp_reward INTEGER NOT NULL,
    condition_json TEXT NOT NULL,
    unlocked INTEGER NOT NULL DEFAULT 0,
    unlocked_at TEXT,
    PRIMARY KEY (user_id, achievement_id)
);

-- Quest instances (one live instance per user and template)
CREATE TABLE IF NOT EXISTS quests (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    template_id TEXT NOT NULL,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    quest_type TEXT NOT NULL,
    target INTEGER NOT NULL,
    progress INTEGER NOT NULL DEFAULT 0,
    xp_reward INTEGER NOT NULL,
    completed INTEGER NOT NULL DEFAULT 0,
    expires_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_quests_user_id ON quests(user_id);

-- Training plans
CREATE TABLE IF NOT EXISTS training_plans (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    exercises_json TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_training_plans_user_id ON training_plans(user_id);
"#;

/// Schema version tracking table.
pub const SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);
"#;

/// Migrations in order. Entry `n` upgrades the schema to version `n + 1`.
pub const MIGRATIONS: &[&str] = &[SCHEMA];

/// Current schema version.
pub const CURRENT_VERSION: i32 = MIGRATIONS.len() as i32;
