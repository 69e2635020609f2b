//! Integration tests for training plans through the service.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use trainhero::plans::{PlanError, PlanExercise, PlanUpdate, TrainingPlan};
use trainhero::progression::{Catalog, ProgressionService};
use trainhero::storage::{Database, ProgressionSettings};

fn service() -> ProgressionService {
    ProgressionService::new(
        Database::open_in_memory().unwrap(),
        Arc::new(Catalog::default()),
        ProgressionSettings::default(),
    )
}

#[test]
fn test_plan_lifecycle() {
    let mut service = service();
    let user = service
        .initialize_progression(Uuid::new_v4(), "ada", Utc::now())
        .unwrap();
    let plans = service.plans();

    let mut squat = PlanExercise::new("Squat");
    squat.sets = 5;
    squat.reps = "5".to_string();
    squat.weight = Some(100.0);

    let strength = TrainingPlan::new(user.user_id, "Strength", vec![squat]);
    plans.create(&strength).unwrap();
    assert_eq!(plans.active(user.user_id).unwrap().unwrap().id, strength.id);

    let mut conditioning = TrainingPlan::new(
        user.user_id,
        "Conditioning",
        vec![PlanExercise::new("Burpees")],
    );
    conditioning.created_at = strength.created_at + chrono::Duration::seconds(1);
    conditioning.updated_at = conditioning.created_at;
    plans.create(&conditioning).unwrap();

    let listed = plans.list(user.user_id).unwrap();
    let names: Vec<_> = listed.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Conditioning", "Strength"]);
    assert_eq!(listed.iter().filter(|p| p.is_active).count(), 1);

    let reactivated = plans
        .update(
            user.user_id,
            strength.id,
            &PlanUpdate {
                is_active: Some(true),
                ..Default::default()
            },
        )
        .unwrap();
    assert!(reactivated.is_active);
    assert_eq!(reactivated.exercises[0].weight, Some(100.0));
    assert_eq!(plans.active(user.user_id).unwrap().unwrap().id, strength.id);

    plans.delete(user.user_id, strength.id).unwrap();
    assert!(plans.active(user.user_id).unwrap().is_none());
    assert_eq!(plans.list(user.user_id).unwrap().len(), 1);
    assert!(matches!(
        plans.delete(user.user_id, strength.id),
        Err(PlanError::NotFound(_))
    ));
}

#[test]
fn test_rename_rejects_blank_name() {
    let mut service = service();
    let user = service
        .initialize_progression(Uuid::new_v4(), "grace", Utc::now())
        .unwrap();
    let plans = service.plans();
    let plan = TrainingPlan::new(user.user_id, "Upper", vec![]);
    plans.create(&plan).unwrap();

    let result = plans.update(
        user.user_id,
        plan.id,
        &PlanUpdate {
            name: Some("  ".to_string()),
            ..Default::default()
        },
    );
    assert!(matches!(result, Err(PlanError::ValidationError(_))));
    assert_eq!(plans.get(plan.id).unwrap().unwrap().name, "Upper");
}

#[test]
fn test_plans_are_scoped_to_their_owner() {
    let mut service = service();
    let now = Utc::now();
    let owner = service
        .initialize_progression(Uuid::new_v4(), "ada", now)
        .unwrap();
    let other = service
        .initialize_progression(Uuid::new_v4(), "grace", now)
        .unwrap();
    let plans = service.plans();

    let plan = TrainingPlan::new(owner.user_id, "Strength", vec![PlanExercise::new("Squat")]);
    plans.create(&plan).unwrap();

    let activate = PlanUpdate {
        is_active: Some(true),
        ..Default::default()
    };
    assert!(matches!(
        plans.update(other.user_id, plan.id, &activate),
        Err(PlanError::NotFound(_))
    ));
    assert!(matches!(
        plans.delete(other.user_id, plan.id),
        Err(PlanError::NotFound(_))
    ));
    assert!(plans.active(other.user_id).unwrap().is_none());

    let kept = plans.active(owner.user_id).unwrap().unwrap();
    assert_eq!(kept.id, plan.id);
    assert_eq!(kept.name, "Strength");
}
