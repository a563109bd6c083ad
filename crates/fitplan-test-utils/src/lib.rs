//! Shared test utilities for fitplan integration tests.
//!
//! Provides:
//! - profile and plan fixtures shaped like real model output
//! - file-backed plan stores in temporary directories
//! - a throwaway HTTP server for standing in for upstream APIs

use axum::Router;
use serde_json::{Value, json};
use tempfile::TempDir;

use fitplan_store::models::{
    DietaryPreference, FitnessGoal, FitnessLevel, Gender, StressLevel, UserProfile, WeekPlan,
    WorkoutLocation,
};
use fitplan_store::{FileSlot, PlanStore};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A valid profile: vegan woman aiming for muscle gain under very high stress.
pub fn sample_profile() -> UserProfile {
    UserProfile {
        name: "Maya Torres".to_string(),
        age: 29,
        gender: Gender::Female,
        height_cm: 168.0,
        weight_kg: 61.5,
        fitness_goal: FitnessGoal::MuscleGain,
        fitness_level: FitnessLevel::Intermediate,
        workout_location: WorkoutLocation::Gym,
        dietary_preference: DietaryPreference::Vegan,
        medical_history: Some("Old left knee sprain".to_string()),
        stress_level: Some(StressLevel::VeryHigh),
    }
}

/// Form field values (wire names) matching [`sample_profile`].
pub fn sample_form_values() -> Vec<(&'static str, &'static str)> {
    vec![
        ("name", "Maya Torres"),
        ("age", "29"),
        ("gender", "female"),
        ("height", "168"),
        ("weight", "61.5"),
        ("fitnessGoal", "muscle-gain"),
        ("fitnessLevel", "intermediate"),
        ("workoutLocation", "gym"),
        ("dietaryPreference", "vegan"),
        ("medicalHistory", "Old left knee sprain"),
        ("stressLevel", "very-high"),
    ]
}

/// One day of plan JSON as a model would return it. Numbers are mixed with
/// numeric strings on purpose.
pub fn sample_day_json(day: u8) -> Value {
    json!({
        "exercise_plan": [
            {
                "name": format!("Goblet Squat {day}"),
                "sets": 4,
                "reps": "8-12",
                "rest": "90s",
                "muscle_group": "legs",
                "notes": "Keep the chest up"
            },
            {
                "name": format!("Push-up {day}"),
                "sets": "3",
                "reps": 15,
                "rest": "60s",
                "muscle_group": "chest"
            }
        ],
        "diet_plan": {
            "breakfast": { "item": format!("Tofu scramble {day}"), "calories": 420, "protein_g": 28 },
            "lunch": { "item": format!("Lentil bowl {day}"), "calories": "560", "protein_g": "31" },
            "dinner": { "item": format!("Tempeh stir fry {day}"), "calories": 610, "protein_g": 35, "notes": "Add broccoli" }
        },
        "exercise_tts_prompt": format!("Day {day}. Start with goblet squats, then push-ups."),
        "diet_tts_prompt": format!("Fuel day {day} with tofu, lentils and tempeh."),
        "exercise_image_prompt": "woman doing goblet squats in a gym",
        "diet_image_prompt": "colorful vegan bowls",
        "motivation_quote": "Breathe, you are already stronger than yesterday."
    })
}

/// A complete seven-day plan document.
pub fn sample_week_plan_json() -> Value {
    let mut days = serde_json::Map::new();
    for day in 1..=7u8 {
        days.insert(format!("day{day}"), sample_day_json(day));
    }
    Value::Object(days)
}

/// [`sample_week_plan_json`] decoded into a [`WeekPlan`].
pub fn sample_week_plan() -> WeekPlan {
    serde_json::from_value(sample_week_plan_json()).expect("sample plan should decode")
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// A file-backed store in a fresh temporary directory.
///
/// Keep the returned [`TempDir`] alive for as long as the store is used.
pub fn temp_store() -> (PlanStore<FileSlot>, TempDir) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let store = PlanStore::new(FileSlot::new(dir.path().join("fitnessPlans.json")));
    (store, dir)
}

// ---------------------------------------------------------------------------
// Fake upstreams
// ---------------------------------------------------------------------------

/// Serve `router` on an ephemeral localhost port and return its base URL.
///
/// The server runs on a background task for the rest of the test.
pub async fn spawn_upstream(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind fake upstream");
    let addr = listener
        .local_addr()
        .expect("fake upstream has no local address");
    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("fake upstream crashed");
    });
    format!("http://{addr}")
}
