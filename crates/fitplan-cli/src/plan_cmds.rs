//! CLI handlers for `fitplan plans` subcommands.
//!
//! Implements:
//! - `fitplan plans list`              -- list saved plans, newest first
//! - `fitplan plans show <plan>`       -- print one saved plan
//! - `fitplan plans latest`            -- print the most recently saved plan
//! - `fitplan plans delete <plan>`     -- remove a saved plan
//! - `fitplan plans save <file> ...`   -- save a plan JSON file with a profile

use std::path::Path;

use anyhow::{Context, Result};

use fitplan_core::export::{DocumentHeader, render_document};
use fitplan_core::plan::parse_week_plan;
use fitplan_store::PlanRepository;
use fitplan_store::models::{DayKey, SavedPlan, WeekPlan};

use crate::PlansCommands;
use crate::profile_args::ProfileArgs;
use crate::resolve::load_saved_plan;

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

/// Dispatch a `PlansCommands` variant to the appropriate handler.
pub async fn run_plans_command(command: PlansCommands, store: &dyn PlanRepository) -> Result<()> {
    match command {
        PlansCommands::List => cmd_list(store).await,
        PlansCommands::Show { plan, json } => cmd_show(store, Some(&plan), json).await,
        PlansCommands::Latest { json } => cmd_show(store, None, json).await,
        PlansCommands::Delete { plan } => cmd_delete(store, &plan).await,
        PlansCommands::Save { file, profile } => cmd_save(store, &file, &profile).await,
    }
}

// -----------------------------------------------------------------------
// fitplan plans list
// -----------------------------------------------------------------------

async fn cmd_list(store: &dyn PlanRepository) -> Result<()> {
    let plans = store.list().await;

    if plans.is_empty() {
        println!("No saved plans. Use `fitplan generate --save` to create one.");
        return Ok(());
    }

    let id_w = 36;
    let name_w = plans
        .iter()
        .map(|p| p.user_data.name.chars().count())
        .max()
        .unwrap_or(4)
        .max(4);
    let goal_w = plans
        .iter()
        .map(|p| p.user_data.fitness_goal.to_string().len())
        .max()
        .unwrap_or(4)
        .max(4);

    println!(
        "{:<id_w$}  {:<name_w$}  {:<goal_w$}  {:>4}  {:>9}  {:>8}  SAVED",
        "ID", "NAME", "GOAL", "DAYS", "EXERCISES", "KCAL",
    );
    for plan in &plans {
        let stats = PlanStats::of(&plan.plan);
        println!(
            "{:<id_w$}  {:<name_w$}  {:<goal_w$}  {:>4}  {:>9}  {:>8}  {}",
            plan.id,
            plan.user_data.name,
            plan.user_data.fitness_goal.to_string(),
            plan.plan.days.len(),
            stats.exercise_count,
            stats.total_calories,
            plan.generated_at.format("%Y-%m-%d %H:%M"),
        );
    }

    Ok(())
}

/// Day-one figures shown in the plan list.
#[derive(Debug, Default, PartialEq, Eq)]
struct PlanStats {
    exercise_count: usize,
    total_calories: i64,
}

impl PlanStats {
    fn of(plan: &WeekPlan) -> Self {
        let Some(day) = plan.day(DayKey::Day1) else {
            return Self::default();
        };
        Self {
            exercise_count: day.exercise_plan.len(),
            total_calories: day
                .diet_plan
                .meals()
                .map(|(_, meal)| leading_int(&meal.calories))
                .sum(),
        }
    }
}

/// The integer at the start of `text` (`"450 kcal"` is 450), or 0.
fn leading_int(text: &str) -> i64 {
    let text = text.trim_start();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, text.strip_prefix('+').unwrap_or(text)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().map_or(0, |n| sign * n)
}

// -----------------------------------------------------------------------
// fitplan plans show / latest
// -----------------------------------------------------------------------

async fn cmd_show(store: &dyn PlanRepository, plan: Option<&str>, json: bool) -> Result<()> {
    let saved = load_saved_plan(store, plan).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&saved).context("failed to encode saved plan")?
        );
        return Ok(());
    }

    print_summary(&saved);
    println!();
    print!(
        "{}",
        render_document(&DocumentHeader::from(&saved.user_data), &saved.plan)
    );
    Ok(())
}

fn print_summary(saved: &SavedPlan) {
    let profile = &saved.user_data;
    println!("Plan: {}", saved.id);
    println!(
        "  Saved:        {}",
        saved.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("  Name:         {}", profile.name);
    println!(
        "  Profile:      {} y/o {}, {} cm, {} kg",
        profile.age, profile.gender, profile.height_cm, profile.weight_kg
    );
    println!(
        "  Training:     {} / {} / {}",
        profile.fitness_goal, profile.fitness_level, profile.workout_location
    );
    println!("  Diet:         {}", profile.dietary_preference);
    if let Some(stress) = profile.stress_level {
        println!("  Stress:       {stress}");
    }
    let missing = saved.plan.missing_days();
    if !missing.is_empty() {
        let missing: Vec<String> = missing.iter().map(ToString::to_string).collect();
        println!("  Missing days: {}", missing.join(", "));
    }
}

// -----------------------------------------------------------------------
// fitplan plans delete <plan>
// -----------------------------------------------------------------------

async fn cmd_delete(store: &dyn PlanRepository, plan: &str) -> Result<()> {
    let saved = load_saved_plan(store, Some(plan)).await?;
    let remaining = store
        .delete(saved.id)
        .await
        .with_context(|| format!("failed to delete plan {}", saved.id))?;

    println!(
        "Deleted plan {} ({}). {} saved plan(s) remain.",
        saved.id,
        saved.user_data.name,
        remaining.len()
    );
    Ok(())
}

// -----------------------------------------------------------------------
// fitplan plans save <file>
// -----------------------------------------------------------------------

/// Save a plan from a JSON file. The file must pass the same schema check
/// as a freshly generated plan.
async fn cmd_save(store: &dyn PlanRepository, file: &Path, profile: &ProfileArgs) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read plan file: {}", file.display()))?;
    let plan = parse_week_plan(&content)
        .with_context(|| format!("plan file {} is not a valid weekly plan", file.display()))?;
    let profile = profile.submit()?;

    let saved = store
        .save(&profile, &plan)
        .await
        .context("failed to save plan")?;

    println!("Saved plan {} for {}.", saved.id, saved.user_data.name);
    Ok(())
}
