//! Plain-text rendering of a weekly plan.
//!
//! Used for terminal display and for the exported plan document. Days absent
//! from a stored plan are skipped.

use std::fmt::Write;

use fitplan_store::models::{DayPlan, Exercise, Meal, UserProfile, WeekPlan};

const DAY_SEPARATOR: &str = "──────────────────────────────────────────────";

/// Profile fields shown in the document header. All optional so a plan can
/// be rendered without knowing who it was made for.
#[derive(Debug, Clone, Default)]
pub struct DocumentHeader {
    pub name: Option<String>,
    pub goal: Option<String>,
    pub level: Option<String>,
    pub diet: Option<String>,
}

impl From<&UserProfile> for DocumentHeader {
    fn from(p: &UserProfile) -> Self {
        Self {
            name: Some(p.name.clone()),
            goal: Some(p.fitness_goal.to_string()),
            level: Some(p.fitness_level.to_string()),
            diet: Some(p.dietary_preference.to_string()),
        }
    }
}

fn or_placeholder(value: &Option<String>, placeholder: &'static str) -> String {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(placeholder)
        .to_string()
}

fn dash_if_blank(value: &str) -> &str {
    if value.trim().is_empty() { "-" } else { value }
}

/// Render the full plan document.
pub fn render_document(header: &DocumentHeader, plan: &WeekPlan) -> String {
    let mut out = String::with_capacity(4096);

    let _ = writeln!(out, "AI Fitness Plan for {}", or_placeholder(&header.name, "User"));
    let _ = writeln!(
        out,
        "Goal: {}  •  Level: {}  •  Diet: {}",
        or_placeholder(&header.goal, "N/A"),
        or_placeholder(&header.level, "N/A"),
        or_placeholder(&header.diet, "N/A"),
    );

    let days: Vec<_> = plan.iter().collect();
    for (index, (day, content)) in days.iter().enumerate() {
        out.push('\n');
        let _ = writeln!(out, "Day {}", day.number());
        render_day(&mut out, content);
        if index + 1 < days.len() {
            out.push('\n');
            out.push_str(DAY_SEPARATOR);
            out.push('\n');
        }
    }

    out
}

/// Render a single day's sections.
pub fn render_day(out: &mut String, day: &DayPlan) {
    if !day.motivation_quote.trim().is_empty() {
        let _ = writeln!(out, "Motivation: {}", day.motivation_quote.trim());
    }

    out.push_str("\nWorkout:\n");
    if day.exercise_plan.is_empty() {
        out.push_str("• Rest day\n");
    }
    for ex in &day.exercise_plan {
        out.push_str(&exercise_line(ex));
        out.push('\n');
        push_notes(out, ex.notes.as_deref());
    }

    out.push_str("\nDiet:\n");
    for (key, meal) in day.diet_plan.meals() {
        out.push_str(&meal_line(key, meal));
        out.push('\n');
        push_notes(out, meal.notes.as_deref());
    }
}

fn push_notes(out: &mut String, notes: Option<&str>) {
    if let Some(notes) = notes.map(str::trim).filter(|n| !n.is_empty()) {
        let _ = writeln!(out, "   Notes: {notes}");
    }
}

pub fn exercise_line(ex: &Exercise) -> String {
    format!(
        "• {} — {} sets × {} (Rest: {}, Muscle: {})",
        ex.name,
        ex.sets,
        dash_if_blank(&ex.reps),
        dash_if_blank(&ex.rest),
        dash_if_blank(&ex.muscle_group),
    )
}

pub fn meal_line(key: &str, meal: &Meal) -> String {
    format!(
        "{}: {}  —  {} kcal, {}g protein",
        key.to_uppercase(),
        dash_if_blank(&meal.item),
        dash_if_blank(&meal.calories),
        dash_if_blank(&meal.protein_g),
    )
}

/// Default export file name: `fitness-plan-<Name_With_Underscores>.txt`.
pub fn default_file_name(name: Option<&str>) -> String {
    let safe = name
        .unwrap_or_default()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");
    let safe = if safe.is_empty() { "user".to_string() } else { safe };
    format!("fitness-plan-{safe}.txt")
}
