//! Strict validation of model output into a [`WeekPlan`].
//!
//! Parses the raw model text and validates:
//! - The text is a JSON object (after stripping optional code fences).
//! - All seven day keys `day1`..`day7` are present and are objects.
//! - Each day has a `diet_plan` object with `breakfast`, `lunch` and `dinner`.
//! - Every day decodes into a [`DayPlan`] (numeric strings are accepted where
//!   numbers are expected, and vice versa).
//!
//! Keys the plan shape does not know about are dropped.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use fitplan_store::models::{DayKey, DayPlan, DietPlan, WeekPlan};

/// Reasons model output does not match the plan shape.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("response is not valid JSON: {0}")]
    NotJson(String),

    #[error("response JSON is not an object")]
    NotAnObject,

    #[error("missing day {0}")]
    MissingDay(DayKey),

    #[error("{0} is not an object")]
    DayNotObject(DayKey),

    #[error("{day} is missing diet_plan")]
    MissingDietPlan { day: DayKey },

    #[error("{day} diet_plan is missing {meal}")]
    MissingMeal { day: DayKey, meal: &'static str },

    #[error("{day} is invalid: {reason}")]
    InvalidDay { day: DayKey, reason: String },
}

/// Parse and validate raw model output.
pub fn parse_week_plan(raw: &str) -> Result<WeekPlan, SchemaError> {
    let body = strip_code_fence(raw);
    let value: Value =
        serde_json::from_str(body).map_err(|e| SchemaError::NotJson(e.to_string()))?;
    let Value::Object(mut root) = value else {
        return Err(SchemaError::NotAnObject);
    };

    for key in root.keys() {
        if key.parse::<DayKey>().is_err() {
            debug!(key = %key, "ignoring unknown top-level key in plan");
        }
    }

    let mut days = BTreeMap::new();
    for day in DayKey::ALL {
        let value = root
            .remove(day.as_str())
            .ok_or(SchemaError::MissingDay(day))?;
        days.insert(day, parse_day(day, value)?);
    }

    Ok(WeekPlan { days })
}

/// Validate and decode a single day.
fn parse_day(day: DayKey, value: Value) -> Result<DayPlan, SchemaError> {
    let Value::Object(mut obj) = value else {
        return Err(SchemaError::DayNotObject(day));
    };

    let diet = match obj.get_mut("diet_plan") {
        Some(Value::Object(diet)) => diet,
        _ => return Err(SchemaError::MissingDietPlan { day }),
    };
    for meal in DietPlan::REQUIRED_MEALS {
        if !matches!(diet.get(meal), Some(Value::Object(_))) {
            return Err(SchemaError::MissingMeal { day, meal });
        }
    }
    drop_non_meal_extras(day, diet);

    serde_json::from_value(Value::Object(obj)).map_err(|e| SchemaError::InvalidDay {
        day,
        reason: e.to_string(),
    })
}

/// Models sometimes add summary fields like `total_calories` next to the
/// meals. Only object-valued entries are meals.
fn drop_non_meal_extras(day: DayKey, diet: &mut Map<String, Value>) {
    diet.retain(|key, value| {
        let keep = value.is_object();
        if !keep {
            debug!(%day, key = %key, "dropping non-meal diet_plan entry");
        }
        keep
    });
}

/// Remove a surrounding Markdown code fence, if any.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the info string (e.g. "json") on the opening fence line.
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end()
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}
