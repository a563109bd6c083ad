//! Saved-plan lookup for commands that take a plan argument.
//!
//! A plan may be named by its full UUID, by any unambiguous prefix of it, or
//! by the word `latest`. Omitting the argument also means the latest plan.

use thiserror::Error;
use uuid::Uuid;

use fitplan_store::PlanRepository;
use fitplan_store::models::SavedPlan;

/// Keyword selecting the most recently saved plan.
pub const LATEST: &str = "latest";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no saved plans yet; run `fitplan generate --save` first")]
    Empty,

    #[error("no saved plan matches {0:?}")]
    NotFound(String),

    #[error("{input:?} matches {count} saved plans; give more of the ID")]
    Ambiguous { input: String, count: usize },
}

/// Pick the plan `input` refers to from `plans` (most recent first).
pub fn resolve_saved_plan<'a>(
    input: Option<&str>,
    plans: &'a [SavedPlan],
) -> Result<&'a SavedPlan, ResolveError> {
    let input = input.map(str::trim).filter(|s| !s.is_empty());

    let Some(input) = input.filter(|s| !s.eq_ignore_ascii_case(LATEST)) else {
        return plans.first().ok_or(ResolveError::Empty);
    };

    if let Ok(id) = Uuid::parse_str(input) {
        return plans
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| ResolveError::NotFound(input.to_string()));
    }

    let prefix = input.to_ascii_lowercase();
    let mut matches = plans
        .iter()
        .filter(|p| p.id.to_string().starts_with(&prefix));
    match (matches.next(), matches.count()) {
        (Some(plan), 0) => Ok(plan),
        (Some(_), more) => Err(ResolveError::Ambiguous {
            input: input.to_string(),
            count: more + 1,
        }),
        (None, _) => Err(ResolveError::NotFound(input.to_string())),
    }
}

/// Load the saved plan `input` refers to.
pub async fn load_saved_plan(
    store: &dyn PlanRepository,
    input: Option<&str>,
) -> Result<SavedPlan, ResolveError> {
    let plans = store.list().await;
    resolve_saved_plan(input, &plans).cloned()
}
