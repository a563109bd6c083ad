//! `fitplan generate`: validate a profile, request a plan, show it, and
//! optionally save or write it out.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use fitplan_core::export::{DocumentHeader, render_document};
use fitplan_core::session::SaveError;
use fitplan_core::{PlanError, PlanSession};
use fitplan_store::PlanRepository;
use fitplan_store::models::UserProfile;

use crate::config::FitplanConfig;
use crate::profile_args::{ProfileArgs, print_field_errors};

pub struct GenerateOptions {
    pub save: bool,
    pub output: Option<PathBuf>,
    pub json: bool,
}

pub async fn run_generate(
    config: &FitplanConfig,
    profile: &ProfileArgs,
    options: &GenerateOptions,
) -> Result<()> {
    let profile = profile.submit()?;
    let store: Arc<dyn PlanRepository> = Arc::new(config.open_store());
    let services = config.services();
    let model = services.plans.model_name().to_string();
    let session = PlanSession::new(services, store, profile);

    eprintln!(
        "Generating a 7-day plan for {} with {model}...",
        session.profile().name
    );
    let plan = session
        .generate()
        .await
        .map_err(|e| generation_failure(e, session.profile()))?;

    let document = render_document(&DocumentHeader::from(session.profile()), &plan);
    if options.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&plan).context("failed to encode plan")?
        );
    } else {
        print!("{document}");
    }

    if let Some(path) = &options.output {
        std::fs::write(path, document)
            .with_context(|| format!("cannot write plan document: {}", path.display()))?;
        eprintln!("Plan written to {}", path.display());
    }

    if options.save {
        match session.save().await {
            Ok(saved) => {
                info!(id = %saved.id, "plan saved");
                eprintln!("Saved plan {}", saved.id);
            }
            Err(SaveError::Store(e)) => {
                return Err(e).context("plan was generated but could not be saved");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

/// Turn a generation error into a diagnostic that includes the submitted
/// profile, so the user can see exactly what was sent.
fn generation_failure(err: PlanError, profile: &UserProfile) -> anyhow::Error {
    if let PlanError::Validation(errors) = &err {
        print_field_errors(errors);
    }
    let submitted =
        serde_json::to_string_pretty(profile).unwrap_or_else(|_| format!("{profile:?}"));
    anyhow::Error::new(err).context(format!(
        "could not generate a plan for this profile:\n{submitted}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitplan_test_utils::sample_profile;

    #[test]
    fn failure_shows_profile_and_cause() {
        let err = generation_failure(
            PlanError::MalformedResponse {
                reason: "missing day7".into(),
                raw: "{}".into(),
            },
            &sample_profile(),
        );
        let shown = format!("{err:#}");
        assert!(shown.contains("\"name\": \"Maya Torres\""));
        assert!(shown.contains("missing day7"));
    }

    #[test]
    fn upstream_body_is_not_shown() {
        let err = generation_failure(
            PlanError::Upstream {
                status: Some(503),
                body: "internal trace id 42".into(),
            },
            &sample_profile(),
        );
        let shown = format!("{err:#}");
        assert!(shown.contains("please try again"));
        assert!(!shown.contains("trace id"));
    }
}
