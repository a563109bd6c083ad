//! Plan request service.
//!
//! Validates the profile, builds the prompt, makes exactly one call to the
//! plan model and validates the response. No retries and no side effects
//! beyond the network call; regeneration is simply another call.

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use fitplan_store::models::{UserProfile, WeekPlan};

use crate::plan::prompt::build_plan_prompt;
use crate::plan::schema::parse_week_plan;
use crate::profile::{FieldErrors, ProfileForm};
use crate::upstream::{PlanModel, UpstreamError};

/// Errors from generating a plan.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("profile is invalid: {0}")]
    Validation(FieldErrors),

    #[error("{feature} is not configured (set {variable})")]
    UpstreamConfig {
        feature: &'static str,
        variable: &'static str,
    },

    /// The body is kept for diagnostics only and is not part of the message.
    #[error("plan generation failed, please try again")]
    Upstream { status: Option<u16>, body: String },

    #[error("model returned a malformed plan: {reason}")]
    MalformedResponse { reason: String, raw: String },

    #[error("a plan is already being generated")]
    Busy,
}

impl PlanError {
    /// Raw model output, when the failure was a malformed response.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Self::MalformedResponse { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

impl From<UpstreamError> for PlanError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::MissingCredential { variable, .. } => Self::UpstreamConfig {
                feature: "plan generation",
                variable,
            },
            UpstreamError::Status { status, body, .. } => Self::Upstream {
                status: Some(status),
                body,
            },
            UpstreamError::Transport { source, .. } => Self::Upstream {
                status: source.status().map(|s| s.as_u16()),
                body: source.to_string(),
            },
            UpstreamError::Decode { reason, .. } => Self::Upstream {
                status: None,
                body: reason,
            },
        }
    }
}

/// Generates weekly plans through a [`PlanModel`].
#[derive(Clone)]
pub struct PlanService {
    model: Arc<dyn PlanModel>,
}

impl PlanService {
    pub fn new(model: Arc<dyn PlanModel>) -> Self {
        Self { model }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Generate a seven-day plan for `profile`.
    ///
    /// The profile is re-validated first so a hand-built profile with
    /// out-of-range values never reaches the network.
    pub async fn generate_plan(&self, profile: &UserProfile) -> Result<WeekPlan, PlanError> {
        let profile = ProfileForm::from_profile(profile)
            .submit()
            .map_err(PlanError::Validation)?;

        let prompt = build_plan_prompt(&profile);
        info!(model = %self.model.name(), name = %profile.name, "requesting plan");

        let raw = self.model.complete_json(&prompt).await.map_err(|e| {
            match &e {
                UpstreamError::MissingCredential { .. } => warn!(error = %e, "plan model unavailable"),
                _ => error!(error = %e, "plan model call failed"),
            }
            PlanError::from(e)
        })?;

        match parse_week_plan(&raw) {
            Ok(plan) => {
                info!(days = plan.days.len(), "plan generated");
                Ok(plan)
            }
            Err(e) => {
                error!(error = %e, raw = %raw, "model returned a malformed plan");
                Err(PlanError::MalformedResponse {
                    reason: e.to_string(),
                    raw,
                })
            }
        }
    }

    /// Validate a form and generate a plan for it. On validation failure the
    /// form keeps its values and records the errors.
    pub async fn generate_from_form(
        &self,
        form: &mut ProfileForm,
    ) -> Result<(UserProfile, WeekPlan), PlanError> {
        let profile = form.submit().map_err(PlanError::Validation)?;
        let plan = self.generate_plan(&profile).await?;
        Ok((profile, plan))
    }
}

impl std::fmt::Debug for PlanService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanService")
            .field("model", &self.model.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use fitplan_store::models::{
        DietaryPreference, FitnessGoal, FitnessLevel, Gender, WorkoutLocation,
    };

    struct CannedModel {
        reply: Result<String, u16>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PlanModel for CannedModel {
        fn name(&self) -> &str {
            "canned"
        }

        async fn complete_json(&self, _prompt: &str) -> Result<String, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(UpstreamError::Status {
                    service: "canned",
                    status: *status,
                    body: "quota exhausted for project 123".into(),
                }),
            }
        }
    }

    fn service(reply: Result<String, u16>) -> (PlanService, Arc<CannedModel>) {
        let model = Arc::new(CannedModel {
            reply,
            calls: AtomicUsize::new(0),
        });
        (PlanService::new(model.clone()), model)
    }

    fn profile() -> UserProfile {
        UserProfile {
            name: "Ana Ruiz".into(),
            age: 35,
            gender: Gender::Female,
            height_cm: 165.0,
            weight_kg: 60.0,
            fitness_goal: FitnessGoal::Endurance,
            fitness_level: FitnessLevel::Advanced,
            workout_location: WorkoutLocation::Outdoor,
            dietary_preference: DietaryPreference::Mediterranean,
            medical_history: None,
            stress_level: None,
        }
    }

    #[tokio::test]
    async fn invalid_profile_never_calls_model() {
        let (svc, model) = service(Ok("{}".into()));
        let mut bad = profile();
        bad.age = 12;
        let err = svc.generate_plan(&bad).await.unwrap_err();
        match err {
            PlanError::Validation(fields) => assert_eq!(fields.len(), 1),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn upstream_status_message_is_generic() {
        let (svc, _) = service(Err(503));
        let err = svc.generate_plan(&profile()).await.unwrap_err();
        assert!(matches!(err, PlanError::Upstream { status: Some(503), .. }));
        assert!(!err.to_string().contains("quota"));
    }

    #[tokio::test]
    async fn non_json_is_malformed_and_keeps_raw() {
        let (svc, model) = service(Ok("I cannot help with that".into()));
        let err = svc.generate_plan(&profile()).await.unwrap_err();
        assert_eq!(err.raw_response(), Some("I cannot help with that"));
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn missing_credential_maps_to_config_error() {
        let err = PlanError::from(UpstreamError::MissingCredential {
            service: "gemini",
            variable: "GEMINI_API_KEY",
        });
        assert!(matches!(
            err,
            PlanError::UpstreamConfig {
                variable: "GEMINI_API_KEY",
                ..
            }
        ));
    }
}
