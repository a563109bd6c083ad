//! Profile input shared by `generate` and `plans save`.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;

use fitplan_core::{FieldErrors, ProfileField, ProfileForm};
use fitplan_store::models::UserProfile;

/// Profile fields. `--profile` loads a JSON object keyed by the web form's
/// field names; individual flags override values from it.
#[derive(Debug, Default, Args)]
pub struct ProfileArgs {
    /// JSON file with profile fields (name, age, fitnessGoal, ...)
    #[arg(long, value_name = "FILE")]
    pub profile: Option<PathBuf>,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub age: Option<String>,
    /// male, female, other or prefer-not-to-say
    #[arg(long)]
    pub gender: Option<String>,
    /// Height in cm
    #[arg(long)]
    pub height: Option<String>,
    /// Weight in kg
    #[arg(long)]
    pub weight: Option<String>,
    /// weight-loss, muscle-gain, maintenance, endurance, flexibility or rehabilitation
    #[arg(long)]
    pub goal: Option<String>,
    /// beginner, intermediate or advanced
    #[arg(long)]
    pub level: Option<String>,
    /// home, gym, outdoor or mixed
    #[arg(long)]
    pub location: Option<String>,
    /// vegetarian, non-vegetarian, vegan, keto, paleo or mediterranean
    #[arg(long)]
    pub diet: Option<String>,
    #[arg(long)]
    pub medical_history: Option<String>,
    /// low, moderate, high or very-high
    #[arg(long)]
    pub stress: Option<String>,
}

impl ProfileArgs {
    /// Fill a form from the profile file (if any) and then the flags.
    pub fn to_form(&self) -> Result<ProfileForm> {
        let mut form = match &self.profile {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read profile file: {}", path.display()))?;
                let value: serde_json::Value = serde_json::from_str(&content)
                    .with_context(|| format!("failed to parse profile file: {}", path.display()))?;
                let Some(object) = value.as_object() else {
                    bail!("profile file {} must hold a JSON object", path.display());
                };
                ProfileForm::from_json_object(object)
            }
            None => ProfileForm::new(),
        };

        let flags = [
            (ProfileField::Name, &self.name),
            (ProfileField::Age, &self.age),
            (ProfileField::Gender, &self.gender),
            (ProfileField::Height, &self.height),
            (ProfileField::Weight, &self.weight),
            (ProfileField::FitnessGoal, &self.goal),
            (ProfileField::FitnessLevel, &self.level),
            (ProfileField::WorkoutLocation, &self.location),
            (ProfileField::DietaryPreference, &self.diet),
            (ProfileField::MedicalHistory, &self.medical_history),
            (ProfileField::StressLevel, &self.stress),
        ];
        for (field, value) in flags {
            if let Some(value) = value {
                form.set(field, value);
            }
        }
        Ok(form)
    }

    /// Validate the profile, printing every field error on failure.
    pub fn submit(&self) -> Result<UserProfile> {
        let mut form = self.to_form()?;
        form.submit().map_err(|errors| {
            print_field_errors(&errors);
            anyhow::anyhow!("profile has {} invalid field(s)", errors.len())
        })
    }
}

pub fn print_field_errors(errors: &FieldErrors) {
    eprintln!("Please fix the following:");
    for field in errors.fields() {
        if let Some(message) = errors.get(field) {
            eprintln!("  --{:<16} {message}", flag_name(field));
        }
    }
}

/// The CLI flag that sets `field`.
fn flag_name(field: ProfileField) -> &'static str {
    match field {
        ProfileField::Name => "name",
        ProfileField::Age => "age",
        ProfileField::Gender => "gender",
        ProfileField::Height => "height",
        ProfileField::Weight => "weight",
        ProfileField::FitnessGoal => "goal",
        ProfileField::FitnessLevel => "level",
        ProfileField::WorkoutLocation => "location",
        ProfileField::DietaryPreference => "diet",
        ProfileField::MedicalHistory => "medical-history",
        ProfileField::StressLevel => "stress",
    }
}
