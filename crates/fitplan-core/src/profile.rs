//! Profile form: per-field validation and submission.
//!
//! The form holds raw string values exactly as a user typed or selected
//! them. [`ProfileForm::submit`] validates every field, collects all errors
//! at once, and only then produces a [`UserProfile`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use fitplan_store::models::{
    DietaryPreference, EnumParseError, FitnessGoal, FitnessLevel, Gender, StressLevel,
    UserProfile, WorkoutLocation,
};

/// Inclusive age bounds in years.
pub const AGE_RANGE: (i64, i64) = (13, 120);
/// Inclusive height bounds in centimetres.
pub const HEIGHT_RANGE_CM: (f64, f64) = (100.0, 250.0);
/// Inclusive weight bounds in kilograms.
pub const WEIGHT_RANGE_KG: (f64, f64) = (30.0, 300.0);
/// Name length bounds in characters.
pub const NAME_LEN: (usize, usize) = (2, 50);

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// A form field, named by its wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProfileField {
    Name,
    Age,
    Gender,
    Height,
    Weight,
    FitnessGoal,
    FitnessLevel,
    WorkoutLocation,
    DietaryPreference,
    MedicalHistory,
    StressLevel,
}

impl ProfileField {
    pub const ALL: [ProfileField; 11] = [
        Self::Name,
        Self::Age,
        Self::Gender,
        Self::Height,
        Self::Weight,
        Self::FitnessGoal,
        Self::FitnessLevel,
        Self::WorkoutLocation,
        Self::DietaryPreference,
        Self::MedicalHistory,
        Self::StressLevel,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Age => "age",
            Self::Gender => "gender",
            Self::Height => "height",
            Self::Weight => "weight",
            Self::FitnessGoal => "fitnessGoal",
            Self::FitnessLevel => "fitnessLevel",
            Self::WorkoutLocation => "workoutLocation",
            Self::DietaryPreference => "dietaryPreference",
            Self::MedicalHistory => "medicalHistory",
            Self::StressLevel => "stressLevel",
        }
    }

    /// Whether the field must be filled in before submitting.
    pub fn is_required(self) -> bool {
        !matches!(self, Self::MedicalHistory | Self::StressLevel)
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileField {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| EnumParseError {
                kind: "profile field",
                value: s.to_owned(),
            })
    }
}

/// Validation failures keyed by field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(pub BTreeMap<ProfileField, String>);

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: ProfileField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = ProfileField> + '_ {
        self.0.keys().copied()
    }

    /// Wire-name keyed map, suitable for a JSON error body.
    pub fn to_wire_map(&self) -> BTreeMap<&'static str, String> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.clone())).collect()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        f.write_str(&parts.join("; "))
    }
}

// ---------------------------------------------------------------------------
// Per-field rules
// ---------------------------------------------------------------------------

fn parse_name(value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("Name is required".into());
    }
    let len = trimmed.chars().count();
    if len < NAME_LEN.0 {
        return Err(format!("Name must be at least {} characters", NAME_LEN.0));
    }
    if len > NAME_LEN.1 {
        return Err(format!("Name must be at most {} characters", NAME_LEN.1));
    }
    if !trimmed.chars().all(|c| c.is_alphabetic() || c.is_whitespace()) {
        return Err("Name can only contain letters and spaces".into());
    }
    Ok(trimmed.to_owned())
}

fn number_text(field: ProfileField, n: &serde_json::Number) -> String {
    match (field, n.as_f64()) {
        (ProfileField::Age, Some(f)) if !n.is_i64() && !n.is_u64() && f.fract() == 0.0 => {
            format!("{f:.0}")
        }
        _ => n.to_string(),
    }
}

fn parse_age(value: &str) -> Result<u32, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("Age is required".into());
    }
    let msg = || format!("Age must be between {} and {}", AGE_RANGE.0, AGE_RANGE.1);
    let age: i64 = trimmed.parse().map_err(|_| msg())?;
    if !(AGE_RANGE.0..=AGE_RANGE.1).contains(&age) {
        return Err(msg());
    }
    u32::try_from(age).map_err(|_| msg())
}

fn parse_measure(value: &str, label: &str, unit: &str, range: (f64, f64)) -> Result<f64, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{label} is required"));
    }
    let msg = || format!("{label} must be between {}{unit} and {}{unit}", range.0, range.1);
    let n: f64 = trimmed.parse().map_err(|_| msg())?;
    if !n.is_finite() || n < range.0 || n > range.1 {
        return Err(msg());
    }
    Ok(n)
}

fn parse_choice<T: FromStr>(value: &str, prompt: &str, noun: &str) -> Result<T, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("Please select {prompt}"));
    }
    trimmed
        .parse::<T>()
        .map_err(|_| format!("Please select a valid {noun}"))
}

fn parse_stress(value: &str) -> Result<Option<StressLevel>, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse()
        .map(Some)
        .map_err(|_| "Please select a valid stress level".to_string())
}

fn parse_medical_history(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// `(empty prompt, invalid noun)` for the select-style fields.
fn choice_labels(field: ProfileField) -> (&'static str, &'static str) {
    match field {
        ProfileField::Gender => ("your gender", "gender"),
        ProfileField::FitnessGoal => ("a fitness goal", "fitness goal"),
        ProfileField::FitnessLevel => ("your fitness level", "fitness level"),
        ProfileField::WorkoutLocation => ("your preferred workout location", "workout location"),
        ProfileField::DietaryPreference => ("your dietary preference", "dietary preference"),
        ProfileField::StressLevel => ("your stress level", "stress level"),
        _ => ("a value", "value"),
    }
}

fn choice_check<T: FromStr>(field: ProfileField, value: &str) -> Result<(), String> {
    let (prompt, noun) = choice_labels(field);
    parse_choice::<T>(value, prompt, noun).map(drop)
}

/// Validate a single field value. Returns the error message, if any.
pub fn validate_field(field: ProfileField, value: &str) -> Option<String> {
    let result = match field {
        ProfileField::Name => parse_name(value).map(drop),
        ProfileField::Age => parse_age(value).map(drop),
        ProfileField::Height => parse_measure(value, "Height", "cm", HEIGHT_RANGE_CM).map(drop),
        ProfileField::Weight => parse_measure(value, "Weight", "kg", WEIGHT_RANGE_KG).map(drop),
        ProfileField::Gender => choice_check::<Gender>(field, value),
        ProfileField::FitnessGoal => choice_check::<FitnessGoal>(field, value),
        ProfileField::FitnessLevel => choice_check::<FitnessLevel>(field, value),
        ProfileField::WorkoutLocation => choice_check::<WorkoutLocation>(field, value),
        ProfileField::DietaryPreference => choice_check::<DietaryPreference>(field, value),
        ProfileField::StressLevel => parse_stress(value).map(drop),
        ProfileField::MedicalHistory => Ok(()),
    };
    result.err()
}

// ---------------------------------------------------------------------------
// Form
// ---------------------------------------------------------------------------

/// Raw form state: entered values plus the errors from the last submit.
#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    values: BTreeMap<ProfileField, String>,
    errors: FieldErrors,
}

impl ProfileForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a form from `(wire name, value)` pairs. Unknown names are ignored.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut form = Self::new();
        for (name, value) in pairs {
            if let Ok(field) = name.parse() {
                form.set(field, value);
            }
        }
        form
    }

    /// Build a form from a JSON object keyed by wire name, as posted by the
    /// web form. Numbers are taken as their decimal text, except that a
    /// whole-valued float age (`29.0`) becomes `29`. `null`, booleans and
    /// nested values count as missing.
    pub fn from_json_object(object: &serde_json::Map<String, serde_json::Value>) -> Self {
        let mut form = Self::new();
        for (name, value) in object {
            let Ok(field) = name.parse::<ProfileField>() else {
                continue;
            };
            match value {
                serde_json::Value::String(s) => form.set(field, s),
                serde_json::Value::Number(n) => form.set(field, &number_text(field, n)),
                _ => {}
            }
        }
        form
    }

    /// Populate a form from a validated profile (e.g. to edit a saved plan's profile).
    pub fn from_profile(profile: &UserProfile) -> Self {
        let mut form = Self::new();
        form.set(ProfileField::Name, &profile.name);
        form.set(ProfileField::Age, &profile.age.to_string());
        form.set(ProfileField::Gender, &profile.gender.to_string());
        form.set(ProfileField::Height, &profile.height_cm.to_string());
        form.set(ProfileField::Weight, &profile.weight_kg.to_string());
        form.set(ProfileField::FitnessGoal, &profile.fitness_goal.to_string());
        form.set(ProfileField::FitnessLevel, &profile.fitness_level.to_string());
        form.set(ProfileField::WorkoutLocation, &profile.workout_location.to_string());
        form.set(ProfileField::DietaryPreference, &profile.dietary_preference.to_string());
        if let Some(history) = &profile.medical_history {
            form.set(ProfileField::MedicalHistory, history);
        }
        if let Some(stress) = profile.stress_level {
            form.set(ProfileField::StressLevel, &stress.to_string());
        }
        form
    }

    /// Set a field value and clear any pending error on it.
    pub fn set(&mut self, field: ProfileField, value: &str) {
        self.values.insert(field, value.to_owned());
        self.errors.0.remove(&field);
    }

    pub fn value(&self, field: ProfileField) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or("")
    }

    /// Errors from the most recent [`submit`](Self::submit).
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Validate every field. On failure all errors are returned (and kept on
    /// the form) and the entered values are left untouched.
    pub fn submit(&mut self) -> Result<UserProfile, FieldErrors> {
        let mut errors = BTreeMap::new();

        let name = record(&mut errors, ProfileField::Name, parse_name(self.value(ProfileField::Name)));
        let age = record(&mut errors, ProfileField::Age, parse_age(self.value(ProfileField::Age)));
        let height = record(
            &mut errors,
            ProfileField::Height,
            parse_measure(self.value(ProfileField::Height), "Height", "cm", HEIGHT_RANGE_CM),
        );
        let weight = record(
            &mut errors,
            ProfileField::Weight,
            parse_measure(self.value(ProfileField::Weight), "Weight", "kg", WEIGHT_RANGE_KG),
        );
        let gender = record(&mut errors, ProfileField::Gender, self.choice(ProfileField::Gender));
        let goal = record(&mut errors, ProfileField::FitnessGoal, self.choice(ProfileField::FitnessGoal));
        let level = record(&mut errors, ProfileField::FitnessLevel, self.choice(ProfileField::FitnessLevel));
        let location = record(
            &mut errors,
            ProfileField::WorkoutLocation,
            self.choice(ProfileField::WorkoutLocation),
        );
        let diet = record(
            &mut errors,
            ProfileField::DietaryPreference,
            self.choice(ProfileField::DietaryPreference),
        );
        let stress = record(
            &mut errors,
            ProfileField::StressLevel,
            parse_stress(self.value(ProfileField::StressLevel)),
        );

        let (
            Some(name),
            Some(age),
            Some(height_cm),
            Some(weight_kg),
            Some(gender),
            Some(fitness_goal),
            Some(fitness_level),
            Some(workout_location),
            Some(dietary_preference),
            Some(stress_level),
        ) = (name, age, height, weight, gender, goal, level, location, diet, stress)
        else {
            self.errors = FieldErrors(errors);
            return Err(self.errors.clone());
        };

        self.errors = FieldErrors::default();
        Ok(UserProfile {
            name,
            age,
            gender,
            height_cm,
            weight_kg,
            fitness_goal,
            fitness_level,
            workout_location,
            dietary_preference,
            medical_history: parse_medical_history(self.value(ProfileField::MedicalHistory)),
            stress_level,
        })
    }

    fn choice<T: FromStr>(&self, field: ProfileField) -> Result<T, String> {
        let (prompt, noun) = choice_labels(field);
        parse_choice(self.value(field), prompt, noun)
    }
}

/// Keep `r`'s value, or record its error under `field`.
fn record<T>(
    errors: &mut BTreeMap<ProfileField, String>,
    field: ProfileField,
    r: Result<T, String>,
) -> Option<T> {
    match r {
        Ok(v) => Some(v),
        Err(msg) => {
            errors.insert(field, msg);
            None
        }
    }
}
