use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Error returned when a wire string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value:?}")]
pub struct EnumParseError {
    pub kind: &'static str,
    pub value: String,
}

impl EnumParseError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Gender as selected on the profile form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Gender {
    Male,
    Female,
    Other,
    PreferNotToSay,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
            Self::PreferNotToSay => "prefer-not-to-say",
        };
        f.write_str(s)
    }
}

impl FromStr for Gender {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            "other" => Ok(Self::Other),
            "prefer-not-to-say" => Ok(Self::PreferNotToSay),
            other => Err(EnumParseError::new("gender", other)),
        }
    }
}

// ---------------------------------------------------------------------------

/// What the user wants the plan to achieve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FitnessGoal {
    WeightLoss,
    MuscleGain,
    Maintenance,
    Endurance,
    Flexibility,
    Rehabilitation,
}

impl fmt::Display for FitnessGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::WeightLoss => "weight-loss",
            Self::MuscleGain => "muscle-gain",
            Self::Maintenance => "maintenance",
            Self::Endurance => "endurance",
            Self::Flexibility => "flexibility",
            Self::Rehabilitation => "rehabilitation",
        };
        f.write_str(s)
    }
}

impl FromStr for FitnessGoal {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weight-loss" => Ok(Self::WeightLoss),
            "muscle-gain" => Ok(Self::MuscleGain),
            "maintenance" => Ok(Self::Maintenance),
            "endurance" => Ok(Self::Endurance),
            "flexibility" => Ok(Self::Flexibility),
            "rehabilitation" => Ok(Self::Rehabilitation),
            other => Err(EnumParseError::new("fitness goal", other)),
        }
    }
}

// ---------------------------------------------------------------------------

/// Self-reported training experience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FitnessLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl fmt::Display for FitnessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        };
        f.write_str(s)
    }
}

impl FromStr for FitnessLevel {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            other => Err(EnumParseError::new("fitness level", other)),
        }
    }
}

// ---------------------------------------------------------------------------

/// Where the workouts will take place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkoutLocation {
    Home,
    Gym,
    Outdoor,
    Mixed,
}

impl fmt::Display for WorkoutLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Home => "home",
            Self::Gym => "gym",
            Self::Outdoor => "outdoor",
            Self::Mixed => "mixed",
        };
        f.write_str(s)
    }
}

impl FromStr for WorkoutLocation {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "home" => Ok(Self::Home),
            "gym" => Ok(Self::Gym),
            "outdoor" => Ok(Self::Outdoor),
            "mixed" => Ok(Self::Mixed),
            other => Err(EnumParseError::new("workout location", other)),
        }
    }
}

// ---------------------------------------------------------------------------

/// Dietary preference used for the meal plan and the motivation tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DietaryPreference {
    Vegetarian,
    NonVegetarian,
    Vegan,
    Keto,
    Paleo,
    Mediterranean,
}

impl fmt::Display for DietaryPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Vegetarian => "vegetarian",
            Self::NonVegetarian => "non-vegetarian",
            Self::Vegan => "vegan",
            Self::Keto => "keto",
            Self::Paleo => "paleo",
            Self::Mediterranean => "mediterranean",
        };
        f.write_str(s)
    }
}

impl FromStr for DietaryPreference {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vegetarian" => Ok(Self::Vegetarian),
            "non-vegetarian" => Ok(Self::NonVegetarian),
            "vegan" => Ok(Self::Vegan),
            "keto" => Ok(Self::Keto),
            "paleo" => Ok(Self::Paleo),
            "mediterranean" => Ok(Self::Mediterranean),
            other => Err(EnumParseError::new("dietary preference", other)),
        }
    }
}

// ---------------------------------------------------------------------------

/// Self-reported stress level. Softens the motivation tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StressLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl fmt::Display for StressLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
            Self::VeryHigh => "very-high",
        };
        f.write_str(s)
    }
}

impl FromStr for StressLevel {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "moderate" => Ok(Self::Moderate),
            "high" => Ok(Self::High),
            "very-high" => Ok(Self::VeryHigh),
            other => Err(EnumParseError::new("stress level", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// A fully validated user profile.
///
/// Field names on the wire match the web form (`fitnessGoal`, `height`, ...)
/// so saved plans and HTTP bodies share one shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    #[serde(rename = "height")]
    pub height_cm: f64,
    #[serde(rename = "weight")]
    pub weight_kg: f64,
    pub fitness_goal: FitnessGoal,
    pub fitness_level: FitnessLevel,
    pub workout_location: WorkoutLocation,
    pub dietary_preference: DietaryPreference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress_level: Option<StressLevel>,
}

// ---------------------------------------------------------------------------
// Week plan
// ---------------------------------------------------------------------------

/// One of the seven day slots of a [`WeekPlan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayKey {
    Day1,
    Day2,
    Day3,
    Day4,
    Day5,
    Day6,
    Day7,
}

impl DayKey {
    /// All day keys in plan order.
    pub const ALL: [DayKey; 7] = [
        Self::Day1,
        Self::Day2,
        Self::Day3,
        Self::Day4,
        Self::Day5,
        Self::Day6,
        Self::Day7,
    ];

    /// 1-based day number.
    pub fn number(self) -> u8 {
        match self {
            Self::Day1 => 1,
            Self::Day2 => 2,
            Self::Day3 => 3,
            Self::Day4 => 4,
            Self::Day5 => 5,
            Self::Day6 => 6,
            Self::Day7 => 7,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day1 => "day1",
            Self::Day2 => "day2",
            Self::Day3 => "day3",
            Self::Day4 => "day4",
            Self::Day5 => "day5",
            Self::Day6 => "day6",
            Self::Day7 => "day7",
        }
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayKey {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| EnumParseError::new("day key", s))
    }
}

/// A single exercise entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    #[serde(deserialize_with = "count_from_number_or_string")]
    pub sets: u32,
    #[serde(deserialize_with = "string_from_scalar")]
    pub reps: String,
    #[serde(default, deserialize_with = "string_from_scalar")]
    pub rest: String,
    #[serde(default)]
    pub muscle_group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A single meal. Calories and protein are kept as numeric strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub item: String,
    #[serde(deserialize_with = "string_from_scalar")]
    pub calories: String,
    #[serde(deserialize_with = "string_from_scalar")]
    pub protein_g: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// The three required meals plus any extra named meals (snacks).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietPlan {
    pub breakfast: Meal,
    pub lunch: Meal,
    pub dinner: Meal,
    #[serde(flatten)]
    pub extras: BTreeMap<String, Meal>,
}

impl DietPlan {
    /// Required meal keys, in display order.
    pub const REQUIRED_MEALS: [&'static str; 3] = ["breakfast", "lunch", "dinner"];

    /// Iterate all meals as `(key, meal)`: required meals first, then extras.
    pub fn meals(&self) -> impl Iterator<Item = (&str, &Meal)> {
        [
            ("breakfast", &self.breakfast),
            ("lunch", &self.lunch),
            ("dinner", &self.dinner),
        ]
        .into_iter()
        .chain(self.extras.iter().map(|(k, m)| (k.as_str(), m)))
    }
}

/// Everything generated for one day of the week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    #[serde(default)]
    pub exercise_plan: Vec<Exercise>,
    pub diet_plan: DietPlan,
    #[serde(default)]
    pub exercise_tts_prompt: String,
    #[serde(default)]
    pub diet_tts_prompt: String,
    #[serde(default)]
    pub exercise_image_prompt: String,
    #[serde(default)]
    pub diet_image_prompt: String,
    #[serde(default)]
    pub motivation_quote: String,
}

impl DayPlan {
    /// Narration text for the day: exercise narration followed by diet narration.
    pub fn narration_text(&self) -> String {
        [self.exercise_tts_prompt.trim(), self.diet_tts_prompt.trim()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A weekly plan: day key to [`DayPlan`], in day order.
///
/// Plans produced by generation always carry all seven days. Plans read back
/// from storage may not, and consumers skip missing days.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeekPlan {
    pub days: BTreeMap<DayKey, DayPlan>,
}

impl WeekPlan {
    pub fn day(&self, key: DayKey) -> Option<&DayPlan> {
        self.days.get(&key)
    }

    /// Present days in order.
    pub fn iter(&self) -> impl Iterator<Item = (DayKey, &DayPlan)> {
        self.days.iter().map(|(k, v)| (*k, v))
    }

    pub fn is_complete(&self) -> bool {
        DayKey::ALL.iter().all(|d| self.days.contains_key(d))
    }

    /// Day keys absent from this plan.
    pub fn missing_days(&self) -> Vec<DayKey> {
        DayKey::ALL
            .into_iter()
            .filter(|d| !self.days.contains_key(d))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Saved plan
// ---------------------------------------------------------------------------

/// A plan the user explicitly saved, with a snapshot of their profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPlan {
    pub id: Uuid,
    #[serde(rename = "userData")]
    pub user_data: UserProfile,
    pub plan: WeekPlan,
    #[serde(rename = "generatedAt")]
    pub generated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Lenient scalar decoding for model output
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Int(i64),
    Float(f64),
}

/// Accept a JSON string or number and keep it as a string.
fn string_from_scalar<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Text(s) => s,
        Scalar::Int(n) => n.to_string(),
        Scalar::Float(n) => n.to_string(),
    })
}

/// Accept a non-negative integer given as a number or a numeric string.
fn count_from_number_or_string<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Scalar::deserialize(deserializer)? {
        Scalar::Int(n) => u32::try_from(n).map_err(|_| D::Error::custom(format!("invalid count {n}"))),
        Scalar::Float(n) if n >= 0.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX) => Ok(n as u32),
        Scalar::Float(n) => Err(D::Error::custom(format!("invalid count {n}"))),
        Scalar::Text(s) => s
            .trim()
            .parse::<u32>()
            .map_err(|_| D::Error::custom(format!("invalid count {s:?}"))),
    }
}
