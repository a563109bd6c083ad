//! Motivation-quote tone composition.
//!
//! Three profile dimensions each contribute an independent tonal element:
//! gender sets the voice, dietary preference sets the fuel mindset, and the
//! fitness goal sets the theme. Stress level never replaces any of them; it
//! only softens how the combined tone is delivered.

use std::fmt;

use fitplan_store::models::{DietaryPreference, FitnessGoal, Gender, StressLevel, UserProfile};

/// How strongly the combined tone is dampened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Normal motivational delivery.
    Neutral,
    /// Balanced, calm encouragement.
    Calm,
    /// Soft, supportive delivery.
    Soft,
    /// Very gentle reassurance.
    VeryGentle,
}

impl Delivery {
    pub fn for_stress(stress: Option<StressLevel>) -> Self {
        match stress {
            None | Some(StressLevel::Low) => Self::Neutral,
            Some(StressLevel::Moderate) => Self::Calm,
            Some(StressLevel::High) => Self::Soft,
            Some(StressLevel::VeryHigh) => Self::VeryGentle,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Self::Neutral => "a normal motivational tone",
            Self::Calm => "balanced, calm encouragement",
            Self::Soft => "a soft, supportive tone",
            Self::VeryGentle => "very gentle reassurance",
        }
    }
}

/// The composed tone for a profile's motivation quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotivationTone {
    pub voice: &'static str,
    pub mindset: &'static str,
    pub theme: &'static str,
    pub delivery: Delivery,
}

impl MotivationTone {
    pub fn for_profile(profile: &UserProfile) -> Self {
        Self::compose(
            profile.gender,
            profile.dietary_preference,
            profile.fitness_goal,
            profile.stress_level,
        )
    }

    pub fn compose(
        gender: Gender,
        diet: DietaryPreference,
        goal: FitnessGoal,
        stress: Option<StressLevel>,
    ) -> Self {
        Self {
            voice: voice_for(gender),
            mindset: mindset_for(diet),
            theme: theme_for(goal),
            delivery: Delivery::for_stress(stress),
        }
    }
}

impl fmt::Display for MotivationTone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} voice, {} mindset, themed on {}, delivered as {}",
            self.voice,
            self.mindset,
            self.theme,
            self.delivery.describe()
        )
    }
}

fn voice_for(gender: Gender) -> &'static str {
    match gender {
        Gender::Male => "strong, disciplined",
        Gender::Female => "empowering, confident",
        Gender::Other | Gender::PreferNotToSay => "neutral, inspiring",
    }
}

fn mindset_for(diet: DietaryPreference) -> &'static str {
    match diet {
        DietaryPreference::Vegetarian => "plant-powered",
        DietaryPreference::NonVegetarian => "protein-fuel",
        DietaryPreference::Vegan => "clean-fuel",
        DietaryPreference::Keto => "keto lifestyle",
        DietaryPreference::Paleo => "paleo lifestyle",
        DietaryPreference::Mediterranean => "mediterranean lifestyle",
    }
}

fn theme_for(goal: FitnessGoal) -> &'static str {
    match goal {
        FitnessGoal::WeightLoss => "consistency and discipline",
        FitnessGoal::MuscleGain => "strength and progress",
        FitnessGoal::Maintenance => "steady habits and balance",
        FitnessGoal::Endurance => "stamina and pushing limits",
        FitnessGoal::Flexibility => "calm and mindful movement",
        FitnessGoal::Rehabilitation => "gentle, patient recovery",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn very_high_stress_softens_high_energy_tone() {
        let tone = MotivationTone::compose(
            Gender::Female,
            DietaryPreference::Vegan,
            FitnessGoal::MuscleGain,
            Some(StressLevel::VeryHigh),
        );
        let rendered = tone.to_string();
        assert!(rendered.contains("empowering"), "{rendered}");
        assert!(rendered.contains("clean-fuel"), "{rendered}");
        assert!(rendered.contains("strength"), "{rendered}");
        assert!(rendered.contains("very gentle reassurance"), "{rendered}");
        assert_eq!(tone.delivery, Delivery::VeryGentle);
    }

    #[test]
    fn stress_does_not_override_base_dimensions() {
        let calm = MotivationTone::compose(
            Gender::Male,
            DietaryPreference::Keto,
            FitnessGoal::Endurance,
            Some(StressLevel::Low),
        );
        let stressed = MotivationTone::compose(
            Gender::Male,
            DietaryPreference::Keto,
            FitnessGoal::Endurance,
            Some(StressLevel::High),
        );
        assert_eq!(calm.voice, stressed.voice);
        assert_eq!(calm.mindset, stressed.mindset);
        assert_eq!(calm.theme, stressed.theme);
        assert_ne!(calm.delivery, stressed.delivery);
    }

    #[test]
    fn stress_ladder() {
        assert_eq!(Delivery::for_stress(None), Delivery::Neutral);
        assert_eq!(Delivery::for_stress(Some(StressLevel::Low)), Delivery::Neutral);
        assert_eq!(Delivery::for_stress(Some(StressLevel::Moderate)), Delivery::Calm);
        assert_eq!(Delivery::for_stress(Some(StressLevel::High)), Delivery::Soft);
        assert_eq!(
            Delivery::for_stress(Some(StressLevel::VeryHigh)),
            Delivery::VeryGentle
        );
    }

    #[test]
    fn each_dimension_contributes_independently() {
        let base = MotivationTone::compose(
            Gender::Other,
            DietaryPreference::Vegetarian,
            FitnessGoal::WeightLoss,
            None,
        );
        let other_diet = MotivationTone::compose(
            Gender::Other,
            DietaryPreference::NonVegetarian,
            FitnessGoal::WeightLoss,
            None,
        );
        assert_eq!(base.voice, "neutral, inspiring");
        assert_eq!(base.mindset, "plant-powered");
        assert_eq!(other_diet.mindset, "protein-fuel");
        assert_eq!(base.theme, other_diet.theme);
    }
}
