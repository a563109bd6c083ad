//! Generation prompt construction.
//!
//! Pure string assembly: the profile is embedded as pretty JSON, followed by
//! the exact plan shape the model must return and the motivation-quote rules
//! composed for this profile.

use fitplan_store::models::UserProfile;

use crate::plan::tone::MotivationTone;

// ---------------------------------------------------------------------------
// Static sections
// ---------------------------------------------------------------------------

/// JSON shape reference included in every prompt.
const SCHEMA_REFERENCE: &str = r#"RETURN EXACTLY THIS JSON SHAPE:

{
  "day1": {
    "exercise_plan": [
      { "name":"", "sets":0, "reps":"", "rest":"", "muscle_group":"", "notes":"" }
    ],
    "diet_plan": {
      "breakfast": { "item":"", "calories":0, "protein_g":0 },
      "lunch": { "item":"", "calories":0, "protein_g":0 },
      "dinner": { "item":"", "calories":0, "protein_g":0 }
    },
    "exercise_tts_prompt": "",
    "diet_tts_prompt": "",
    "exercise_image_prompt": "",
    "diet_image_prompt": "",
    "motivation_quote": ""
  },
  ...
  "day7": { ... }
}

All seven keys day1 through day7 are required. Every day needs breakfast,
lunch and dinner.
"#;

const QUOTE_RULES: &str = r#"--- RULES FOR MOTIVATION QUOTES ---
- Personalize the quote based on gender:
  male -> strong, disciplined tone
  female -> empowering, confident tone
  other -> neutral inspiring tone
- Personalize based on diet type:
  vegetarian -> plant-powered mindset
  non-vegetarian -> protein-fuel mindset
  vegan -> clean-fuel mindset
  keto / mediterranean / paleo -> reflect food lifestyle
- Personalize based on fitness goal:
  weight-loss -> consistency & discipline
  muscle-gain -> strength & progress
  endurance -> stamina & push limits
  flexibility -> calm & mindful
  rehabilitation -> gentle motivation
- Stress level softens the tone, it never replaces it:
  low -> normal motivational tone
  moderate -> balanced, calm encouragement
  high -> soft supportive tone
  very-high -> very gentle reassurance
"#;

const OUTPUT_RULES: &str = "\
- The quote should be 1-2 enthusiastic lines ONLY.
- NO markdown.
- NO extra text.
- ONLY JSON in final output.
";

// ---------------------------------------------------------------------------
// Prompt construction
// ---------------------------------------------------------------------------

/// Build the full generation prompt for a validated profile.
pub fn build_plan_prompt(profile: &UserProfile) -> String {
    let mut prompt = String::with_capacity(4096);

    prompt.push_str("You are an AI fitness expert and mindset coach.\n\n");
    prompt.push_str("Generate a STRICT JSON weekly fitness plan for this user:\n");
    // UserProfile has no map keys or non-finite floats that could fail here.
    let profile_json =
        serde_json::to_string_pretty(profile).unwrap_or_else(|_| format!("{profile:?}"));
    prompt.push_str(&profile_json);
    prompt.push_str("\n\n");

    prompt.push_str(SCHEMA_REFERENCE);
    prompt.push('\n');
    prompt.push_str(QUOTE_RULES);
    prompt.push('\n');

    let tone = MotivationTone::for_profile(profile);
    prompt.push_str(&format!(
        "For this user, write every motivation_quote in a {tone}.\n\n"
    ));

    prompt.push_str(OUTPUT_RULES);
    prompt
}
