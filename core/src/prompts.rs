//! Instruction pairs for each pipeline stage.
//!
//! Every builder is a pure function of its payload: the payload is embedded as
//! pretty-printed JSON and the expected output fields are spelled out so the
//! completion can be parsed into the stage's typed result.

use serde::Serialize;

use crate::check_ins::CheckInData;
use crate::intake::{AnalysisResult, IntakeData};
use crate::plans::RecoveryPlanData;

/// System instruction plus user message for one completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

const JSON_ONLY: &str = "Output ONLY valid JSON, with no markdown code fences and no additional text.";

const NON_DIAGNOSTIC_RULES: &str = "\
IMPORTANT GUIDELINES:
- NEVER diagnose conditions or use phrases like \"you have\" or \"this injury is\"
- Use phrases like \"commonly associated with\", \"often influenced by\", \"may be related to\"
- Keep guidance conservative, educational, and movement-focused
- Always remind the user when to consult a healthcare professional";

fn pretty<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

/// Safety screening prompt, run on the fast model tier.
pub fn safety_prompt(intake: &IntakeData) -> Result<Prompt, serde_json::Error> {
    let system = format!(
        "You are a safety screening assistant. Review user-reported symptoms and decide \
whether they contain red flags that require medical care instead of app guidance.

RED FLAGS TO DETECT:
- Pain level 8 or above (on a scale of 0-10)
- Neurological symptoms such as numbness, tingling, or weakness
- Sudden onset with severe pain
- Loss of bladder or bowel control
- Symptoms that started after trauma or injury

If any red flag is present, say so clearly and recommend immediate medical attention.

{JSON_ONLY}"
    );

    let user = format!(
        "Analyze the following intake data for safety red flags.

Intake Data:
{}

Return a JSON object with exactly these fields:
- red_flag_detected (boolean): true if any red flag is present, false otherwise
- message (string): what was detected, or an empty string if nothing was
- recommended_action (string): e.g. \"Seek immediate medical attention\", or an empty string if nothing was detected

{JSON_ONLY}",
        pretty(intake)?
    );

    Ok(Prompt { system, user })
}

/// Movement analysis prompt, run only when screening found no red flags.
pub fn analysis_prompt(intake: &IntakeData) -> Result<Prompt, serde_json::Error> {
    let system = format!(
        "You are a movement recovery guidance assistant. You are NOT a medical professional \
and cannot diagnose or treat. Explain common movement-related contributors to pain and give \
conservative educational recovery guidance.

{NON_DIAGNOSTIC_RULES}

{JSON_ONLY}"
    );

    let user = format!(
        "Analyze the following intake data.

Intake Data:
{}

Return a JSON object with exactly these fields:
- summary (string): a brief overview of the intake
- possible_contributors (array of strings): common movement-related factors that may be associated with it
- education (string): educational information about movement recovery, without diagnostic language
- safety_note (string): a reminder to consult a healthcare professional

{JSON_ONLY}",
        pretty(intake)?
    );

    Ok(Prompt { system, user })
}

/// Three-phase recovery plan prompt.
pub fn recovery_plan_prompt(
    intake: &IntakeData,
    analysis: &AnalysisResult,
) -> Result<Prompt, serde_json::Error> {
    let system = format!(
        "You are a movement recovery guidance assistant. You are NOT a medical professional \
and cannot diagnose or treat. Create a phased, movement-focused recovery plan from the intake \
data and analysis provided, including when to seek medical care.

{NON_DIAGNOSTIC_RULES}

{JSON_ONLY}"
    );

    let user = format!(
        "Create a phased recovery plan from the following intake data and analysis.

Intake Data:
{}

Analysis:
{}

Return a JSON object with exactly these fields:
- focus_areas (array of strings): key areas to focus on during recovery
- recovery_plan (object) with three phases, each an object with goal (string), \
activities (array of strings), and avoid (array of strings):
  - phase_1_days_1_to_7
  - phase_2_days_8_to_21
  - phase_3_week_4_and_beyond
- daily_habits (array of strings): daily habits that may support recovery
- red_flags (array of strings): warning signs that mean the user should seek medical care

{JSON_ONLY}",
        pretty(intake)?,
        pretty(analysis)?
    );

    Ok(Prompt { system, user })
}

/// Check-in review prompt that adjusts the current plan.
pub fn check_in_prompt(
    check_in: &CheckInData,
    current_plan: &RecoveryPlanData,
) -> Result<Prompt, serde_json::Error> {
    let system = format!(
        "You are a recovery progress advisor. Review the user's check-in against their current \
recovery plan and adjust the recommendations. Be encouraging but honest about progress.

IMPORTANT GUIDELINES:
- Do NOT diagnose anything or give medical advice
- Use safe language such as \"may suggest\", \"consider\", \"might benefit from\"
- Include a safety reminder whenever the check-in warrants one

{JSON_ONLY}"
    );

    let user = format!(
        "Review the following check-in and current recovery plan, then provide adjusted recommendations.

Check-In Data:
{}

Current Recovery Plan:
{}

Return a JSON object with exactly these fields:
- adjustment_summary (string): how the user is progressing relative to the plan
- updated_recommendations (array of strings): adjusted advice, using language like \"may suggest\" and \"consider\"
- next_check_in (string): when the user should check in again
- safety_reminder (string): any safety note, or an empty string if none is needed

{JSON_ONLY}",
        pretty(check_in)?,
        pretty(current_plan)?
    );

    Ok(Prompt { system, user })
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::check_ins::PainChange;
    use crate::plans::{PhasedPlan, RecoveryPhase};

    fn intake() -> IntakeData {
        IntakeData {
            body_area: "lower_back".to_string(),
            specific_location: "left side".to_string(),
            pain_type: vec!["Sharp".to_string()],
            duration: "3 days".to_string(),
            trigger: vec!["Lifting".to_string()],
            pain_level: 5,
            movement_limitations: vec![],
        }
    }

    fn phase() -> RecoveryPhase {
        RecoveryPhase {
            goal: "reduce irritation".to_string(),
            activities: vec!["cat-cow".to_string()],
            avoid: vec!["heavy lifting".to_string()],
        }
    }

    #[test]
    fn safety_prompt_embeds_intake_and_red_flag_rules() {
        let prompt = safety_prompt(&intake()).unwrap();
        assert!(prompt.system.contains("Pain level 8 or above"));
        assert!(prompt.user.contains("\"body_area\": \"lower_back\""));
        assert!(prompt.user.contains("red_flag_detected"));
    }

    #[test]
    fn analysis_prompt_lists_expected_fields() {
        let prompt = analysis_prompt(&intake()).unwrap();
        for field in ["summary", "possible_contributors", "education", "safety_note"] {
            assert!(prompt.user.contains(field), "missing {field}");
        }
        assert!(prompt.system.contains("NOT a medical professional"));
    }

    #[test]
    fn recovery_plan_prompt_embeds_both_payloads() {
        let analysis = AnalysisResult {
            summary: "Lifting strain".to_string(),
            possible_contributors: vec![],
            education: "e".to_string(),
            safety_note: "n".to_string(),
        };
        let prompt = recovery_plan_prompt(&intake(), &analysis).unwrap();
        assert!(prompt.user.contains("Lifting strain"));
        assert!(prompt.user.contains("phase_3_week_4_and_beyond"));
    }

    #[test]
    fn check_in_prompt_embeds_check_in_and_plan() {
        let check_in = CheckInData {
            recovery_plan_id: Uuid::nil(),
            pain_change: PainChange::Worse,
            pain_level: 6,
            difficulty: "Too Hard".to_string(),
            completed_activities: vec!["cat-cow".to_string()],
            notes: "stiff mornings".to_string(),
        };
        let plan = RecoveryPlanData {
            focus_areas: vec![],
            recovery_plan: PhasedPlan {
                phase_1_days_1_to_7: phase(),
                phase_2_days_8_to_21: phase(),
                phase_3_week_4_and_beyond: phase(),
            },
            daily_habits: vec![],
            red_flags: vec![],
        };
        let prompt = check_in_prompt(&check_in, &plan).unwrap();
        assert!(prompt.user.contains("\"pain_change\": \"Worse\""));
        assert!(prompt.user.contains("stiff mornings"));
        assert!(prompt.user.contains("reduce irritation"));
    }
}
