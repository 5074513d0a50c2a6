use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Highest value on the 0–10 pain scale.
pub const MAX_PAIN_LEVEL: u8 = 10;

/// Pain level at or above which an intake is always treated as a red flag.
pub const RED_FLAG_PAIN_LEVEL: u8 = 8;

pub const DEFAULT_RED_FLAG_MESSAGE: &str = "We detected some concerning symptoms.";
pub const DEFAULT_RED_FLAG_ACTION: &str = "Please seek immediate medical attention.";

/// Symptoms reported by the user in the intake flow.
///
/// Submitted once and embedded verbatim into the assessment and recovery plan
/// records that are derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct IntakeData {
    /// Body area id (e.g. "knee", "lower_back")
    pub body_area: String,
    #[serde(default)]
    pub specific_location: String,
    #[serde(default)]
    pub pain_type: Vec<String>,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub trigger: Vec<String>,
    /// Pain on a 0–10 scale
    pub pain_level: u8,
    #[serde(default)]
    pub movement_limitations: Vec<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IntakeError {
    #[error("body_area must not be empty")]
    MissingBodyArea,
    #[error("pain_level must be between 0 and 10, got {0}")]
    PainLevelOutOfRange(u8),
}

impl IntakeError {
    pub fn field(&self) -> &'static str {
        match self {
            IntakeError::MissingBodyArea => "body_area",
            IntakeError::PainLevelOutOfRange(_) => "pain_level",
        }
    }
}

impl IntakeData {
    pub fn validate(&self) -> Result<(), IntakeError> {
        if self.body_area.trim().is_empty() {
            return Err(IntakeError::MissingBodyArea);
        }
        if self.pain_level > MAX_PAIN_LEVEL {
            return Err(IntakeError::PainLevelOutOfRange(self.pain_level));
        }
        Ok(())
    }
}

/// Outcome of the safety screening stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SafetyResult {
    pub red_flag_detected: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub recommended_action: String,
}

impl SafetyResult {
    /// Apply the deterministic red-flag floor on top of the screening result.
    ///
    /// A pain level at or above [`RED_FLAG_PAIN_LEVEL`] is a red flag no matter
    /// what the screening said, and a flagged result always carries a message
    /// and a recommended action the client can show.
    pub fn with_floor(mut self, intake: &IntakeData) -> Self {
        if !self.red_flag_detected && intake.pain_level >= RED_FLAG_PAIN_LEVEL {
            self.red_flag_detected = true;
            self.message = format!(
                "A pain level of {}/10 is high enough that it should be checked by a medical professional.",
                intake.pain_level
            );
        }
        if self.red_flag_detected {
            if self.message.trim().is_empty() {
                self.message = DEFAULT_RED_FLAG_MESSAGE.to_string();
            }
            if self.recommended_action.trim().is_empty() {
                self.recommended_action = DEFAULT_RED_FLAG_ACTION.to_string();
            }
        }
        self
    }
}

/// Educational movement analysis, produced only for intakes without red flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnalysisResult {
    pub summary: String,
    #[serde(default)]
    pub possible_contributors: Vec<String>,
    pub education: String,
    pub safety_note: String,
}

/// Safety result returned in place of an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BlockedAssessment {
    #[serde(flatten)]
    pub safety: SafetyResult,
    /// Always `true`
    pub blocked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnalyzedAssessment {
    #[serde(flatten)]
    pub analysis: AnalysisResult,
    /// Always `false`
    pub blocked: bool,
}

/// Response of `POST /assessments`, also stored as the assessment's `analysis_result`.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum AssessmentResponse {
    Blocked(BlockedAssessment),
    Analyzed(AnalyzedAssessment),
}

impl AssessmentResponse {
    pub fn blocked(safety: SafetyResult) -> Self {
        AssessmentResponse::Blocked(BlockedAssessment {
            safety,
            blocked: true,
        })
    }

    pub fn analyzed(analysis: AnalysisResult) -> Self {
        AssessmentResponse::Analyzed(AnalyzedAssessment {
            analysis,
            blocked: false,
        })
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, AssessmentResponse::Blocked(_))
    }
}

/// Selectable body area shown on the first intake screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BodyArea {
    pub id: String,
    pub label: String,
}

/// Body areas served when the configuration table is empty or unreachable.
pub fn default_body_areas() -> Vec<BodyArea> {
    [
        ("neck", "Neck"),
        ("lower_back", "Lower Back"),
        ("knee", "Knee"),
        ("shoulder", "Shoulder"),
    ]
    .into_iter()
    .map(|(id, label)| BodyArea {
        id: id.to_string(),
        label: label.to_string(),
    })
    .collect()
}
