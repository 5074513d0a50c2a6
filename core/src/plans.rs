use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::check_ins::CheckIn;
use crate::intake::{AnalysisResult, IntakeData, IntakeError};

/// Phase assigned to a freshly generated plan.
pub const INITIAL_PHASE: i32 = 1;

/// Status assigned to a freshly generated plan.
pub const STATUS_ACTIVE: &str = "active";

/// One time window of a recovery plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecoveryPhase {
    pub goal: String,
    #[serde(default)]
    pub activities: Vec<String>,
    #[serde(default)]
    pub avoid: Vec<String>,
}

/// The three fixed phases: days 1–7, days 8–21, week 4 onwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PhasedPlan {
    pub phase_1_days_1_to_7: RecoveryPhase,
    pub phase_2_days_8_to_21: RecoveryPhase,
    pub phase_3_week_4_and_beyond: RecoveryPhase,
}

/// Generated recovery plan content, stored as `recovery_plans.plan_data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecoveryPlanData {
    #[serde(default)]
    pub focus_areas: Vec<String>,
    pub recovery_plan: PhasedPlan,
    #[serde(default)]
    pub daily_habits: Vec<String>,
    #[serde(default)]
    pub red_flags: Vec<String>,
}

/// Request body for `POST /recovery-plans`.
///
/// Both fields are optional at the serde level so that a missing field is
/// reported by name instead of as a generic deserialization failure.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRecoveryPlanRequest {
    /// Analysis returned by `POST /assessments` (also accepted as `analysis`)
    #[serde(default, alias = "analysis")]
    pub assessment: Option<AnalysisResult>,
    /// Intake the analysis was computed from (also accepted as `intakeData`)
    #[serde(default, alias = "intakeData")]
    pub intake_data: Option<IntakeData>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PlanRequestError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error(transparent)]
    Intake(#[from] IntakeError),
}

impl PlanRequestError {
    pub fn field(&self) -> String {
        match self {
            PlanRequestError::MissingFields(fields) => fields.join(", "),
            PlanRequestError::Intake(err) => err.field().to_string(),
        }
    }
}

impl CreateRecoveryPlanRequest {
    /// Both inputs must be present and the intake must be well formed.
    pub fn validate(self) -> Result<AssessmentSnapshot, PlanRequestError> {
        let (assessment, intake_data) = match (self.assessment, self.intake_data) {
            (Some(assessment), Some(intake_data)) => (assessment, intake_data),
            (assessment, intake_data) => {
                let mut missing = Vec::new();
                if assessment.is_none() {
                    missing.push("assessment");
                }
                if intake_data.is_none() {
                    missing.push("intake_data");
                }
                return Err(PlanRequestError::MissingFields(missing));
            }
        };
        intake_data.validate()?;
        Ok(AssessmentSnapshot {
            intake_data,
            assessment,
        })
    }
}

/// Inputs a plan was generated from, stored as `recovery_plans.assessment_data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AssessmentSnapshot {
    pub intake_data: IntakeData,
    pub assessment: AnalysisResult,
}

/// Response of `POST /recovery-plans`.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RecoveryPlanResponse {
    #[serde(flatten)]
    pub plan: RecoveryPlanData,
    /// Stored plan id, `null` when the plan could not be saved
    pub id: Option<Uuid>,
}

/// A stored recovery plan as returned to its owner.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RecoveryPlan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub body_area: String,
    pub phase: i32,
    pub status: String,
    pub plan_data: RecoveryPlanData,
    pub created_at: DateTime<Utc>,
}

/// Response of `GET /plans`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlansResponse {
    /// Plans owned by the caller, newest first
    pub plans: Vec<RecoveryPlan>,
}

/// Response of `GET /plans/{id}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlanDetailResponse {
    pub plan: RecoveryPlan,
    /// Check-ins for the plan, newest first
    #[serde(rename = "checkIns")]
    pub check_ins: Vec<CheckIn>,
}
