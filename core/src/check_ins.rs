use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::intake::MAX_PAIN_LEVEL;
use crate::plans::RecoveryPlanData;

/// How pain changed since the previous check-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum PainChange {
    #[serde(alias = "better")]
    Better,
    #[serde(alias = "same")]
    Same,
    #[serde(alias = "worse")]
    Worse,
}

impl PainChange {
    pub fn as_str(&self) -> &'static str {
        match self {
            PainChange::Better => "Better",
            PainChange::Same => "Same",
            PainChange::Worse => "Worse",
        }
    }
}

impl fmt::Display for PainChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PainChange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "better" => Ok(PainChange::Better),
            "same" => Ok(PainChange::Same),
            "worse" => Ok(PainChange::Worse),
            other => Err(format!("unknown pain_change '{other}'")),
        }
    }
}

/// Request body for `POST /check-ins`.
///
/// Every field is optional here; [`CreateCheckInRequest::validate`] decides
/// what is missing so the error can name all of them at once.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateCheckInRequest {
    pub recovery_plan_id: Option<String>,
    pub pain_change: Option<PainChange>,
    pub pain_level: Option<u8>,
    pub difficulty: Option<String>,
    pub completed_activities: Option<Vec<String>>,
    pub notes: Option<String>,
    /// Plan snapshot the client is currently following
    pub current_plan: Option<RecoveryPlanData>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CheckInError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("recovery_plan_id must be a UUID, got '{0}'")]
    InvalidPlanId(String),
    #[error("pain_level must be between 0 and 10, got {0}")]
    PainLevelOutOfRange(u8),
}

impl CheckInError {
    pub fn field(&self) -> String {
        match self {
            CheckInError::MissingFields(fields) => fields.join(", "),
            CheckInError::InvalidPlanId(_) => "recovery_plan_id".to_string(),
            CheckInError::PainLevelOutOfRange(_) => "pain_level".to_string(),
        }
    }
}

/// Validated check-in input, echoed back to the client as `check_in_data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CheckInData {
    pub recovery_plan_id: Uuid,
    pub pain_change: PainChange,
    pub pain_level: u8,
    pub difficulty: String,
    pub completed_activities: Vec<String>,
    pub notes: String,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl CreateCheckInRequest {
    /// Check that every required field is present and well formed.
    ///
    /// Presence is explicit: `pain_level: 0` is a valid answer, while an
    /// absent, `null`, or blank field is missing.
    pub fn validate(self) -> Result<(CheckInData, RecoveryPlanData), CheckInError> {
        let mut missing = Vec::new();
        if present(&self.recovery_plan_id).is_none() {
            missing.push("recovery_plan_id");
        }
        if self.pain_change.is_none() {
            missing.push("pain_change");
        }
        if self.pain_level.is_none() {
            missing.push("pain_level");
        }
        if present(&self.difficulty).is_none() {
            missing.push("difficulty");
        }
        if self.current_plan.is_none() {
            missing.push("current_plan");
        }

        let (Some(plan_id), Some(pain_change), Some(pain_level), Some(difficulty), Some(plan)) = (
            present(&self.recovery_plan_id),
            self.pain_change,
            self.pain_level,
            present(&self.difficulty),
            self.current_plan,
        ) else {
            return Err(CheckInError::MissingFields(missing));
        };

        let recovery_plan_id = Uuid::parse_str(plan_id)
            .map_err(|_| CheckInError::InvalidPlanId(plan_id.to_string()))?;
        if pain_level > MAX_PAIN_LEVEL {
            return Err(CheckInError::PainLevelOutOfRange(pain_level));
        }

        let data = CheckInData {
            recovery_plan_id,
            pain_change,
            pain_level,
            difficulty: difficulty.to_string(),
            completed_activities: self.completed_activities.unwrap_or_default(),
            notes: self.notes.unwrap_or_default(),
        };
        Ok((data, plan))
    }
}

/// Adjusted guidance produced for a check-in, stored as `check_ins.adjustments`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CheckInResult {
    pub adjustment_summary: String,
    #[serde(default)]
    pub updated_recommendations: Vec<String>,
    pub next_check_in: String,
    /// Empty when no reminder is needed
    #[serde(default)]
    pub safety_reminder: String,
}

/// Response of `POST /check-ins`.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CheckInResponse {
    #[serde(flatten)]
    pub result: CheckInResult,
    pub check_in_data: CheckInData,
    /// Stored check-in id, `null` when the check-in could not be saved
    pub id: Option<Uuid>,
}

/// A stored check-in as listed in a plan's history.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CheckIn {
    pub id: Uuid,
    pub recovery_plan_id: Uuid,
    pub pain_level: u8,
    pub pain_change: PainChange,
    pub exercise_difficulty: String,
    pub completed_activities: Vec<String>,
    pub notes: String,
    pub adjustments: CheckInResult,
    pub created_at: DateTime<Utc>,
}
