use rejuuv_core::intake::{AnalysisResult, AssessmentResponse, IntakeData, SafetyResult};
use rejuuv_core::prompts::{analysis_prompt, safety_prompt};
use uuid::Uuid;

use super::Pipeline;
use crate::config::ModelTier;
use crate::error::AppError;
use crate::store::NewAssessment;

impl Pipeline {
    /// Screen an intake for red flags and, when none are found, analyze it.
    ///
    /// Analysis never runs for a flagged intake. Exactly one assessment record
    /// is written per successful call.
    pub async fn assess(
        &self,
        user_id: Uuid,
        intake: IntakeData,
    ) -> Result<AssessmentResponse, AppError> {
        intake.validate()?;

        let screening: SafetyResult = self
            .run_stage("safety", ModelTier::Fast, safety_prompt(&intake)?)
            .await?;
        let safety = screening.with_floor(&intake);

        let response = if safety.red_flag_detected {
            tracing::info!(
                user_id = %user_id,
                body_area = %intake.body_area,
                pain_level = intake.pain_level,
                "Intake blocked by safety screening"
            );
            AssessmentResponse::blocked(safety)
        } else {
            let analysis: AnalysisResult = self
                .run_stage("analysis", ModelTier::Capable, analysis_prompt(&intake)?)
                .await?;
            AssessmentResponse::analyzed(analysis)
        };

        let record = NewAssessment {
            user_id,
            intake_data: intake,
            analysis_result: response.clone(),
        };
        if let Err(e) = self.store.insert_assessment(record).await {
            tracing::error!(error = %e, user_id = %user_id, "Failed to save assessment");
        }

        Ok(response)
    }
}
