use rejuuv_core::plans::{CreateRecoveryPlanRequest, RecoveryPlanData, RecoveryPlanResponse};
use rejuuv_core::prompts::recovery_plan_prompt;
use uuid::Uuid;

use super::Pipeline;
use crate::config::ModelTier;
use crate::error::AppError;
use crate::store::NewRecoveryPlan;

impl Pipeline {
    /// Generate a three-phase plan from an analysis and the intake behind it.
    pub async fn create_recovery_plan(
        &self,
        user_id: Uuid,
        request: CreateRecoveryPlanRequest,
    ) -> Result<RecoveryPlanResponse, AppError> {
        let snapshot = request.validate()?;

        let prompt = recovery_plan_prompt(&snapshot.intake_data, &snapshot.assessment)?;
        let plan: RecoveryPlanData = self
            .run_stage("recovery_plan", ModelTier::Capable, prompt)
            .await?;

        let record = NewRecoveryPlan {
            user_id,
            body_area: snapshot.intake_data.body_area.clone(),
            assessment_data: snapshot,
            plan_data: plan.clone(),
        };
        let id = match self.store.insert_recovery_plan(record).await {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::error!(error = %e, user_id = %user_id, "Failed to save recovery plan");
                None
            }
        };

        Ok(RecoveryPlanResponse { plan, id })
    }
}
