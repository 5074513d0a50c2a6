use rejuuv_core::intake::{BodyArea, default_body_areas};
use rejuuv_core::plans::{PlanDetailResponse, PlansResponse};
use uuid::Uuid;

use super::Pipeline;
use crate::error::AppError;

impl Pipeline {
    /// A plan owned by `user_id` together with its check-in history.
    ///
    /// Plans that do not exist and plans owned by someone else are both
    /// reported as not found.
    pub async fn plan_detail(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
    ) -> Result<PlanDetailResponse, AppError> {
        let plan = self
            .store
            .find_plan(user_id, plan_id)
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource: "Plan".to_string(),
            })?;

        let check_ins = self
            .store
            .list_check_ins(user_id, plan_id)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(
                    error = %e,
                    user_id = %user_id,
                    plan_id = %plan_id,
                    "Failed to load check-ins"
                );
                Vec::new()
            });

        Ok(PlanDetailResponse { plan, check_ins })
    }

    pub async fn list_plans(&self, user_id: Uuid) -> Result<PlansResponse, AppError> {
        let plans = self.store.list_plans(user_id).await?;
        Ok(PlansResponse { plans })
    }

    /// Configured body areas, or the built-in list when none can be loaded.
    pub async fn body_areas(&self) -> Vec<BodyArea> {
        match self.store.list_body_areas().await {
            Ok(areas) if !areas.is_empty() => areas,
            Ok(_) => default_body_areas(),
            Err(e) => {
                tracing::warn!(error = %e, "Falling back to default body areas");
                default_body_areas()
            }
        }
    }

    pub async fn store_healthy(&self) -> bool {
        self.store.ping().await.is_ok()
    }
}
