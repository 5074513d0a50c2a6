use rejuuv_core::check_ins::{CheckInResponse, CheckInResult, CreateCheckInRequest};
use rejuuv_core::prompts::check_in_prompt;
use uuid::Uuid;

use super::Pipeline;
use crate::config::ModelTier;
use crate::error::AppError;
use crate::store::NewCheckIn;

impl Pipeline {
    /// Review a check-in against the plan the user is following.
    pub async fn record_check_in(
        &self,
        user_id: Uuid,
        request: CreateCheckInRequest,
    ) -> Result<CheckInResponse, AppError> {
        let (check_in, current_plan) = request.validate()?;

        let prompt = check_in_prompt(&check_in, &current_plan)?;
        let result: CheckInResult = self
            .run_stage("check_in", ModelTier::Capable, prompt)
            .await?;

        let record = NewCheckIn {
            user_id,
            check_in: check_in.clone(),
            adjustments: result.clone(),
        };
        let id = match self.store.insert_check_in(record).await {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    user_id = %user_id,
                    recovery_plan_id = %check_in.recovery_plan_id,
                    "Failed to save check-in"
                );
                None
            }
        };

        Ok(CheckInResponse {
            result,
            check_in_data: check_in,
            id,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rejuuv_core::check_ins::PainChange;
    use serde_json::json;

    use super::*;
    use crate::testing::{FakeCompletion, FakeStore, check_in_result_json, pipeline, plan_data};

    fn request(plan_id: Uuid, pain_level: u8) -> CreateCheckInRequest {
        CreateCheckInRequest {
            recovery_plan_id: Some(plan_id.to_string()),
            pain_change: Some(PainChange::Better),
            pain_level: Some(pain_level),
            difficulty: Some("Manageable".to_string()),
            completed_activities: Some(vec!["walk".to_string()]),
            notes: None,
            current_plan: Some(plan_data()),
        }
    }

    #[tokio::test]
    async fn check_in_is_saved_against_user_and_plan() {
        let completion = Arc::new(FakeCompletion::replying(&[&check_in_result_json()]));
        let store = Arc::new(FakeStore::default());
        let pipeline = pipeline(completion.clone(), store.clone());
        let user_id = Uuid::now_v7();
        let plan_id = Uuid::now_v7();

        let response = pipeline
            .record_check_in(user_id, request(plan_id, 3))
            .await
            .expect("check-in should succeed");

        assert_eq!(response.result.adjustment_summary, "Progressing well");
        assert_eq!(response.check_in_data.recovery_plan_id, plan_id);
        assert_eq!(response.check_in_data.notes, "");

        let saved = store.check_ins.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].0, user_id);
        assert_eq!(saved[0].1.recovery_plan_id, plan_id);
        assert_eq!(response.id, Some(saved[0].1.id));
        assert_eq!(completion.models(), vec!["capable-model"]);
    }

    #[tokio::test]
    async fn zero_pain_level_is_accepted() {
        let completion = Arc::new(FakeCompletion::replying(&[&check_in_result_json()]));
        let pipeline = pipeline(completion, Arc::new(FakeStore::default()));

        let response = pipeline
            .record_check_in(Uuid::now_v7(), request(Uuid::now_v7(), 0))
            .await
            .expect("pain level 0 is valid");
        assert_eq!(response.check_in_data.pain_level, 0);
    }

    #[tokio::test]
    async fn missing_pain_change_creates_no_record() {
        let completion = Arc::new(FakeCompletion::default());
        let store = Arc::new(FakeStore::default());
        let pipeline = pipeline(completion.clone(), store.clone());
        let mut request = request(Uuid::now_v7(), 4);
        request.pain_change = None;

        let err = pipeline
            .record_check_in(Uuid::now_v7(), request)
            .await
            .expect_err("pain_change is required");

        let AppError::Validation { field, .. } = err else {
            panic!("expected a validation error");
        };
        assert_eq!(field.as_deref(), Some("pain_change"));
        assert_eq!(completion.call_count(), 0);
        assert!(store.check_ins.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_failure_returns_result_with_null_id() {
        let completion = Arc::new(FakeCompletion::replying(&[&check_in_result_json()]));
        let store = Arc::new(FakeStore::default());
        store.fail_writes();
        let pipeline = pipeline(completion, store);

        let response = pipeline
            .record_check_in(Uuid::now_v7(), request(Uuid::now_v7(), 5))
            .await
            .expect("write failure is not fatal");

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["id"], json!(null));
        assert_eq!(value["next_check_in"], json!("In 3 days"));
    }

    #[tokio::test]
    async fn malformed_result_creates_no_record() {
        let completion = Arc::new(FakeCompletion::replying(&["not json"]));
        let store = Arc::new(FakeStore::default());
        let pipeline = pipeline(completion, store.clone());

        let err = pipeline
            .record_check_in(Uuid::now_v7(), request(Uuid::now_v7(), 5))
            .await
            .expect_err("completion is malformed");

        assert!(matches!(err, AppError::Completion(_)));
        assert!(store.check_ins.lock().unwrap().is_empty());
    }
}
