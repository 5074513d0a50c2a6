//! Stage orchestration for the intake flow.
//!
//! Each operation runs its completion stages strictly in order, writes at most
//! one record, and returns one response. Writes never abort a computed
//! response: a failed write is logged and the response carries no id.

mod assessment;
mod check_in;
mod plans;
mod recovery_plan;

use std::sync::Arc;

use rejuuv_core::completion::{CompletionError, parse_completion};
use rejuuv_core::prompts::Prompt;
use serde::de::DeserializeOwned;

use crate::config::{ModelTier, ModelTiers};
use crate::llm::CompletionClient;
use crate::store::RecoveryStore;

pub struct Pipeline {
    completion: Arc<dyn CompletionClient>,
    store: Arc<dyn RecoveryStore>,
    tiers: ModelTiers,
}

impl Pipeline {
    pub fn new(
        completion: Arc<dyn CompletionClient>,
        store: Arc<dyn RecoveryStore>,
        tiers: ModelTiers,
    ) -> Self {
        Self {
            completion,
            store,
            tiers,
        }
    }

    /// Run one completion stage and decode its JSON payload as `T`.
    async fn run_stage<T: DeserializeOwned>(
        &self,
        stage: &'static str,
        tier: ModelTier,
        prompt: Prompt,
    ) -> Result<T, CompletionError> {
        let model = self.tiers.model(tier);
        tracing::debug!(stage, tier = tier.as_str(), model, "Running completion stage");

        let response = self.completion.complete(model, &prompt).await?;
        parse_completion(&response).inspect_err(|e| {
            tracing::warn!(stage, model, error = %e, "Completion could not be parsed");
        })
    }
}
