//! In-memory stand-ins for the completion service, the store, and the
//! identity provider, plus fixtures shared by pipeline and route tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use chrono::Utc;
use rejuuv_core::check_ins::CheckIn;
use rejuuv_core::completion::{CompletionError, CompletionResponse};
use rejuuv_core::intake::{BodyArea, IntakeData};
use rejuuv_core::plans::{INITIAL_PHASE, RecoveryPlan, RecoveryPlanData, STATUS_ACTIVE};
use rejuuv_core::prompts::Prompt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use crate::auth::{IdentityProvider, InjectAuthLayer};
use crate::config::ModelTiers;
use crate::llm::CompletionClient;
use crate::pipeline::Pipeline;
use crate::state::AppState;
use crate::store::{NewAssessment, NewCheckIn, NewRecoveryPlan, RecoveryStore, StoreError};

/// Completion client that replays scripted responses in order and records
/// which model each call went to.
#[derive(Default)]
pub struct FakeCompletion {
    responses: Mutex<VecDeque<Result<CompletionResponse, CompletionError>>>,
    calls: Mutex<Vec<(String, Prompt)>>,
}

impl FakeCompletion {
    pub fn replying<S: AsRef<str>>(texts: &[S]) -> Self {
        let fake = Self::default();
        for text in texts {
            fake.push(Ok(CompletionResponse::from_text(text.as_ref())));
        }
        fake
    }

    pub fn push(&self, response: Result<CompletionResponse, CompletionError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn models(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(model, _)| model.clone())
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionClient for FakeCompletion {
    async fn complete(
        &self,
        model: &str,
        prompt: &Prompt,
    ) -> Result<CompletionResponse, CompletionError> {
        self.calls
            .lock()
            .unwrap()
            .push((model.to_string(), prompt.clone()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(CompletionError::EmptyCompletion))
    }
}

/// Store kept in memory. Writes and reads can be made to fail independently.
#[derive(Default)]
pub struct FakeStore {
    pub assessments: Mutex<Vec<NewAssessment>>,
    pub plans: Mutex<Vec<RecoveryPlan>>,
    pub check_ins: Mutex<Vec<(Uuid, CheckIn)>>,
    pub body_areas: Mutex<Vec<BodyArea>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    fail_check_in_reads: AtomicBool,
}

impl FakeStore {
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    pub fn fail_check_in_reads(&self) {
        self.fail_check_in_reads.store(true, Ordering::SeqCst);
    }

    fn write_guard(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }

    fn read_guard(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("reads disabled".to_string()));
        }
        Ok(())
    }

    /// Insert a plan directly, bypassing the pipeline.
    pub fn seed_plan(&self, user_id: Uuid, body_area: &str) -> Uuid {
        let id = Uuid::now_v7();
        self.plans.lock().unwrap().push(RecoveryPlan {
            id,
            user_id,
            body_area: body_area.to_string(),
            phase: INITIAL_PHASE,
            status: STATUS_ACTIVE.to_string(),
            plan_data: plan_data(),
            created_at: Utc::now(),
        });
        id
    }
}

#[async_trait]
impl RecoveryStore for FakeStore {
    async fn insert_assessment(&self, assessment: NewAssessment) -> Result<Uuid, StoreError> {
        self.write_guard()?;
        self.assessments.lock().unwrap().push(assessment);
        Ok(Uuid::now_v7())
    }

    async fn insert_recovery_plan(&self, plan: NewRecoveryPlan) -> Result<Uuid, StoreError> {
        self.write_guard()?;
        let id = Uuid::now_v7();
        self.plans.lock().unwrap().push(RecoveryPlan {
            id,
            user_id: plan.user_id,
            body_area: plan.body_area,
            phase: INITIAL_PHASE,
            status: STATUS_ACTIVE.to_string(),
            plan_data: plan.plan_data,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn insert_check_in(&self, check_in: NewCheckIn) -> Result<Uuid, StoreError> {
        self.write_guard()?;
        let id = Uuid::now_v7();
        let data = check_in.check_in;
        self.check_ins.lock().unwrap().push((
            check_in.user_id,
            CheckIn {
                id,
                recovery_plan_id: data.recovery_plan_id,
                pain_level: data.pain_level,
                pain_change: data.pain_change,
                exercise_difficulty: data.difficulty,
                completed_activities: data.completed_activities,
                notes: data.notes,
                adjustments: check_in.adjustments,
                created_at: Utc::now(),
            },
        ));
        Ok(id)
    }

    async fn find_plan(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
    ) -> Result<Option<RecoveryPlan>, StoreError> {
        self.read_guard()?;
        Ok(self
            .plans
            .lock()
            .unwrap()
            .iter()
            .find(|plan| plan.id == plan_id && plan.user_id == user_id)
            .cloned())
    }

    async fn list_plans(&self, user_id: Uuid) -> Result<Vec<RecoveryPlan>, StoreError> {
        self.read_guard()?;
        let mut plans: Vec<RecoveryPlan> = self
            .plans
            .lock()
            .unwrap()
            .iter()
            .filter(|plan| plan.user_id == user_id)
            .cloned()
            .collect();
        plans.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(plans)
    }

    async fn list_check_ins(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
    ) -> Result<Vec<CheckIn>, StoreError> {
        self.read_guard()?;
        if self.fail_check_in_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("check-in reads disabled".to_string()));
        }
        let mut check_ins: Vec<CheckIn> = self
            .check_ins
            .lock()
            .unwrap()
            .iter()
            .filter(|(owner, c)| *owner == user_id && c.recovery_plan_id == plan_id)
            .map(|(_, c)| c.clone())
            .collect();
        check_ins.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(check_ins)
    }

    async fn list_body_areas(&self) -> Result<Vec<BodyArea>, StoreError> {
        self.read_guard()?;
        Ok(self.body_areas.lock().unwrap().clone())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.read_guard()
    }
}

/// Identity provider backed by a fixed token table.
#[derive(Default)]
pub struct FakeIdentity {
    tokens: HashMap<String, Uuid>,
    lookups: AtomicUsize,
}

impl FakeIdentity {
    pub fn with_user(token: &str, user_id: Uuid) -> Self {
        let mut tokens = HashMap::new();
        tokens.insert(token.to_string(), user_id);
        Self {
            tokens,
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn add_user(mut self, token: &str, user_id: Uuid) -> Self {
        self.tokens.insert(token.to_string(), user_id);
        self
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn resolve(&self, token: &str) -> Option<Uuid> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.tokens.get(token).copied()
    }
}

pub fn tiers() -> ModelTiers {
    ModelTiers {
        fast: "fast-model".to_string(),
        capable: "capable-model".to_string(),
    }
}

pub fn pipeline(completion: Arc<FakeCompletion>, store: Arc<FakeStore>) -> Pipeline {
    Pipeline::new(completion, store, tiers())
}

/// Full router, without rate limiting, wired to the given fakes.
pub fn app(
    completion: Arc<FakeCompletion>,
    store: Arc<FakeStore>,
    identity: FakeIdentity,
) -> Router {
    app_with_identity(completion, store, Arc::new(identity))
}

/// Like [`app`], keeping a handle on the identity provider.
pub fn app_with_identity(
    completion: Arc<FakeCompletion>,
    store: Arc<FakeStore>,
    identity: Arc<FakeIdentity>,
) -> Router {
    let identity: Arc<dyn IdentityProvider> = identity;
    let state = AppState {
        pipeline: Arc::new(pipeline(completion, store)),
        identity: identity.clone(),
    };
    crate::routes::completion_router()
        .merge(crate::routes::read_router())
        .merge(crate::routes::health::router())
        .layer(InjectAuthLayer::new(identity))
        .with_state(state)
}

/// Send one request through `app` and decode the JSON response body.
pub async fn send(
    app: Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}

pub fn intake(body_area: &str, pain_level: u8) -> IntakeData {
    IntakeData {
        body_area: body_area.to_string(),
        specific_location: "outer side".to_string(),
        pain_type: vec!["Dull ache".to_string()],
        duration: "1-2 weeks".to_string(),
        trigger: vec!["Running".to_string()],
        pain_level,
        movement_limitations: vec!["Squatting".to_string()],
    }
}

pub fn plan_json() -> Value {
    let phase = |goal: &str| json!({ "goal": goal, "activities": ["walk"], "avoid": ["jumping"] });
    json!({
        "focus_areas": ["mobility"],
        "recovery_plan": {
            "phase_1_days_1_to_7": phase("calm things down"),
            "phase_2_days_8_to_21": phase("restore range"),
            "phase_3_week_4_and_beyond": phase("build strength"),
        },
        "daily_habits": ["short walks"],
        "red_flags": ["numbness"]
    })
}

pub fn plan_data() -> RecoveryPlanData {
    serde_json::from_value(plan_json()).unwrap()
}

pub fn safe_screening() -> String {
    json!({ "red_flag_detected": false, "message": "", "recommended_action": "" }).to_string()
}

pub fn flagged_screening() -> String {
    json!({
        "red_flag_detected": true,
        "message": "Numbness down the leg",
        "recommended_action": "See a doctor today"
    })
    .to_string()
}

pub fn analysis_json() -> String {
    json!({
        "summary": "Knee pain commonly associated with load changes",
        "possible_contributors": ["Sudden increase in running"],
        "education": "Tissues adapt to gradual load",
        "safety_note": "See a professional if swelling appears"
    })
    .to_string()
}

pub fn check_in_result_json() -> String {
    json!({
        "adjustment_summary": "Progressing well",
        "updated_recommendations": ["Add one more set"],
        "next_check_in": "In 3 days",
        "safety_reminder": ""
    })
    .to_string()
}
