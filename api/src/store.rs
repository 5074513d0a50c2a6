//! Persistence gateway for assessments, recovery plans, check-ins, and body
//! area configuration.
//!
//! Every read that returns user data is filtered by the owning `user_id`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rejuuv_core::check_ins::{CheckIn, CheckInData, CheckInResult, PainChange};
use rejuuv_core::intake::{AssessmentResponse, BodyArea, IntakeData};
use rejuuv_core::plans::{AssessmentSnapshot, RecoveryPlan, RecoveryPlanData};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("stored record is malformed: {0}")]
    Decode(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone)]
pub struct NewAssessment {
    pub user_id: Uuid,
    pub intake_data: IntakeData,
    pub analysis_result: AssessmentResponse,
}

#[derive(Debug, Clone)]
pub struct NewRecoveryPlan {
    pub user_id: Uuid,
    pub body_area: String,
    pub assessment_data: AssessmentSnapshot,
    pub plan_data: RecoveryPlanData,
}

#[derive(Debug, Clone)]
pub struct NewCheckIn {
    pub user_id: Uuid,
    pub check_in: CheckInData,
    pub adjustments: CheckInResult,
}

#[async_trait]
pub trait RecoveryStore: Send + Sync {
    async fn insert_assessment(&self, assessment: NewAssessment) -> Result<Uuid, StoreError>;

    /// Stores a plan with phase 1 and status "active".
    async fn insert_recovery_plan(&self, plan: NewRecoveryPlan) -> Result<Uuid, StoreError>;

    async fn insert_check_in(&self, check_in: NewCheckIn) -> Result<Uuid, StoreError>;

    /// Plan `plan_id` if it exists and belongs to `user_id`.
    async fn find_plan(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
    ) -> Result<Option<RecoveryPlan>, StoreError>;

    /// Plans owned by `user_id`, newest first.
    async fn list_plans(&self, user_id: Uuid) -> Result<Vec<RecoveryPlan>, StoreError>;

    /// Check-ins `user_id` recorded against `plan_id`, newest first.
    async fn list_check_ins(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
    ) -> Result<Vec<CheckIn>, StoreError>;

    /// Active body areas in display order.
    async fn list_body_areas(&self) -> Result<Vec<BodyArea>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PlanRow {
    id: Uuid,
    user_id: Uuid,
    body_area: String,
    phase: i32,
    status: String,
    plan_data: Json<RecoveryPlanData>,
    created_at: DateTime<Utc>,
}

impl From<PlanRow> for RecoveryPlan {
    fn from(row: PlanRow) -> Self {
        RecoveryPlan {
            id: row.id,
            user_id: row.user_id,
            body_area: row.body_area,
            phase: row.phase,
            status: row.status,
            plan_data: row.plan_data.0,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CheckInRow {
    id: Uuid,
    recovery_plan_id: Uuid,
    pain_level: i16,
    pain_change: String,
    exercise_difficulty: String,
    completed_activities: Json<Vec<String>>,
    notes: String,
    adjustments: Json<CheckInResult>,
    created_at: DateTime<Utc>,
}

impl TryFrom<CheckInRow> for CheckIn {
    type Error = StoreError;

    fn try_from(row: CheckInRow) -> Result<Self, Self::Error> {
        let pain_level = u8::try_from(row.pain_level)
            .map_err(|_| StoreError::Decode(format!("pain_level {} out of range", row.pain_level)))?;
        let pain_change = row
            .pain_change
            .parse::<PainChange>()
            .map_err(StoreError::Decode)?;
        Ok(CheckIn {
            id: row.id,
            recovery_plan_id: row.recovery_plan_id,
            pain_level,
            pain_change,
            exercise_difficulty: row.exercise_difficulty,
            completed_activities: row.completed_activities.0,
            notes: row.notes,
            adjustments: row.adjustments.0,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BodyAreaRow {
    body_area: String,
    display_name: Option<String>,
}

impl From<BodyAreaRow> for BodyArea {
    fn from(row: BodyAreaRow) -> Self {
        let label = row
            .display_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| row.body_area.clone());
        BodyArea {
            id: row.body_area,
            label,
        }
    }
}

#[async_trait]
impl RecoveryStore for PgStore {
    async fn insert_assessment(&self, assessment: NewAssessment) -> Result<Uuid, StoreError> {
        let id = Uuid::now_v7();
        let safety_flagged = assessment.analysis_result.is_blocked();
        sqlx::query(
            "INSERT INTO assessments \
             (id, user_id, body_area, intake_data, analysis_result, safety_flagged) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(assessment.user_id)
        .bind(&assessment.intake_data.body_area)
        .bind(Json(&assessment.intake_data))
        .bind(Json(&assessment.analysis_result))
        .bind(safety_flagged)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn insert_recovery_plan(&self, plan: NewRecoveryPlan) -> Result<Uuid, StoreError> {
        let id = Uuid::now_v7();
        sqlx::query(
            "INSERT INTO recovery_plans \
             (id, user_id, body_area, assessment_data, plan_data, phase, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(id)
        .bind(plan.user_id)
        .bind(&plan.body_area)
        .bind(Json(&plan.assessment_data))
        .bind(Json(&plan.plan_data))
        .bind(rejuuv_core::plans::INITIAL_PHASE)
        .bind(rejuuv_core::plans::STATUS_ACTIVE)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn insert_check_in(&self, check_in: NewCheckIn) -> Result<Uuid, StoreError> {
        let id = Uuid::now_v7();
        let data = &check_in.check_in;
        sqlx::query(
            "INSERT INTO check_ins \
             (id, user_id, recovery_plan_id, pain_level, pain_change, exercise_difficulty, \
              completed_activities, notes, adjustments) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(id)
        .bind(check_in.user_id)
        .bind(data.recovery_plan_id)
        .bind(i16::from(data.pain_level))
        .bind(data.pain_change.as_str())
        .bind(&data.difficulty)
        .bind(Json(&data.completed_activities))
        .bind(&data.notes)
        .bind(Json(&check_in.adjustments))
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn find_plan(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
    ) -> Result<Option<RecoveryPlan>, StoreError> {
        let row = sqlx::query_as::<_, PlanRow>(
            r#"
            SELECT id, user_id, body_area, phase, status, plan_data, created_at
            FROM recovery_plans
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(plan_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(RecoveryPlan::from))
    }

    async fn list_plans(&self, user_id: Uuid) -> Result<Vec<RecoveryPlan>, StoreError> {
        let rows = sqlx::query_as::<_, PlanRow>(
            r#"
            SELECT id, user_id, body_area, phase, status, plan_data, created_at
            FROM recovery_plans
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(RecoveryPlan::from).collect())
    }

    async fn list_check_ins(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
    ) -> Result<Vec<CheckIn>, StoreError> {
        let rows = sqlx::query_as::<_, CheckInRow>(
            r#"
            SELECT id, recovery_plan_id, pain_level, pain_change, exercise_difficulty,
                   completed_activities, notes, adjustments, created_at
            FROM check_ins
            WHERE recovery_plan_id = $1 AND user_id = $2
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(plan_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(CheckIn::try_from).collect()
    }

    async fn list_body_areas(&self) -> Result<Vec<BodyArea>, StoreError> {
        let rows = sqlx::query_as::<_, BodyAreaRow>(
            r#"
            SELECT body_area, display_name
            FROM body_area_configs
            WHERE is_active = TRUE
            ORDER BY sort_order ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(BodyArea::from).collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}
