use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod auth;
mod config;
mod error;
mod extract;
mod llm;
mod middleware;
mod pipeline;
mod routes;
mod state;
mod store;
#[cfg(test)]
mod testing;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Rejuuv API",
        version = "0.1.0",
        description = "Pain intake, movement analysis, recovery plans, and progress check-ins. Guidance is educational and never diagnostic."
    ),
    paths(
        routes::health::health_check,
        routes::assessments::create_assessment,
        routes::recovery_plans::create_recovery_plan,
        routes::check_ins::create_check_in,
        routes::plans::list_plans,
        routes::plans::get_plan,
        routes::body_areas::list_body_areas,
    ),
    components(schemas(
        routes::health::HealthResponse,
        rejuuv_core::error::ApiError,
        rejuuv_core::intake::IntakeData,
        rejuuv_core::intake::SafetyResult,
        rejuuv_core::intake::AnalysisResult,
        rejuuv_core::intake::BlockedAssessment,
        rejuuv_core::intake::AnalyzedAssessment,
        rejuuv_core::intake::AssessmentResponse,
        rejuuv_core::intake::BodyArea,
        rejuuv_core::plans::RecoveryPhase,
        rejuuv_core::plans::PhasedPlan,
        rejuuv_core::plans::RecoveryPlanData,
        rejuuv_core::plans::CreateRecoveryPlanRequest,
        rejuuv_core::plans::AssessmentSnapshot,
        rejuuv_core::plans::RecoveryPlanResponse,
        rejuuv_core::plans::RecoveryPlan,
        rejuuv_core::plans::PlansResponse,
        rejuuv_core::plans::PlanDetailResponse,
        rejuuv_core::check_ins::PainChange,
        rejuuv_core::check_ins::CreateCheckInRequest,
        rejuuv_core::check_ins::CheckInData,
        rejuuv_core::check_ins::CheckInResult,
        rejuuv_core::check_ins::CheckInResponse,
        rejuuv_core::check_ins::CheckIn,
    )),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            utoipa::openapi::security::SecurityScheme::Http(
                utoipa::openapi::security::Http::new(
                    utoipa::openapi::security::HttpAuthScheme::Bearer,
                ),
            ),
        );
    }
}

#[tokio::main]
async fn main() {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();

    // Structured JSON logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rejuuv_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = config::AppConfig::from_env().expect("Invalid configuration");

    // Database connection
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    sqlx::migrate!("../migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let completion = llm::AnthropicClient::from_config(&config.completion)
        .expect("Failed to build completion client");
    let identity =
        auth::build_identity_provider(&config.identity).expect("Failed to build identity provider");

    tracing::info!(
        fast_model = %config.model_tiers.fast,
        capable_model = %config.model_tiers.capable,
        "Completion model tiers configured"
    );

    let app_state = state::AppState {
        pipeline: Arc::new(pipeline::Pipeline::new(
            Arc::new(completion),
            Arc::new(store::PgStore::new(pool)),
            config.model_tiers.clone(),
        )),
        identity: identity.clone(),
    };

    // CORS
    let cors_layer = middleware::cors::build_cors_layer(&config.cors_origins);

    // Router with per-endpoint rate limiting; tokens are resolved only after
    // a request passes its rate limit.
    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .merge(routes::health::router())
        .merge(
            routes::completion_router()
                .layer(auth::InjectAuthLayer::new(identity.clone()))
                .layer(middleware::rate_limit::completion_layer()),
        )
        .merge(
            routes::read_router()
                .layer(auth::InjectAuthLayer::new(identity))
                .layer(middleware::rate_limit::read_layer()),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer),
        )
        .with_state(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Rejuuv API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server error");
}
