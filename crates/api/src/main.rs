use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use bizmetrics_core::domain::PipelineOutput;
use bizmetrics_core::{Envelope, MetricsPipeline, PipelineError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = bizmetrics_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let pipeline = Arc::new(MetricsPipeline::new(settings.execution_mode)?);
    let mode = pipeline.mode();
    let state = AppState { pipeline };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/analyze", post(analyze))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], settings.port));

    tracing::info!(%addr, %mode, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    pipeline: Arc<MetricsPipeline>,
}

async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> (StatusCode, Json<Envelope>) {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("analyze", %request_id);

    async move {
        let business_data = match payload {
            Ok(Json(value)) => value,
            Err(rejection) => return reject(rejection),
        };
        let pipeline = Arc::clone(&state.pipeline);
        let result = tokio::task::spawn_blocking(move || pipeline.invoke(&business_data))
            .await
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "pipeline task did not complete");
                Err(PipelineError::TaskPanicked { task: "analyze" })
            });
        respond(result)
    }
    .instrument(span)
    .await
}

/// Body that could not be read as JSON keeps axum's status code but gets
/// the same envelope as every other failure.
fn reject(rejection: JsonRejection) -> (StatusCode, Json<Envelope>) {
    tracing::warn!(error = %rejection.body_text(), "unreadable request body");
    let err = PipelineError::InvalidInput(rejection.body_text());
    (rejection.status(), Json(Envelope::from_result(Err(err))))
}

fn respond(result: Result<PipelineOutput, PipelineError>) -> (StatusCode, Json<Envelope>) {
    let status = match &result {
        Ok(out) => {
            tracing::info!(
                alerts = out.alerts.len(),
                recommendations = out.recommendations.len(),
                "analysis complete"
            );
            StatusCode::OK
        }
        Err(e) if e.is_precondition() => {
            tracing::warn!(error = %e, "rejected business data");
            StatusCode::UNPROCESSABLE_ENTITY
        }
        Err(e) => {
            let err = anyhow::Error::new(e.clone());
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %err, "analysis failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (status, Json(Envelope::from_result(result)))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &bizmetrics_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
