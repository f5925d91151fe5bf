//! HTTP surface: landing page, health probe and the prediction endpoint.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{Method, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::common::config::FaultStatus;
use crate::common::error::{OncoError, OncoResult};
use crate::inference::{Prediction, PredictionService};

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Shared handler state; the service itself is immutable.
#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<PredictionService>,
    pub fault_status: FaultStatus,
}

impl ApiState {
    pub fn new(service: PredictionService, fault_status: FaultStatus) -> Self {
        Self {
            service: Arc::new(service),
            fault_status,
        }
    }
}

/// Request-boundary error: every failure becomes `{"error": <message>}`.
#[derive(Debug)]
pub struct ApiError {
    err: OncoError,
    fault_status: FaultStatus,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        if self.err.code.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::from_u16(self.fault_status.as_u16())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.err.to_string() }))).into_response()
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    model_loaded: bool,
}

#[derive(Debug, Serialize)]
struct FeaturesResponse {
    count: usize,
    features: &'static [&'static str],
}

/// Build the router with all endpoints.
pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/api/features", get(features_handler))
        .route("/api/predict", post(predict_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C or SIGTERM.
pub async fn serve(addr: SocketAddr, state: ApiState) -> OncoResult<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| OncoError::startup(format!("failed to bind {addr}: {e}")))?;
    info!(module = "api", ev = "listening", %addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| OncoError::startup(format!("server error: {e}")))?;

    info!(module = "api", ev = "stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(module = "api", error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(module = "api", error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!(module = "api", ev = "shutdown_requested");
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health_handler(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        model_loaded: state.service.model_loaded(),
    })
}

async fn features_handler(State(state): State<ApiState>) -> Json<FeaturesResponse> {
    let features = state.service.feature_names();
    Json(FeaturesResponse {
        count: features.len(),
        features,
    })
}

async fn predict_handler(
    State(state): State<ApiState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Prediction>, ApiError> {
    let body = match body {
        Ok(Json(value)) => Some(value),
        Err(rejection) => {
            warn!(module = "api", ev = "bad_body", reason = %rejection.body_text());
            None
        }
    };

    state
        .service
        .predict_payload(body.as_ref())
        .map(Json)
        .map_err(|err| ApiError {
            err,
            fault_status: state.fault_status,
        })
}
