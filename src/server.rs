//! HTTP interface of the prediction service.

use crate::feature_extractor::FeatureExtractor;
use crate::metrics::{MetricsSnapshot, ServiceMetrics};
use crate::models::inference::InferenceEngine;
use crate::types::{DurationPrediction, InvalidRide, Ride};
use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, warn};
use uuid::Uuid;

/// Shared, read-only state handed to every request
#[derive(Clone)]
pub struct AppState {
    engine: Arc<InferenceEngine>,
    extractor: Arc<FeatureExtractor>,
    metrics: Arc<ServiceMetrics>,
    started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(engine: Arc<InferenceEngine>, metrics: Arc<ServiceMetrics>) -> Self {
        Self {
            engine,
            extractor: Arc::new(FeatureExtractor::new()),
            metrics,
            started_at: Utc::now(),
        }
    }

    pub fn metrics(&self) -> &Arc<ServiceMetrics> {
        &self.metrics
    }

    /// Validate, featurize and score one ride
    pub fn predict(&self, ride: &Ride) -> Result<DurationPrediction, ApiError> {
        ride.validate()?;
        let features = self.extractor.extract(ride);
        let duration = self
            .engine
            .predict(&features)
            .map_err(ApiError::Prediction)?;
        Ok(DurationPrediction::new(duration))
    }
}

/// Errors surfaced to HTTP clients
#[derive(Debug, Error)]
pub enum ApiError {
    /// Body missing, not JSON, or not a ride
    #[error(transparent)]
    Malformed(#[from] JsonRejection),

    #[error("invalid ride: {0}")]
    InvalidRide(#[from] InvalidRide),

    #[error("prediction failed: {0:#}")]
    Prediction(anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Malformed(rejection) => rejection.status(),
            ApiError::InvalidRide(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Prediction(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Malformed(rejection) => rejection.body_text(),
            other => other.to_string(),
        };
        (self.status(), Json(ErrorBody { error: message })).into_response()
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    model: &'static str,
    features: usize,
    started_at: DateTime<Utc>,
}

/// Build the service router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/predict", post(handle_predict))
        .route("/health", get(health_check))
        .route("/metrics", get(get_metrics))
        .with_state(state)
}

/// Serve on an already bound listener until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(addr = %addr, "Prediction service listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")
}

/// Resolves on SIGINT or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

// Handlers

async fn handle_predict(
    State(state): State<AppState>,
    payload: Result<Json<Ride>, JsonRejection>,
) -> Result<Json<DurationPrediction>, ApiError> {
    let request_id = Uuid::new_v4();
    let start_time = Instant::now();

    let result = payload
        .map_err(ApiError::from)
        .and_then(|Json(ride)| state.predict(&ride));
    let latency = start_time.elapsed();

    match result {
        Ok(prediction) => {
            state.metrics.record_prediction(latency, prediction.duration);
            info!(
                request_id = %request_id,
                duration = prediction.duration,
                latency_us = latency.as_micros(),
                "Prediction served"
            );
            Ok(Json(prediction))
        }
        Err(e) => {
            let status = e.status();
            state.metrics.record_failure(latency, status.as_u16());
            warn!(
                request_id = %request_id,
                status = status.as_u16(),
                error = %e,
                "Prediction request failed"
            );
            Err(e)
        }
    }
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model: state.engine.model_kind(),
        features: state.engine.feature_width(),
        started_at: state.started_at,
    })
}

async fn get_metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DictVectorizer, LinearRegression};

    fn state() -> AppState {
        let vectorizer = DictVectorizer::new(
            vec!["PU_DO=10_20".to_string(), "trip_distance".to_string()],
            "=",
        )
        .unwrap();
        let model = LinearRegression::new(vec![2.0, 3.0], 1.0).unwrap();
        let engine = InferenceEngine::from_parts(vectorizer, Box::new(model)).unwrap();
        AppState::new(Arc::new(engine), Arc::new(ServiceMetrics::new()))
    }

    #[test]
    fn test_predict_known_route() {
        let prediction = state().predict(&Ride::new(10, 20, 5.0)).unwrap();
        assert_eq!(prediction.duration, 18.0);
    }

    #[test]
    fn test_invalid_ride_maps_to_422() {
        let err = state().predict(&Ride::new(10, "", 5.0)).unwrap_err();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_prediction_error_maps_to_500() {
        let err = ApiError::Prediction(anyhow::anyhow!("shape mismatch"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "prediction failed: shape mismatch");
    }
}
