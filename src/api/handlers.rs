use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::collections::HashMap;

use crate::core::metrics;
use crate::core::state::AppState;
use crate::repositories::classifications::StoreHealth;
use crate::schemas::{HealthResponse, RootResponse};

pub(crate) async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    let response = RootResponse {
        message: state.settings().api().project_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        docs_url: format!("{}/docs", state.settings().api().api_v1_str),
    };

    Json(response)
}

pub(crate) async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut status = "healthy".to_string();
    let mut components = HashMap::new();

    let backend = state.classifications().backend();
    match state.classifications().health().await {
        StoreHealth::Healthy => {
            components.insert("classification_store".to_string(), format!("healthy ({backend})"));
        }
        StoreHealth::Unhealthy(error) => {
            components.insert(
                "classification_store".to_string(),
                format!("unhealthy ({backend}): {error}"),
            );
            status = "degraded".to_string();
        }
    }

    let ai = if state.settings().ai().groq_api_key.is_empty() { "unconfigured" } else { "configured" };
    components.insert("ai".to_string(), ai.to_string());

    Json(HealthResponse { service: "arikya-insight-api".to_string(), status, components })
}

pub(crate) async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    if !state.settings().telemetry().prometheus_enabled {
        return StatusCode::NOT_FOUND.into_response();
    }

    match metrics::render() {
        Some(body) => ([(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
            .into_response(),
        None => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}
