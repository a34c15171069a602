use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::schemas::dashboard::{
    BatchInsightRequest, BatchInsightResponse, DashboardQueryRequest, DashboardQueryResponse,
    QuestionAnalysisRequest, QuestionAnalysisResponse, TopPerformersRequest, TopPerformersResponse,
};
use crate::services::chat::AiError;
use crate::services::dashboard::{DashboardError, QueryOutcome};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/analyze-question", post(analyze_question))
        .route("/top-performers", post(top_performers))
        .route("/top-performers-insight", post(top_performers_with_insight))
        .route("/batch-insight", post(batch_insight))
        .route("/query", post(query))
}

pub(super) async fn analyze_question(
    State(state): State<AppState>,
    Json(payload): Json<QuestionAnalysisRequest>,
) -> Result<Json<QuestionAnalysisResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let record = state
        .dashboard()
        .analyze_question(&payload.question)
        .await
        .map_err(map_dashboard_error)?;

    Ok(Json(record.into()))
}

pub(super) async fn top_performers(
    State(state): State<AppState>,
    Json(payload): Json<TopPerformersRequest>,
) -> Result<Json<TopPerformersResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let report = state
        .dashboard()
        .top_performers(&payload.submissions, payload.top_n as usize)
        .await
        .map_err(map_dashboard_error)?;

    Ok(Json(TopPerformersResponse {
        items: report.students,
        skipped_submissions: report.skipped_submissions,
    }))
}

pub(super) async fn top_performers_with_insight(
    State(state): State<AppState>,
    Json(payload): Json<TopPerformersRequest>,
) -> Result<Json<TopPerformersResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let report = state
        .dashboard()
        .top_performers_with_insight(&payload.submissions, payload.top_n as usize)
        .await
        .map_err(map_dashboard_error)?;

    Ok(Json(TopPerformersResponse {
        items: report.students,
        skipped_submissions: report.skipped_submissions,
    }))
}

pub(super) async fn batch_insight(
    State(state): State<AppState>,
    Json(payload): Json<BatchInsightRequest>,
) -> Result<Json<BatchInsightResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let (report, summary) = state
        .dashboard()
        .batch_insight(&payload.submissions)
        .await
        .map_err(map_dashboard_error)?;

    Ok(Json(BatchInsightResponse {
        analytics: report.analytics,
        summary,
        skipped_submissions: report.skipped_submissions,
    }))
}

pub(super) async fn query(
    State(state): State<AppState>,
    Json(payload): Json<DashboardQueryRequest>,
) -> Result<Json<DashboardQueryResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let outcome = state
        .dashboard()
        .query(&payload.question, &payload.submissions)
        .await
        .map_err(map_dashboard_error)?;

    let response = match outcome {
        QueryOutcome::TopPerformers { students, skipped_submissions } => {
            DashboardQueryResponse::top_performers(students, skipped_submissions)
        }
        QueryOutcome::BatchInsight { analytics, summary, skipped_submissions } => {
            DashboardQueryResponse::batch_insight(analytics, summary, skipped_submissions)
        }
        QueryOutcome::Unrecognized { intent } => {
            tracing::info!(intent, "Dashboard query intent not recognized");
            DashboardQueryResponse::unrecognized()
        }
    };

    Ok(Json(response))
}

fn map_dashboard_error(err: DashboardError) -> ApiError {
    match err {
        DashboardError::Ai(AiError::MissingCredentials) => {
            ApiError::ServiceUnavailable("AI credentials are not configured".to_string())
        }
        DashboardError::Ai(ai @ (AiError::Transport(_) | AiError::Api { .. })) => {
            tracing::error!(error = %ai, "AI service call failed");
            ApiError::ServiceUnavailable("AI service is unavailable".to_string())
        }
        DashboardError::Ai(ai @ (AiError::EmptyResponse | AiError::Malformed(_))) => {
            ApiError::internal(ai, "AI response could not be interpreted")
        }
        DashboardError::Store(e) => ApiError::internal(e, "Classification store query failed"),
    }
}
