use axum::{Json, extract::State, http::StatusCode};
use bson::oid::ObjectId;
use coach_db::models::AnalysisReport;
use coach_services::ai::AiError;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Contract for both analyze endpoints: 200 with the report on success,
/// 500 with a descriptive error on any failure. The error string carries
/// the distinction (unknown session, missing transcript, engine failure);
/// the status code does not.
pub async fn analyze(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeRequest>,
) -> (StatusCode, Json<AnalyzeResponse>) {
    let Some(id) = parse_id(&body.session_id) else {
        return failure("Invalid session_id");
    };

    // Spawned so a dropped client connection does not cancel a long
    // analysis mid-flight; GET /api/session/{id} shows progress.
    let pipeline = state.pipeline.clone();
    let outcome = tokio::spawn(async move { pipeline.run_full(id).await }).await;
    respond(outcome)
}

pub async fn reanalyze(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeRequest>,
) -> (StatusCode, Json<AnalyzeResponse>) {
    let Some(id) = parse_id(&body.session_id) else {
        return failure("Invalid session_id");
    };

    let pipeline = state.pipeline.clone();
    let outcome = tokio::spawn(async move { pipeline.run_reanalysis(id).await }).await;
    respond(outcome)
}

fn parse_id(raw: &str) -> Option<ObjectId> {
    ObjectId::parse_str(raw).ok()
}

fn respond(
    outcome: Result<Result<AnalysisReport, AiError>, tokio::task::JoinError>,
) -> (StatusCode, Json<AnalyzeResponse>) {
    match outcome {
        Ok(Ok(report)) => (
            StatusCode::OK,
            Json(AnalyzeResponse {
                success: true,
                result: Some(report),
                error: None,
            }),
        ),
        Ok(Err(err)) => {
            error!(error = %err, "Analysis failed");
            failure(&err.to_string())
        }
        Err(join_err) => {
            error!(error = %join_err, "Analysis task panicked");
            failure("Analysis task failed")
        }
    }
}

fn failure(message: &str) -> (StatusCode, Json<AnalyzeResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(AnalyzeResponse {
            success: false,
            result: None,
            error: Some(message.to_string()),
        }),
    )
}

#[cfg(test)]
mod tests {
    use coach_services::dao::base::DaoError;

    use super::*;

    #[test]
    fn success_is_a_200_with_the_report() {
        let (status, body) = respond(Ok(Ok(AnalysisReport::default())));

        assert_eq!(status, StatusCode::OK);
        assert!(body.0.success);
        assert!(body.0.result.is_some());
        assert!(body.0.error.is_none());
    }

    #[test]
    fn every_pipeline_failure_is_a_500_with_an_error_message() {
        let errors = [
            AiError::NoTranscript,
            AiError::Dao(DaoError::NotFound),
            AiError::Unconfigured("openai.api_key"),
            AiError::AnalysisEngine("upstream returned 503".to_string()),
            AiError::Storage("download failed".to_string()),
        ];

        for err in errors {
            let expected = err.to_string();
            let (status, body) = respond(Ok(Err(err)));

            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert!(!body.0.success);
            assert!(body.0.result.is_none());
            assert_eq!(body.0.error.as_deref(), Some(expected.as_str()));
        }
    }

    #[test]
    fn malformed_ids_never_parse() {
        assert!(parse_id("not-an-object-id").is_none());
        assert!(parse_id("").is_none());
    }
}
