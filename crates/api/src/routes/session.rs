use axum::{
    Json,
    extract::{Path, Query, State},
};
use bson::oid::ObjectId;
use coach_db::models::Session;
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub user_id: String,
    pub customer_id: Option<String>,
    pub summary: Option<String>,
    pub audio_key: String,
}

#[derive(Debug, Serialize)]
pub struct SessionSummaryResponse {
    pub id: String,
    pub summary: Option<String>,
    pub status: String,
    pub is_valid: Option<bool>,
    pub duration_sec: Option<u32>,
    pub total_score: Option<u8>,
    pub created_at: String,
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateSessionRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user_id = ObjectId::parse_str(&body.user_id)
        .map_err(|_| ApiError::BadRequest("Invalid user_id".to_string()))?;
    let customer_id = body
        .customer_id
        .as_deref()
        .map(ObjectId::parse_str)
        .transpose()
        .map_err(|_| ApiError::BadRequest("Invalid customer_id".to_string()))?;
    if body.audio_key.trim().is_empty() {
        return Err(ApiError::BadRequest("audio_key is required".to_string()));
    }

    let now = bson::DateTime::now();
    let session = Session {
        id: None,
        user_id,
        customer_id,
        summary: body.summary,
        audio_key: body.audio_key,
        status: Default::default(),
        is_valid: None,
        duration_sec: None,
        transcript: None,
        transcript_with_timestamps: Vec::new(),
        scores: None,
        timeline: Vec::new(),
        speaker_ratio: None,
        feedback: None,
        action_items: Vec::new(),
        follow_up: None,
        created_at: now,
        updated_at: now,
    };

    let id = state.sessions.create(&session).await?;
    Ok(Json(serde_json::json!({ "id": id.to_hex() })))
}

pub async fn get(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = ObjectId::parse_str(&session_id)
        .map_err(|_| ApiError::BadRequest("Invalid session_id".to_string()))?;

    let session = state.sessions.get(id).await?;
    Ok(Json(to_detail(session)?))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub user_id: String,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user_id = ObjectId::parse_str(&params.user_id)
        .map_err(|_| ApiError::BadRequest("Invalid user_id".to_string()))?;

    let sessions = state.sessions.list_for_user(user_id).await?;
    let items: Vec<SessionSummaryResponse> = sessions.into_iter().map(to_summary).collect();
    Ok(Json(serde_json::json!({ "items": items })))
}

fn to_summary(s: Session) -> SessionSummaryResponse {
    let total_score = s
        .scores
        .as_ref()
        .and_then(|scores| scores.get(&coach_db::models::RubricKey::Total).copied());
    let status = status_name(&s);
    SessionSummaryResponse {
        id: s.id.map(|id| id.to_hex()).unwrap_or_default(),
        summary: s.summary,
        status,
        is_valid: s.is_valid,
        duration_sec: s.duration_sec,
        total_score,
        created_at: s.created_at.try_to_rfc3339_string().unwrap_or_default(),
    }
}

fn to_detail(s: Session) -> Result<serde_json::Value, ApiError> {
    Ok(serde_json::json!({
        "id": s.id.map(|id| id.to_hex()).unwrap_or_default(),
        "user_id": s.user_id.to_hex(),
        "customer_id": s.customer_id.map(|id| id.to_hex()),
        "summary": s.summary,
        "audio_key": s.audio_key,
        "status": status_name(&s),
        "is_valid": s.is_valid,
        "duration_sec": s.duration_sec,
        "transcript_with_timestamps": to_value(&s.transcript_with_timestamps)?,
        "scores": to_value(&s.scores)?,
        "timeline": s.timeline,
        "speaker_ratio": to_value(&s.speaker_ratio)?,
        "feedback": to_value(&s.feedback)?,
        "action_items": s.action_items,
        "follow_up": to_value(&s.follow_up)?,
        "created_at": s.created_at.try_to_rfc3339_string().unwrap_or_default(),
        "updated_at": s.updated_at.try_to_rfc3339_string().unwrap_or_default(),
    }))
}

fn status_name(s: &Session) -> String {
    serde_json::to_value(s.status)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Internal(e.to_string()))
}
