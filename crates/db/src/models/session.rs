use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

use super::analysis::{DialogueTurn, FeedbackBundle, FollowUp, RubricScores, SpeakerRatio};

/// A recorded consultation. Created at upload time with audio metadata only;
/// the analysis pipeline fills in everything else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub customer_id: Option<ObjectId>,
    /// Human-assigned title. Preserved across re-analysis; the mentor
    /// one-liner only fills it when absent.
    pub summary: Option<String>,
    /// Object-storage key of the uploaded recording.
    pub audio_key: String,
    #[serde(default)]
    pub status: SessionStatus,
    pub is_valid: Option<bool>,
    pub duration_sec: Option<u32>,
    /// Raw engine output, JSON-serialized. Source of truth for fast
    /// re-analysis.
    pub transcript: Option<String>,
    #[serde(default)]
    pub transcript_with_timestamps: Vec<DialogueTurn>,
    pub scores: Option<RubricScores>,
    #[serde(default)]
    pub timeline: Vec<String>,
    pub speaker_ratio: Option<SpeakerRatio>,
    pub feedback: Option<FeedbackBundle>,
    #[serde(default)]
    pub action_items: Vec<String>,
    pub follow_up: Option<FollowUp>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Uploaded,
    Transcribing,
    Labeling,
    Analyzing,
    Analyzed,
    Failed,
}

impl Session {
    pub const COLLECTION: &'static str = "sessions";
}
