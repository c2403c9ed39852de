use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Binary speaker attribution. The director leads the consultation and
/// does the selling; the counterpart is the prospective client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Director,
    Counterpart,
}

/// Smallest time-stamped unit emitted by the speech-to-text engine.
/// Immutable once produced; ordered by `start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// A segment with its speaker decided. The text must stay byte-identical
/// to the source segment; labeling never rewrites content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledSegment {
    pub speaker: Role,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// One or more consecutive same-speaker segments merged into a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueTurn {
    pub speaker: Role,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// The seven fixed rubric categories plus the asserted total.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RubricKey {
    Rapport,
    Needs,
    Proposal,
    Price,
    Objection,
    Closing,
    TrustLanguage,
    Total,
}

impl RubricKey {
    pub const CATEGORIES: [RubricKey; 7] = [
        RubricKey::Rapport,
        RubricKey::Needs,
        RubricKey::Proposal,
        RubricKey::Price,
        RubricKey::Objection,
        RubricKey::Closing,
        RubricKey::TrustLanguage,
    ];
}

pub type RubricScores = BTreeMap<RubricKey, u8>;

/// Deserializes a score map leniently: unknown category names are dropped,
/// fractional values are rounded, anything above 100 is clamped. The scoring
/// capability occasionally invents keys; that must not fail the whole parse.
pub fn lenient_scores<'de, D>(deserializer: D) -> Result<RubricScores, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: BTreeMap<String, f64> = BTreeMap::deserialize(deserializer)?;
    let mut scores = RubricScores::new();
    for (key, value) in raw {
        if let Ok(key) = serde_json::from_value::<RubricKey>(serde_json::Value::String(key)) {
            scores.insert(key, value.clamp(0.0, 100.0).round() as u8);
        }
    }
    Ok(scores)
}

/// Deserializes feedback categories leniently, dropping labels outside the
/// fixed rubric instead of rejecting the item.
pub fn lenient_categories<'de, D>(deserializer: D) -> Result<Vec<RubricKey>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<String> = Vec::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|k| serde_json::from_value(serde_json::Value::String(k)).ok())
        .collect())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    #[default]
    Good,
    Bad,
    Missed,
}

/// One annotated moment in the chronological analysis. Every field defaults
/// so partial capability output degrades instead of aborting the session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedbackItem {
    #[serde(default)]
    pub timestamp_sec: f64,
    #[serde(default)]
    pub phase: String,
    #[serde(rename = "type", default)]
    pub kind: FeedbackKind,
    #[serde(default, deserialize_with = "lenient_categories")]
    pub categories: Vec<RubricKey>,
    #[serde(default)]
    pub dialog_context: String,
    #[serde(default)]
    pub highlighted_saying: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub correction: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Coaching {
    #[serde(default)]
    pub strength: String,
    #[serde(default)]
    pub weakness: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionAnalysis {
    #[serde(default)]
    pub emotional_flow: String,
    #[serde(default)]
    pub outcome_rationale: String,
    #[serde(default)]
    pub turning_point_sec: Option<f64>,
}

/// What one analyzed session contributes to the rolling account profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileDelta {
    #[serde(default)]
    pub personality: String,
    #[serde(default)]
    pub new_strengths: Vec<String>,
    #[serde(default)]
    pub new_weaknesses: Vec<String>,
    #[serde(default)]
    pub new_patterns: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUpPriority {
    #[default]
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FollowUp {
    #[serde(default)]
    pub needed: bool,
    #[serde(default)]
    pub priority: FollowUpPriority,
    #[serde(default)]
    pub note: String,
}

/// Share of spoken seconds per role across the merged dialogue.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SpeakerRatio {
    pub director: f64,
    pub counterpart: f64,
}

/// The feedback bundle persisted onto the session record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedbackBundle {
    #[serde(default)]
    pub chronological_feedbacks: Vec<FeedbackItem>,
    #[serde(default)]
    pub coaching: Coaching,
    #[serde(default)]
    pub conversion: ConversionAnalysis,
    #[serde(default)]
    pub updated_profile: ProfileDelta,
    #[serde(default)]
    pub mentor_summary: String,
}

/// Terminal artifact of the analysis pipeline.
///
/// `dialogue` is the system-built merged transcript attached verbatim by the
/// analyzer; the scoring capability never regenerates it. The feedback list
/// is unbounded: one entry per distinct noteworthy moment, never capped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub valid: bool,
    #[serde(default)]
    pub summary: String,
    #[serde(default, deserialize_with = "lenient_scores")]
    pub scores: RubricScores,
    #[serde(default)]
    pub chronological_feedback: Vec<FeedbackItem>,
    #[serde(default)]
    pub coaching: Coaching,
    #[serde(default)]
    pub conversion: ConversionAnalysis,
    #[serde(default)]
    pub profile_delta: ProfileDelta,
    #[serde(default)]
    pub action_items: Vec<String>,
    #[serde(default)]
    pub follow_up: Option<FollowUp>,
    #[serde(default)]
    pub dialogue: Vec<DialogueTurn>,
    /// Set when speaker labeling fell back to attributing everything to the
    /// director, so degraded attribution is distinguishable downstream.
    #[serde(default)]
    pub labeling_degraded: bool,
}

impl AnalysisReport {
    /// Report for input that carried too little signal to analyze.
    pub fn insufficient(reason: &str) -> Self {
        Self {
            valid: false,
            summary: reason.to_string(),
            ..Self::default()
        }
    }
}
