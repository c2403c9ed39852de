use std::sync::Arc;

use async_trait::async_trait;
use bson::oid::ObjectId;
use coach_db::models::{
    AnalysisReport, CompanyProfile, DialogueTurn, FeedbackBundle, FollowUp, Profile, ProfileDelta,
    Role, RubricScores, Segment, Session, SessionStatus, SpeakerRatio,
};
use serde::Deserialize;
use tracing::{info, warn};

use super::analyzer::ConversationAnalyzer;
use super::error::AiError;
use super::labeler::SpeakerLabeler;
use super::merger::merge_turns;
use super::transcribe::SpeechToText;
use crate::dao::base::DaoError;
use crate::storage::AudioStore;

/// Everything the orchestrator writes back onto a session, applied in one
/// persistence call together with the `analyzed` status so a reader never
/// observes a half-updated record.
#[derive(Debug, Clone)]
pub struct SessionAnalysisUpdate {
    pub scores: RubricScores,
    pub timeline: Vec<String>,
    pub speaker_ratio: SpeakerRatio,
    pub feedback: FeedbackBundle,
    pub action_items: Vec<String>,
    pub is_valid: bool,
    /// Raw engine output; `None` on the fast path leaves the stored value
    /// untouched.
    pub transcript: Option<String>,
    pub transcript_with_timestamps: Vec<DialogueTurn>,
    pub follow_up: Option<FollowUp>,
    /// `None` on the fast path.
    pub duration_sec: Option<u32>,
    pub summary: Option<String>,
}

/// Persistence seams. Implemented by the Mongo DAOs; tests substitute
/// in-memory fakes.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: ObjectId) -> Result<Session, DaoError>;
    async fn set_status(&self, id: ObjectId, status: SessionStatus) -> Result<(), DaoError>;
    async fn save_analysis(
        &self,
        id: ObjectId,
        update: SessionAnalysisUpdate,
    ) -> Result<(), DaoError>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find(&self, user_id: ObjectId) -> Result<Option<Profile>, DaoError>;
    /// Union-merges strengths/weaknesses, overwrites personality when the
    /// delta carries one.
    async fn merge_delta(&self, user_id: ObjectId, delta: &ProfileDelta) -> Result<(), DaoError>;
}

#[async_trait]
pub trait CompanyStore: Send + Sync {
    async fn find(&self, user_id: ObjectId) -> Result<Option<CompanyProfile>, DaoError>;
    /// Registers newly observed objection patterns; never removes or
    /// rewrites existing ones.
    async fn register_patterns(&self, user_id: ObjectId, patterns: &[String])
    -> Result<(), DaoError>;
}

#[derive(Debug, Deserialize, Default)]
struct StoredTranscript {
    #[serde(default)]
    segments: Vec<Segment>,
}

/// Coordinates the full audio-to-report pipeline and the reduced
/// re-analysis flow. One invocation per session; independent sessions may
/// run concurrently with no shared mutable state outside the stores.
pub struct AnalysisPipeline {
    stt: Arc<dyn SpeechToText>,
    labeler: SpeakerLabeler,
    analyzer: ConversationAnalyzer,
    audio: Arc<dyn AudioStore>,
    sessions: Arc<dyn SessionStore>,
    profiles: Arc<dyn ProfileStore>,
    companies: Arc<dyn CompanyStore>,
}

impl AnalysisPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        stt: Arc<dyn SpeechToText>,
        labeler: SpeakerLabeler,
        analyzer: ConversationAnalyzer,
        audio: Arc<dyn AudioStore>,
        sessions: Arc<dyn SessionStore>,
        profiles: Arc<dyn ProfileStore>,
        companies: Arc<dyn CompanyStore>,
    ) -> Self {
        Self {
            stt,
            labeler,
            analyzer,
            audio,
            sessions,
            profiles,
            companies,
        }
    }

    /// Full chain: download audio, transcribe, label, merge, analyze,
    /// persist, update profiles.
    pub async fn run_full(&self, session_id: ObjectId) -> Result<AnalysisReport, AiError> {
        match self.run_full_inner(session_id).await {
            Ok(report) => Ok(report),
            Err(err) => {
                let _ = self
                    .sessions
                    .set_status(session_id, SessionStatus::Failed)
                    .await;
                Err(err)
            }
        }
    }

    async fn run_full_inner(&self, session_id: ObjectId) -> Result<AnalysisReport, AiError> {
        let session = self.sessions.load(session_id).await?;
        let audio = self.audio.fetch(&session.audio_key).await?;

        self.sessions
            .set_status(session_id, SessionStatus::Transcribing)
            .await?;
        let transcription = self.stt.transcribe(audio, "audio.webm").await?;
        info!(
            session_id = %session_id,
            segments = transcription.segments.len(),
            "Transcription complete"
        );

        self.sessions
            .set_status(session_id, SessionStatus::Labeling)
            .await?;
        let (labeled, degraded) = self.labeler.label(&transcription.segments).await;
        let dialogue = merge_turns(&labeled);

        let mut report = self
            .analyze_dialogue(session_id, session.user_id, &dialogue)
            .await?;
        report.labeling_degraded = degraded;

        let update = self.build_update(
            &session,
            &report,
            Some(transcription.raw.to_string()),
            Some(transcription.duration_sec.round() as u32),
        );
        self.sessions.save_analysis(session_id, update).await?;
        self.apply_profile_updates(session.user_id, &report).await?;

        Ok(report)
    }

    /// Fast path: reuse the stored raw transcript, re-run labeling, merging
    /// and analysis only. Raw transcript and duration stay untouched.
    pub async fn run_reanalysis(&self, session_id: ObjectId) -> Result<AnalysisReport, AiError> {
        match self.run_reanalysis_inner(session_id).await {
            Ok(report) => Ok(report),
            Err(err @ AiError::NoTranscript) => Err(err),
            Err(err) => {
                let _ = self
                    .sessions
                    .set_status(session_id, SessionStatus::Failed)
                    .await;
                Err(err)
            }
        }
    }

    async fn run_reanalysis_inner(&self, session_id: ObjectId) -> Result<AnalysisReport, AiError> {
        let session = self.sessions.load(session_id).await?;
        let raw = session.transcript.as_deref().ok_or(AiError::NoTranscript)?;
        let segments = parse_stored_transcript(raw);

        self.sessions
            .set_status(session_id, SessionStatus::Labeling)
            .await?;
        let (labeled, degraded) = self.labeler.label(&segments).await;
        let dialogue = merge_turns(&labeled);

        let mut report = self
            .analyze_dialogue(session_id, session.user_id, &dialogue)
            .await?;
        report.labeling_degraded = degraded;

        let update = self.build_update(&session, &report, None, None);
        self.sessions.save_analysis(session_id, update).await?;
        self.apply_profile_updates(session.user_id, &report).await?;

        Ok(report)
    }

    async fn analyze_dialogue(
        &self,
        session_id: ObjectId,
        user_id: ObjectId,
        dialogue: &[DialogueTurn],
    ) -> Result<AnalysisReport, AiError> {
        self.sessions
            .set_status(session_id, SessionStatus::Analyzing)
            .await?;
        let profile = self.profiles.find(user_id).await?;
        let company = self.companies.find(user_id).await?;
        self.analyzer
            .analyze(dialogue, profile.as_ref(), company.as_ref())
            .await
    }

    fn build_update(
        &self,
        session: &Session,
        report: &AnalysisReport,
        transcript: Option<String>,
        duration_sec: Option<u32>,
    ) -> SessionAnalysisUpdate {
        // A human-assigned title always wins over the mentor one-liner, and
        // an invalid report's explanation never becomes a title.
        let summary = session.summary.clone().or_else(|| {
            (report.valid && !report.summary.is_empty()).then(|| report.summary.clone())
        });

        SessionAnalysisUpdate {
            scores: report.scores.clone(),
            timeline: derive_timeline(report),
            speaker_ratio: speaker_ratio(&report.dialogue),
            feedback: FeedbackBundle {
                chronological_feedbacks: report.chronological_feedback.clone(),
                coaching: report.coaching.clone(),
                conversion: report.conversion.clone(),
                updated_profile: report.profile_delta.clone(),
                mentor_summary: report.summary.clone(),
            },
            action_items: report.action_items.clone(),
            is_valid: report.valid,
            transcript,
            transcript_with_timestamps: report.dialogue.clone(),
            follow_up: report.follow_up.clone(),
            duration_sec,
            summary,
        }
    }

    /// Invalid sessions never contribute to profile learning.
    async fn apply_profile_updates(
        &self,
        user_id: ObjectId,
        report: &AnalysisReport,
    ) -> Result<(), AiError> {
        if !report.valid {
            return Ok(());
        }

        let delta = &report.profile_delta;
        self.profiles.merge_delta(user_id, delta).await?;
        if !delta.new_patterns.is_empty() {
            self.companies
                .register_patterns(user_id, &delta.new_patterns)
                .await?;
        }
        Ok(())
    }
}

/// Re-parses a stored raw transcript. Corrupt stored data degrades to an
/// empty segment list, which the analyzer reports as insufficient input.
fn parse_stored_transcript(raw: &str) -> Vec<Segment> {
    match serde_json::from_str::<StoredTranscript>(raw) {
        Ok(stored) => stored.segments,
        Err(err) => {
            warn!(error = %err, "Stored transcript is not valid JSON, treating as empty");
            Vec::new()
        }
    }
}

/// Ordered distinct phases mentioned in the chronological feedback.
fn derive_timeline(report: &AnalysisReport) -> Vec<String> {
    let mut timeline: Vec<String> = Vec::new();
    for item in &report.chronological_feedback {
        let phase = item.phase.trim();
        if !phase.is_empty() && timeline.iter().all(|p| p != phase) {
            timeline.push(phase.to_string());
        }
    }
    timeline
}

/// Share of spoken seconds per role, normalized to sum to 1.0.
fn speaker_ratio(dialogue: &[DialogueTurn]) -> SpeakerRatio {
    let mut director = 0.0;
    let mut counterpart = 0.0;
    for turn in dialogue {
        let span = (turn.end - turn.start).max(0.0);
        match turn.speaker {
            Role::Director => director += span,
            Role::Counterpart => counterpart += span,
        }
    }
    let total = director + counterpart;
    if total <= 0.0 {
        return SpeakerRatio::default();
    }
    SpeakerRatio {
        director: director / total,
        counterpart: counterpart / total,
    }
}

/// Order-preserving set union used for profile strengths/weaknesses.
pub fn union_preserving_order(existing: &[String], new: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = existing.to_vec();
    for value in new {
        if !merged.contains(value) {
            merged.push(value.clone());
        }
    }
    merged
}
