use std::sync::Arc;

use coach_config::AnalysisSettings;
use coach_db::models::{
    AnalysisReport, Coaching, CompanyProfile, ConversionAnalysis, DialogueTurn, FeedbackItem,
    FollowUp, Profile, ProfileDelta, Role, RubricKey, RubricScores, lenient_scores,
};
use serde::Deserialize;
use tracing::debug;

use super::chat::{ChatCompletion, ChatRequest};
use super::error::AiError;

/// Observability hook for raw capability payloads. The default sink emits a
/// tracing event; tests can capture, and deployments can ship elsewhere. The
/// analyzer itself has no filesystem dependency.
pub trait ResponseSink: Send + Sync {
    fn record(&self, stage: &str, raw: &str);
}

pub struct TracingSink;

impl ResponseSink for TracingSink {
    fn record(&self, stage: &str, raw: &str) {
        debug!(stage, bytes = raw.len(), raw, "Capability response");
    }
}

const SYSTEM_PROMPT: &str = "You are an elite sales mentor writing a one-on-one \
coaching report for the director of a recorded consultation. Follow the dialogue \
chronologically and dissect every meaningful director utterance from multiple \
angles; this is a private tutoring report, not a checklist.\n\
\n\
Scoring (absolute, 0-100 per category): rapport, needs, proposal, price, \
objection, closing, trust_language, plus total. Scores are deduction-based: \
subtract heavily for each critical miss, cumulatively for repeated minor \
misses, and add back credit only for genuinely difficult situations handled \
well. Every low score must be justified by matching entries in the \
chronological feedback.\n\
\n\
Chronological feedback: walk the conversation from the first second to the \
last and surface EVERY noteworthy moment - mistakes, excellent moves, and \
things that should have been said but were not (type \"missed\"). Do not \
balance categories and do not stop at a round number: if one category has \
ten problems, report all ten; if there are thirty moments, report thirty. \
Read the [000s] tags to fill timestamp_sec exactly (for a missed moment, the \
second where the line belonged). Quote 2-4 lines of surrounding dialogue in \
dialog_context. For every bad or missed item, write a correction: a concrete \
2-3 sentence replacement script the director could repeat verbatim tomorrow.\n\
\n\
Also produce: an overall coaching summary (single sharpest strength, most \
urgent weakness), a conversion analysis (the counterpart's emotional flow, \
why the outcome happened, turning_point_sec from the [000s] tags), an updated \
view of the director's style (personality, new strengths, new weaknesses, \
newly observed objection patterns), concrete action items for the next \
consultation, and a follow-up recommendation.\n\
\n\
Respond with a single JSON object strictly matching the requested schema.";

const OUTPUT_SCHEMA: &str = r#"{
  "summary": "one-line mentor verdict",
  "scores": { "total": 0, "rapport": 0, "needs": 0, "proposal": 0, "price": 0, "objection": 0, "closing": 0, "trust_language": 0 },
  "chronological_feedbacks": [
    {
      "timestamp_sec": 0,
      "phase": "opening / needs discovery / pricing / objection / closing",
      "type": "good" | "bad" | "missed",
      "categories": ["rapport", "trust_language"],
      "dialog_context": "counterpart: ... - director: ... (verbatim excerpt)",
      "highlighted_saying": "the director's key line",
      "reason": "detailed multi-angle mentor commentary",
      "correction": "replacement script (omit for type good)"
    }
  ],
  "coaching": { "strength": "...", "weakness": "..." },
  "conversion_analysis": { "emotional_flow": "...", "outcome_rationale": "...", "turning_point_sec": 0 },
  "updated_profile": { "personality": "...", "new_strengths": [], "new_weaknesses": [], "new_patterns": [] },
  "action_items": ["mission 1", "mission 2"],
  "follow_up": { "needed": false, "priority": "low" | "medium" | "high", "note": "..." }
}"#;

/// Wire shape of the scoring capability's JSON. Everything defaults so a
/// partially filled response degrades instead of failing the session.
#[derive(Debug, Default, Deserialize)]
struct AnalysisResponse {
    #[serde(default)]
    summary: String,
    #[serde(default, deserialize_with = "lenient_scores")]
    scores: RubricScores,
    #[serde(default)]
    chronological_feedbacks: Vec<FeedbackItem>,
    #[serde(default)]
    coaching: Coaching,
    #[serde(default)]
    conversion_analysis: ConversionAnalysis,
    #[serde(default)]
    updated_profile: ProfileDelta,
    #[serde(default)]
    action_items: Vec<String>,
    #[serde(default)]
    follow_up: Option<FollowUp>,
}

/// Sends the merged dialogue plus contextual profiles to the scoring
/// capability and parses the coaching report. Pure analysis: the transcript
/// is already final and the capability never generates or edits dialogue.
pub struct ConversationAnalyzer {
    chat: Arc<dyn ChatCompletion>,
    thresholds: AnalysisSettings,
    temperature: f32,
    max_tokens: u32,
    sink: Arc<dyn ResponseSink>,
}

impl ConversationAnalyzer {
    pub fn new(
        chat: Arc<dyn ChatCompletion>,
        thresholds: AnalysisSettings,
        temperature: f32,
        max_tokens: u32,
        sink: Arc<dyn ResponseSink>,
    ) -> Self {
        Self {
            chat,
            thresholds,
            temperature,
            max_tokens,
            sink,
        }
    }

    pub async fn analyze(
        &self,
        turns: &[DialogueTurn],
        profile: Option<&Profile>,
        company: Option<&CompanyProfile>,
    ) -> Result<AnalysisReport, AiError> {
        let total_chars: usize = turns.iter().map(|t| t.text.chars().count()).sum();
        if turns.len() < self.thresholds.min_dialogue_turns
            || total_chars < self.thresholds.min_dialogue_chars
        {
            // Too little signal; no point spending a capability call.
            return Ok(AnalysisReport::insufficient(
                "The recording did not contain enough dialogue to analyze",
            ));
        }

        let request = ChatRequest {
            system: SYSTEM_PROMPT.to_string(),
            user: build_user_prompt(turns, profile, company),
            temperature: self.temperature,
            // Generous budget: a cramped budget is what makes models
            // summarize the feedback list down to ten items.
            max_tokens: Some(self.max_tokens),
        };

        let raw = self.chat.complete(request).await?;
        self.sink.record("analysis", &raw);

        let response: AnalysisResponse = serde_json::from_str(&raw)
            .map_err(|e| AiError::AnalysisEngine(format!("malformed analysis output: {e}")))?;

        let mut scores = response.scores;
        ensure_total(&mut scores);

        Ok(AnalysisReport {
            valid: true,
            summary: response.summary,
            scores,
            chronological_feedback: response.chronological_feedbacks,
            coaching: response.coaching,
            conversion: response.conversion_analysis,
            profile_delta: response.updated_profile,
            action_items: response.action_items,
            follow_up: response.follow_up,
            // The system-built transcript stays the source of truth.
            dialogue: turns.to_vec(),
            labeling_degraded: false,
        })
    }
}

/// Renders each turn with its integer start second so the capability can
/// cite exact moments: `[12s] Director: ...`.
pub(crate) fn render_transcript(turns: &[DialogueTurn]) -> String {
    turns
        .iter()
        .map(|t| {
            format!(
                "[{}s] {}: {}",
                t.start.floor() as i64,
                role_name(t.speaker),
                t.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::Director => "Director",
        Role::Counterpart => "Counterpart",
    }
}

fn build_user_prompt(
    turns: &[DialogueTurn],
    profile: Option<&Profile>,
    company: Option<&CompanyProfile>,
) -> String {
    let mut context = String::new();
    if let Some(company) = company {
        context.push_str(&format!(
            "[Company]\nProduct: {} | Industry: {} | Strengths: {}\n",
            non_empty(&company.product_name),
            non_empty(&company.industry),
            join_or_none(&company.strengths),
        ));
        if !company.known_objection_patterns.is_empty() {
            let patterns: Vec<String> = company
                .known_objection_patterns
                .iter()
                .map(|(pattern, handling)| format!("{pattern}: {handling}"))
                .collect();
            context.push_str(&format!("Known objections: {}\n", patterns.join("; ")));
        }
    }
    if let Some(profile) = profile {
        context.push_str(&format!(
            "[Director profile]\nStyle: {} | Strengths: {} | Weaknesses: {}\n",
            non_empty(&profile.personality),
            join_or_none(&profile.strengths),
            join_or_none(&profile.weaknesses),
        ));
    }

    format!(
        "{context}\n----------------------------------\n[Consultation transcript]\n{}\n----------------------------------\n\nOutput schema:\n{OUTPUT_SCHEMA}",
        render_transcript(turns)
    )
}

fn non_empty(value: &str) -> &str {
    if value.is_empty() { "unspecified" } else { value }
}

fn join_or_none(values: &[String]) -> String {
    if values.is_empty() {
        "none recorded".to_string()
    } else {
        values.join(", ")
    }
}

/// The capability asserts `total`; when it forgets, derive it as the rounded
/// mean of whichever categories are present.
fn ensure_total(scores: &mut RubricScores) {
    if scores.contains_key(&RubricKey::Total) {
        return;
    }
    let present: Vec<u8> = RubricKey::CATEGORIES
        .iter()
        .filter_map(|k| scores.get(k).copied())
        .collect();
    if present.is_empty() {
        return;
    }
    let mean =
        (present.iter().map(|&v| v as u32).sum::<u32>() as f64 / present.len() as f64).round();
    scores.insert(RubricKey::Total, mean as u8);
}
