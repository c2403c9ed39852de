use std::collections::HashMap;
use std::sync::Arc;

use coach_db::models::{LabeledSegment, Role, Segment};
use serde::Deserialize;
use tracing::warn;

use super::chat::{ChatCompletion, ChatRequest};

const SYSTEM_PROMPT: &str = "You are a speaker-identification specialist. \
You are given a numbered list of utterances from a recorded sales consultation \
between two people: the 'director' (leads the consultation, explains, proposes, \
sells) and the 'counterpart' (asks questions, listens, decides). \
For each [ID] decide only who is speaking. \
Never modify, shorten, or repeat the utterance text; decide only the speaker. \
Respond with JSON only.";

#[derive(Debug, Deserialize, Default)]
struct LabelsResponse {
    #[serde(default)]
    labels: Vec<LabelEntry>,
}

#[derive(Debug, Deserialize)]
struct LabelEntry {
    id: usize,
    #[serde(default)]
    speaker: String,
}

/// Assigns a speaker role to each transcribed segment in one batched
/// classification call. Labels are joined positionally back onto the input
/// segments, so text is byte-identical to the source by construction.
pub struct SpeakerLabeler {
    chat: Arc<dyn ChatCompletion>,
}

impl SpeakerLabeler {
    pub fn new(chat: Arc<dyn ChatCompletion>) -> Self {
        Self { chat }
    }

    /// Returns the labeled segments plus a degradation flag. On total
    /// capability failure every segment falls back to `Director` and the
    /// flag is set; transcription quality is never lost because
    /// diarization failed. A segment whose id is missing from an otherwise
    /// healthy response also defaults to `Director` (documented bias), but
    /// does not set the flag.
    pub async fn label(&self, segments: &[Segment]) -> (Vec<LabeledSegment>, bool) {
        if segments.is_empty() {
            return (Vec::new(), false);
        }

        let listing = segments
            .iter()
            .enumerate()
            .map(|(idx, s)| format!("[ID: {idx}] {}", s.text))
            .collect::<Vec<_>>()
            .join("\n");

        let user = format!(
            "[Utterances]\n{listing}\n\nOutput schema:\n{{\n  \"labels\": [\n    {{ \"id\": 0, \"speaker\": \"director\" | \"counterpart\" }}\n  ]\n}}"
        );

        let request = ChatRequest {
            system: SYSTEM_PROMPT.to_string(),
            user,
            // Pinned to zero for best-effort determinism.
            temperature: 0.0,
            max_tokens: None,
        };

        match self.chat.complete(request).await {
            Ok(raw) => {
                let response: LabelsResponse = serde_json::from_str(&raw).unwrap_or_default();
                let by_id: HashMap<usize, Role> = response
                    .labels
                    .into_iter()
                    .filter_map(|entry| parse_role(&entry.speaker).map(|r| (entry.id, r)))
                    .collect();

                let labeled = segments
                    .iter()
                    .enumerate()
                    .map(|(idx, s)| LabeledSegment {
                        speaker: by_id.get(&idx).copied().unwrap_or(Role::Director),
                        start: s.start,
                        end: s.end,
                        text: s.text.clone(),
                    })
                    .collect();
                (labeled, false)
            }
            Err(err) => {
                warn!(error = %err, "Speaker labeling failed, attributing all segments to director");
                let labeled = segments
                    .iter()
                    .map(|s| LabeledSegment {
                        speaker: Role::Director,
                        start: s.start,
                        end: s.end,
                        text: s.text.clone(),
                    })
                    .collect();
                (labeled, true)
            }
        }
    }
}

fn parse_role(raw: &str) -> Option<Role> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "director" => Some(Role::Director),
        "counterpart" => Some(Role::Counterpart),
        _ => None,
    }
}
