use std::time::Duration;

use async_trait::async_trait;
use coach_config::OpenAiSettings;
use coach_db::models::Segment;
use reqwest::multipart;
use serde::Deserialize;

use super::error::AiError;
use super::retry::RetryPolicy;

/// Output of the speech-to-text capability. `raw` keeps the verbatim engine
/// payload so the session record can store it for fast re-analysis.
#[derive(Debug, Clone)]
pub struct Transcription {
    pub segments: Vec<Segment>,
    pub duration_sec: f64,
    pub raw: serde_json::Value,
}

#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(&self, audio: Vec<u8>, file_name: &str) -> Result<Transcription, AiError>;
}

#[derive(Debug, Deserialize, Default)]
struct VerboseTranscription {
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    segments: Vec<Segment>,
}

/// Whisper-style transcription over an OpenAI-compatible HTTP endpoint.
pub struct WhisperTranscriber {
    client: reqwest::Client,
    settings: OpenAiSettings,
    retry: RetryPolicy,
}

impl WhisperTranscriber {
    pub fn new(settings: OpenAiSettings, retry: RetryPolicy) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            client,
            settings,
            retry,
        }
    }

    async fn transcribe_once(
        &self,
        api_key: &str,
        audio: &[u8],
        file_name: &str,
    ) -> Result<Transcription, AiError> {
        let part = multipart::Part::bytes(audio.to_vec())
            .file_name(file_name.to_string())
            .mime_str(mime_hint(file_name))
            .map_err(|e| AiError::TranscriptionEngine(format!("invalid mime hint: {e}")))?;

        let form = multipart::Form::new()
            .part("file", part)
            .text("model", self.settings.transcribe_model.clone())
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "segment");

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.settings.base_url))
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AiError::TranscriptionEngine(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(AiError::TranscriptionEngine(format!(
                "upstream returned {status}: {detail}"
            )));
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AiError::TranscriptionEngine(format!("invalid response body: {e}")))?;

        // Zero segments is not an error; downstream yields an invalid report.
        let verbose: VerboseTranscription =
            serde_json::from_value(raw.clone()).unwrap_or_default();

        Ok(Transcription {
            segments: verbose.segments,
            duration_sec: verbose.duration,
            raw,
        })
    }
}

#[async_trait]
impl SpeechToText for WhisperTranscriber {
    async fn transcribe(&self, audio: Vec<u8>, file_name: &str) -> Result<Transcription, AiError> {
        let api_key = self
            .settings
            .api_key
            .clone()
            .ok_or(AiError::Unconfigured("openai.api_key"))?;

        self.retry
            .run("transcription", || {
                self.transcribe_once(&api_key, &audio, file_name)
            })
            .await
    }
}

fn mime_hint(file_name: &str) -> &'static str {
    match file_name.rsplit('.').next() {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("m4a") => "audio/mp4",
        Some("ogg") => "audio/ogg",
        _ => "audio/webm",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_hint_follows_extension() {
        assert_eq!(mime_hint("audio.mp3"), "audio/mpeg");
        assert_eq!(mime_hint("audio.webm"), "audio/webm");
        assert_eq!(mime_hint("noext"), "audio/webm");
    }

    #[test]
    fn verbose_payload_parses_segments() {
        let raw = serde_json::json!({
            "duration": 8.2,
            "segments": [
                { "start": 0.0, "end": 2.0, "text": "hello" },
                { "start": 2.0, "end": 5.0, "text": "there" },
            ],
            "text": "hello there",
        });
        let verbose: VerboseTranscription = serde_json::from_value(raw).unwrap();
        assert_eq!(verbose.segments.len(), 2);
        assert_eq!(verbose.duration, 8.2);
    }
}
