use thiserror::Error;

use crate::dao::base::DaoError;

/// Failure taxonomy of the analysis pipeline.
///
/// Configuration problems are fatal and never retried; engine errors are
/// transient and eligible for bounded backoff at the adapter. Input that is
/// merely too thin to analyze is not an error at all; the analyzer returns
/// an invalid report instead.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("{0} is not configured")]
    Unconfigured(&'static str),
    #[error("transcription engine error: {0}")]
    TranscriptionEngine(String),
    #[error("analysis engine error: {0}")]
    AnalysisEngine(String),
    #[error("no stored transcript to re-analyze; run a full analysis first")]
    NoTranscript,
    #[error("audio storage error: {0}")]
    Storage(String),
    #[error(transparent)]
    Dao(#[from] DaoError),
}

impl AiError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AiError::TranscriptionEngine(_) | AiError::AnalysisEngine(_)
        )
    }
}
