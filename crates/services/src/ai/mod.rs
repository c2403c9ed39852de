pub mod analyzer;
pub mod chat;
pub mod error;
pub mod labeler;
pub mod merger;
pub mod pipeline;
pub mod retry;
pub mod transcribe;

pub use chat::{ChatCompletion, ChatRequest, OpenAiChatClient};
pub use error::AiError;
pub use retry::RetryPolicy;
pub use transcribe::{SpeechToText, Transcription, WhisperTranscriber};
