use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub storage: StorageSettings,
    pub openai: OpenAiSettings,
    pub analysis: AnalysisSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub name: String,
    pub max_pool_size: Option<u32>,
    pub min_pool_size: Option<u32>,
}

/// Object storage holding the uploaded consultation recordings.
/// Upload itself happens elsewhere; we only ever download by key.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    pub base_url: String,
    pub bucket: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OpenAiSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub transcribe_model: String,
    pub chat_model: String,
    /// Nonzero so the prose fields read fluently; labeling always runs at 0.
    pub analysis_temperature: f32,
    pub analysis_max_tokens: u32,
    /// Per-call timeout. The analysis response is large, keep this generous.
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisSettings {
    /// Dialogues below either threshold short-circuit to an invalid report
    /// without spending a capability call.
    pub min_dialogue_turns: usize,
    pub min_dialogue_chars: usize,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::default()
                    .separator("__")
                    .prefix("COACH"),
            )
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 3000)?
            .set_default("app.cors_origins", Vec::<String>::new())?
            .set_default("database.url", "mongodb://localhost:27017")?
            .set_default("database.name", "coach")?
            .set_default("storage.base_url", "http://localhost:9000")?
            .set_default("storage.bucket", "audio-sessions")?
            .set_default("openai.base_url", "https://api.openai.com/v1")?
            .set_default("openai.transcribe_model", "whisper-1")?
            .set_default("openai.chat_model", "gpt-4o")?
            .set_default("openai.analysis_temperature", 0.2)?
            .set_default("openai.analysis_max_tokens", 4096)?
            .set_default("openai.timeout_secs", 180)?
            .set_default("openai.max_retries", 3)?
            .set_default("openai.retry_base_delay_ms", 500)?
            .set_default("analysis.min_dialogue_turns", 1)?
            .set_default("analysis.min_dialogue_chars", 20)?
            .build()?;

        config.try_deserialize()
    }
}
