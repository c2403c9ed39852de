use std::sync::Arc;

use coach_config::Settings;
use coach_services::{
    AnalysisPipeline, ConversationAnalyzer, SpeakerLabeler,
    ai::{OpenAiChatClient, RetryPolicy, WhisperTranscriber},
    dao::{CompanyProfileDao, ProfileDao, SessionDao},
    storage::HttpAudioStore,
};
use mongodb::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub settings: Settings,
    pub sessions: Arc<SessionDao>,
    pub profiles: Arc<ProfileDao>,
    pub companies: Arc<CompanyProfileDao>,
    pub pipeline: Arc<AnalysisPipeline>,
}

impl AppState {
    pub fn new(db: Database, settings: Settings) -> Self {
        let retry = RetryPolicy::from_settings(&settings.openai);
        let chat = Arc::new(OpenAiChatClient::new(settings.openai.clone(), retry));
        let stt = Arc::new(WhisperTranscriber::new(settings.openai.clone(), retry));
        let audio = Arc::new(HttpAudioStore::new(settings.storage.clone()));

        let sessions = Arc::new(SessionDao::new(&db));
        let profiles = Arc::new(ProfileDao::new(&db));
        let companies = Arc::new(CompanyProfileDao::new(&db));

        let labeler = SpeakerLabeler::new(chat.clone());
        let analyzer = ConversationAnalyzer::new(
            chat,
            settings.analysis.clone(),
            settings.openai.analysis_temperature,
            settings.openai.analysis_max_tokens,
            Arc::new(coach_services::ai::analyzer::TracingSink),
        );

        let pipeline = Arc::new(AnalysisPipeline::new(
            stt,
            labeler,
            analyzer,
            audio,
            sessions.clone(),
            profiles.clone(),
            companies.clone(),
        ));

        Self {
            db,
            settings,
            sessions,
            profiles,
            companies,
            pipeline,
        }
    }
}
