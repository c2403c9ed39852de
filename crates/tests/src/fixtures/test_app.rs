use std::net::SocketAddr;

use coach_api::{build_router, state::AppState};
use coach_config::Settings;
use coach_db::indexes::ensure_indexes;
use mongodb::{Client, Database, options::ClientOptions};
use tokio::net::TcpListener;

/// A running test application with its own MongoDB database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub base_url: String,
    pub db: Database,
    pub settings: Settings,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Spawn a new test server connected to the test MongoDB.
    ///
    /// Requires a running MongoDB at localhost:27017.
    /// Set COACH__DATABASE__URL to override the connection string.
    /// Each test gets a unique database name for isolation.
    pub async fn spawn() -> Self {
        let db_name = format!("coach_test_{}", uuid::Uuid::new_v4().simple());

        let mut settings = Settings::load().unwrap_or_else(|_| test_settings());
        if let Ok(url) = std::env::var("COACH__DATABASE__URL") {
            settings.database.url = url;
        }
        settings.database.name = db_name.clone();
        // No real capability calls from integration tests.
        settings.openai.api_key = None;

        let client_options = ClientOptions::parse(&settings.database.url)
            .await
            .expect("Failed to parse MongoDB URL");
        let mongo_client =
            Client::with_options(client_options).expect("Failed to create MongoDB client");
        let db = mongo_client.database(&db_name);

        ensure_indexes(&db).await.expect("Failed to create indexes");

        let app_state = AppState::new(db.clone(), settings.clone());
        let app = build_router(app_state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let base_url = format!("http://{}", addr);
        let client = reqwest::Client::new();

        Self {
            addr,
            base_url,
            db,
            settings,
            client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let db = self.db.clone();
        // Best effort cleanup: drop the test database
        tokio::spawn(async move {
            let _ = db.drop().await;
        });
    }
}

fn test_settings() -> Settings {
    Settings {
        app: coach_config::AppSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec![],
        },
        database: coach_config::DatabaseSettings {
            url: "mongodb://localhost:27017".to_string(),
            name: "coach_test".to_string(),
            max_pool_size: Some(5),
            min_pool_size: Some(1),
        },
        storage: coach_config::StorageSettings {
            base_url: "http://localhost:9000".to_string(),
            bucket: "audio-sessions-test".to_string(),
        },
        openai: coach_config::OpenAiSettings {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            transcribe_model: "whisper-1".to_string(),
            chat_model: "gpt-4o".to_string(),
            analysis_temperature: 0.2,
            analysis_max_tokens: 4096,
            timeout_secs: 5,
            max_retries: 0,
            retry_base_delay_ms: 1,
        },
        analysis: coach_config::AnalysisSettings {
            min_dialogue_turns: 1,
            min_dialogue_chars: 20,
        },
    }
}
