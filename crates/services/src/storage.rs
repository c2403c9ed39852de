use async_trait::async_trait;
use coach_config::StorageSettings;

use crate::ai::error::AiError;

/// Seam over the object store holding uploaded recordings. Upload lives
/// elsewhere; the pipeline only ever downloads by key.
#[async_trait]
pub trait AudioStore: Send + Sync {
    async fn fetch(&self, key: &str) -> Result<Vec<u8>, AiError>;
}

pub struct HttpAudioStore {
    client: reqwest::Client,
    settings: StorageSettings,
}

impl HttpAudioStore {
    pub fn new(settings: StorageSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
        }
    }
}

#[async_trait]
impl AudioStore for HttpAudioStore {
    async fn fetch(&self, key: &str) -> Result<Vec<u8>, AiError> {
        let url = format!(
            "{}/{}/{}",
            self.settings.base_url, self.settings.bucket, key
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AiError::Storage(format!("download failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AiError::Storage(format!(
                "download of {key} returned {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AiError::Storage(format!("download body failed: {e}")))?;
        Ok(bytes.to_vec())
    }
}
