use std::future::Future;
use std::time::Duration;

use coach_config::OpenAiSettings;
use rand::Rng;
use tracing::warn;

use super::error::AiError;

/// Explicit retry/backoff policy passed into each capability adapter.
/// Only errors classified retryable are re-attempted; configuration
/// errors surface on the first try.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_settings(settings: &OpenAiSettings) -> Self {
        Self {
            // max_retries counts re-attempts after the first call
            max_attempts: settings.max_retries + 1,
            base_delay: Duration::from_millis(settings.retry_base_delay_ms),
            max_delay: Duration::from_secs(30),
        }
    }

    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, AiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AiError>>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Capability call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
            .min(self.max_delay);
        if exp.is_zero() {
            return exp;
        }
        // Full jitter keeps concurrent sessions from thundering together.
        let jitter_ms = rand::rng().random_range(0..=exp.as_millis() as u64 / 2);
        exp + Duration::from_millis(jitter_ms)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn instant_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn retries_transient_errors_up_to_bound() {
        let calls = AtomicU32::new(0);
        let result: Result<(), AiError> = instant_policy(3)
            .run("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(AiError::AnalysisEngine("boom".into())) }
            })
            .await;

        assert!(matches!(result, Err(AiError::AnalysisEngine(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn succeeds_after_transient_failure() {
        let calls = AtomicU32::new(0);
        let result = instant_policy(3)
            .run("test", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(AiError::TranscriptionEngine("flaky".into()))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn configuration_errors_are_never_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), AiError> = instant_policy(5)
            .run("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(AiError::Unconfigured("openai.api_key")) }
            })
            .await;

        assert!(matches!(result, Err(AiError::Unconfigured(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
