//! Generation service: the provider client wrapped with bounded retries,
//! per-request timeouts and request pacing.

use crate::error::PipelineError;
use crate::provider::{ChatMessage, CompletionOptions, ModelProviderClient};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, warn};

/// Bounded linear backoff: attempt `n` (1-based) waits `n * step` before the
/// next try.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub max_attempts: usize,
    pub step: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            step: Duration::from_secs(1),
        }
    }
}

impl BackoffPolicy {
    pub fn new(max_attempts: usize, step: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            step,
        }
    }

    /// Delay after the failed attempt `attempt`.
    pub fn delay_after(&self, attempt: usize) -> Duration {
        self.step.saturating_mul(attempt as u32)
    }
}

/// Text-in/text-out generation collaborator used by the orchestrator
pub struct GenerationService {
    client: Arc<dyn ModelProviderClient>,
    policy: BackoffPolicy,
    request_timeout: Duration,
    pacing: Duration,
    options: CompletionOptions,
    last_request: Mutex<Option<Instant>>,
}

impl GenerationService {
    pub fn new(client: Arc<dyn ModelProviderClient>) -> Self {
        Self {
            client,
            policy: BackoffPolicy::default(),
            request_timeout: Duration::from_secs(240),
            pacing: Duration::from_millis(600),
            options: CompletionOptions::default(),
            last_request: Mutex::new(None),
        }
    }

    pub fn with_policy(mut self, policy: BackoffPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }

    /// Identity recorded in cache keys: the model name.
    pub fn generator_id(&self) -> &str {
        self.client.model_name()
    }

    pub fn provider_name(&self) -> &str {
        self.client.provider_name()
    }

    pub fn client(&self) -> &Arc<dyn ModelProviderClient> {
        &self.client
    }

    /// Generate text for a system and user prompt.
    ///
    /// Transient failures (transport errors, timeouts, empty responses) are
    /// retried up to `max_attempts`; authentication and missing-model errors
    /// stop at the current attempt. Either way the failure is
    /// [`PipelineError::GenerationUnavailable`].
    pub async fn generate(&self, system: &str, user: &str) -> Result<String, PipelineError> {
        let mut last_error = String::new();

        for attempt in 1..=self.policy.max_attempts {
            self.pace().await;

            let messages = vec![ChatMessage::system(system), ChatMessage::user(user)];
            let result = match timeout(
                self.request_timeout,
                self.client.complete(messages, self.options.clone()),
            )
            .await
            {
                Ok(Ok(response)) if response.content.trim().is_empty() => {
                    Err(PipelineError::EmptyResponse)
                }
                Ok(Ok(response)) => Ok(response.content),
                Ok(Err(err)) => Err(err),
                Err(_) => Err(PipelineError::ProviderTimeout(self.request_timeout)),
            };

            match result {
                Ok(text) => {
                    debug!(
                        provider = self.client.provider_name(),
                        model = self.client.model_name(),
                        attempt,
                        chars = text.len(),
                        "Generation succeeded"
                    );
                    return Ok(text);
                }
                Err(err) if !err.is_retryable() => {
                    warn!(
                        provider = self.client.provider_name(),
                        attempt,
                        error = %err,
                        "Generation failed with non-retryable error"
                    );
                    return Err(PipelineError::GenerationUnavailable {
                        attempts: attempt,
                        last_error: err.to_string(),
                    });
                }
                Err(err) => {
                    warn!(
                        provider = self.client.provider_name(),
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        error = %err,
                        "Generation attempt failed"
                    );
                    last_error = err.to_string();
                    if attempt < self.policy.max_attempts {
                        sleep(self.policy.delay_after(attempt)).await;
                    }
                }
            }
        }

        Err(PipelineError::GenerationUnavailable {
            attempts: self.policy.max_attempts,
            last_error,
        })
    }

    /// Hold successive requests at least `pacing` apart.
    async fn pace(&self) {
        let wait = {
            let mut last = self.last_request.lock();
            let now = Instant::now();
            let start = match *last {
                Some(previous) => (previous + self.pacing).max(now),
                None => now,
            };
            *last = Some(start);
            start - now
        };
        if !wait.is_zero() {
            sleep(wait).await;
        }
    }
}
