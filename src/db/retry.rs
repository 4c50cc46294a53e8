use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::constants::{DEFAULT_BACKOFF_BASE, DEFAULT_RETRY_ATTEMPTS, MAX_BACKOFF};
use crate::error::{PgShiftError, Result};
use crate::error_handler::ErrorHandler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Backoff base used when the error handler suggests no delay
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RETRY_ATTEMPTS,
            base_delay: DEFAULT_BACKOFF_BASE,
            max_delay: MAX_BACKOFF,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Exponential backoff after the given (1-based) failed attempt
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Run `f` until it succeeds, the error is not retryable, attempts run out
/// or `cancel` fires.
pub async fn retry_with_policy<T, F, Fut>(
    operation: &str,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut f: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        if cancel.is_cancelled() {
            return Err(PgShiftError::Cancelled);
        }

        debug!(operation, attempt, max_attempts = policy.max_attempts, "Attempting");
        let err = match f().await {
            Ok(value) => {
                if attempt > 1 {
                    info!("{} succeeded after {} attempts", operation, attempt);
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        let classification = ErrorHandler::handle(operation, &err);
        if !classification.retryable || attempt >= policy.max_attempts {
            return Err(err);
        }

        let delay = classification
            .delay
            .unwrap_or_else(|| policy.backoff(attempt));
        warn!(
            correlation_id = %classification.correlation_id,
            operation,
            "Retry {}/{} in {:?}",
            attempt,
            policy.max_attempts - 1,
            delay
        );

        tokio::select! {
            _ = cancel.cancelled() => return Err(PgShiftError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }
        attempt += 1;
    }
}
