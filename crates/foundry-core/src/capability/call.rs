use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::error::CapabilityError;

/// How many times a transient failure may be attempted, and the pause between
/// attempts. The default is a single attempt: no retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// Per-call bounds handed to every external capability.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Deadline for a single attempt. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    pub retry: RetryPolicy,
    pub cancel: CancellationToken,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Run one attempt of `call`, giving up at the deadline or on cancellation.
pub async fn guarded<T, F>(options: &CallOptions, call: F) -> Result<T, CapabilityError>
where
    F: Future<Output = Result<T, CapabilityError>>,
{
    if options.cancel.is_cancelled() {
        return Err(CapabilityError::Cancelled);
    }

    let bounded = async {
        match options.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| CapabilityError::Timeout(limit))?,
            None => call.await,
        }
    };

    tokio::select! {
        biased;
        _ = options.cancel.cancelled() => Err(CapabilityError::Cancelled),
        result = bounded => result,
    }
}

/// Run `op` under [`guarded`], re-attempting transient failures as the retry
/// policy allows.
pub async fn with_retry<T, F, Fut>(options: &CallOptions, mut op: F) -> Result<T, CapabilityError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CapabilityError>>,
{
    let max_attempts = options.retry.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match guarded(options, op()).await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_attempts && err.is_transient() => {
                tracing::warn!(attempt, max_attempts, error = %err, "Transient failure, retrying");
                attempt += 1;
                tokio::select! {
                    biased;
                    _ = options.cancel.cancelled() => return Err(CapabilityError::Cancelled),
                    _ = tokio::time::sleep(options.retry.backoff) => {}
                }
            }
            Err(err) => return Err(err),
        }
    }
}
