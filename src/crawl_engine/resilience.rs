//! Resilience controller around every renderer call
//!
//! One policy object applies pacing, a hard timeout, bounded retries with
//! backoff, and the circuit breaker to any fetch operation. Callers hand in
//! a closure producing the operation future for a session reference, so the
//! controller can recycle the session between attempts.

use futures::future::BoxFuture;
use log::{error, warn};
use rand::Rng;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use super::circuit_breaker::CircuitBreaker;
use super::crawl_types::{CrawlError, CrawlResult, FailureKind, FetchError};
use super::page_timeout::with_operation_timeout;
use super::progress::ProgressReporter;
use super::rate_limiter::OperationPacer;
use crate::config::{BackoffStrategy, CrawlConfig};
use crate::renderer::{RendererFactory, RendererSession};

/// Retry schedule for one operation
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, first try included
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub strategy: BackoffStrategy,
    pub jitter: bool,
}

impl RetryPolicy {
    #[must_use]
    pub fn from_config(config: &CrawlConfig) -> Self {
        Self {
            max_attempts: config.max_retries(),
            base_delay: config.retry_base_delay(),
            max_delay: config.max_backoff(),
            strategy: config.backoff(),
            jitter: config.backoff_jitter(),
        }
    }

    /// Delay before the attempt following failed attempt number `attempt` (1-based)
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay.as_millis() as u64;
        let raw = match self.strategy {
            BackoffStrategy::Linear => base.saturating_mul(u64::from(attempt)),
            BackoffStrategy::Exponential => {
                base.saturating_mul(1u64 << attempt.saturating_sub(1).min(20))
            }
        };
        let capped = raw.min(self.max_delay.as_millis() as u64);
        let jitter = if self.jitter && capped >= 4 {
            rand::rng().random_range(0..=capped / 4)
        } else {
            0
        };
        Duration::from_millis(capped + jitter)
    }
}

pub struct ResilienceController {
    policy: RetryPolicy,
    timeout: Duration,
    launch_timeout: Duration,
    breaker: Arc<CircuitBreaker>,
    pacer: Arc<OperationPacer>,
    progress: Arc<dyn ProgressReporter>,
    recycles: AtomicU32,
}

impl ResilienceController {
    pub fn new(
        policy: RetryPolicy,
        timeout: Duration,
        launch_timeout: Duration,
        breaker: Arc<CircuitBreaker>,
        pacer: Arc<OperationPacer>,
        progress: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            policy,
            timeout,
            launch_timeout,
            breaker,
            pacer,
            progress,
            recycles: AtomicU32::new(0),
        }
    }

    pub fn from_config(config: &CrawlConfig, progress: Arc<dyn ProgressReporter>) -> Self {
        Self::new(
            RetryPolicy::from_config(config),
            config.operation_timeout(),
            config.launch_timeout(),
            Arc::new(CircuitBreaker::new(
                config.circuit_threshold(),
                config.cooldown(),
            )),
            Arc::new(OperationPacer::new(config.rate_limit())),
            progress,
        )
    }

    #[must_use]
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Session recycles performed so far, by trip or by fatal error
    #[must_use]
    pub fn recycles(&self) -> u32 {
        self.recycles.load(Ordering::Acquire)
    }

    /// Create a session, giving up after the launch timeout
    ///
    /// # Errors
    ///
    /// The factory's error, or `Timeout` when creation hangs.
    pub async fn open_session<F: RendererFactory>(
        &self,
        factory: &F,
    ) -> Result<F::Session, FetchError> {
        with_operation_timeout(factory.create_session(), self.launch_timeout).await
    }

    /// Run `op` against `session` under the full resilience policy.
    ///
    /// - Transient failures and timeouts are retried up to the attempt budget
    ///   with backoff. Exhaustion feeds the circuit breaker, and a trip
    ///   recycles the session and sleeps the cooldown.
    /// - Structural failures return at once without retry.
    /// - Fatal failures recycle the session at once and escalate.
    ///
    /// # Errors
    ///
    /// `RetriesExhausted`, `Structural` or `Fatal` as described above.
    pub async fn with_resilience<S, T, F>(
        &self,
        session: &mut S,
        category_id: &str,
        mut op: F,
    ) -> CrawlResult<T>
    where
        S: RendererSession,
        F: FnMut(&S) -> BoxFuture<'_, Result<T, FetchError>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            self.pacer.pace().await;

            let err = match with_operation_timeout(op(&*session), self.timeout).await {
                Ok(value) => {
                    self.breaker.record_success(category_id);
                    return Ok(value);
                }
                Err(err) => err,
            };

            match err.kind() {
                FailureKind::Structural => {
                    return Err(CrawlError::Structural(err.to_string()));
                }
                FailureKind::Fatal => {
                    error!("Fatal renderer error in {category_id}: {err}; recycling session");
                    self.recycle(session, "fatal renderer error").await;
                    self.breaker.reset();
                    return Err(CrawlError::Fatal(err.to_string()));
                }
                FailureKind::Transient if attempt >= self.policy.max_attempts => {
                    warn!(
                        "Operation for {category_id} failed after {attempt} attempts: {err}"
                    );
                    if self.breaker.record_exhausted(category_id) {
                        self.recycle(session, "circuit breaker tripped").await;
                        let cooldown = self.breaker.cooldown();
                        warn!("Cooling down for {cooldown:?} after session recycle");
                        tokio::time::sleep(cooldown).await;
                    }
                    return Err(CrawlError::RetriesExhausted {
                        attempts: attempt,
                        last_error: err,
                    });
                }
                FailureKind::Transient => {
                    let delay = self.policy.backoff_delay(attempt);
                    warn!(
                        "Retryable error for {category_id}, attempt {attempt}/{}, retrying in {}ms: {err}",
                        self.policy.max_attempts,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn recycle<S: RendererSession>(&self, session: &mut S, reason: &str) {
        self.recycles.fetch_add(1, Ordering::AcqRel);
        self.progress.report_session_recycled(reason);
        if let Err(e) = with_operation_timeout(session.recycle(), self.launch_timeout).await {
            error!("Renderer session recycle failed ({reason}): {e}");
        }
    }
}
