//! Bounded, linearly backed-off retries around a [`Transport`].
//!
//! # Design
//! One `execute` call walks the state machine
//! `Idle -> Sending -> {Succeeded | Retrying -> Sending | Exhausted | Failed}`.
//! Only `ConnectionLost` moves to `Retrying`; every other transport failure and
//! every non-2xx status is terminal on the attempt that produced it. The
//! executor holds no per-call state, so one value can serve concurrent calls.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::TransportConfig;
use crate::decode;
use crate::error::{ApiError, TransportError};
use crate::http::{CallDescriptor, HttpResponse, Operation};
use crate::transport::Transport;

/// Attempt budget and backoff unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_unit: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_unit: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_unit,
        }
    }

    /// Delay slept after failed attempt `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_unit.saturating_mul(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&TransportConfig::default())
    }
}

impl From<&TransportConfig> for RetryPolicy {
    fn from(config: &TransportConfig) -> Self {
        Self::new(config.max_attempts, config.backoff_unit)
    }
}

/// How a single attempt ended.
#[derive(Debug)]
pub enum Outcome {
    Success(HttpResponse),
    RetryableFailure(TransportError),
    FatalFailure(ApiError),
}

impl Outcome {
    fn classify(result: Result<HttpResponse, TransportError>) -> Self {
        match result {
            Ok(response) => match decode::check_status(&response) {
                Ok(()) => Outcome::Success(response),
                Err(err) => Outcome::FatalFailure(err),
            },
            Err(err) if err.is_retryable() => Outcome::RetryableFailure(err),
            Err(err) => Outcome::FatalFailure(err.into()),
        }
    }
}

/// Summary of an attempt's outcome, as reported to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptResult {
    Succeeded { status: u16 },
    Retryable { cause: String },
    Fatal { error: String },
}

/// One finished attempt.
#[derive(Debug, Clone)]
pub struct AttemptEvent {
    pub operation: Operation,
    pub attempt: u32,
    pub max_attempts: u32,
    pub started_at: Instant,
    pub elapsed: Duration,
    pub result: AttemptResult,
}

/// Receives one event per attempt.
pub trait AttemptObserver: Send + Sync {
    fn on_attempt(&self, event: &AttemptEvent);

    fn on_backoff(&self, _operation: Operation, _attempt: u32, _delay: Duration) {}
}

/// Default observer: turns attempt events into `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl AttemptObserver for TracingObserver {
    fn on_attempt(&self, event: &AttemptEvent) {
        let operation = event.operation.name();
        match &event.result {
            AttemptResult::Succeeded { status } => debug!(
                operation,
                attempt = event.attempt,
                max_attempts = event.max_attempts,
                status,
                elapsed_ms = event.elapsed.as_millis() as u64,
                "request succeeded"
            ),
            AttemptResult::Retryable { cause } => warn!(
                operation,
                attempt = event.attempt,
                max_attempts = event.max_attempts,
                %cause,
                "connection lost"
            ),
            AttemptResult::Fatal { error } => warn!(
                operation,
                attempt = event.attempt,
                max_attempts = event.max_attempts,
                %error,
                "request failed"
            ),
        }
    }

    fn on_backoff(&self, operation: Operation, attempt: u32, delay: Duration) {
        info!(
            operation = operation.name(),
            attempt,
            delay_ms = delay.as_millis() as u64,
            "backing off before retry"
        );
    }
}

enum State {
    Idle,
    Sending { attempt: u32 },
    Retrying { attempt: u32 },
    Succeeded(HttpResponse),
    Exhausted { attempts: u32, cause: TransportError },
    Failed(ApiError),
}

/// Sends descriptors through a transport with bounded retries.
#[derive(Clone)]
pub struct Executor {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    observer: Arc<dyn AttemptObserver>,
}

impl Executor {
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn AttemptObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Run `call` to a terminal state. `cancel` interrupts both the send and
    /// the backoff sleep.
    pub async fn execute(
        &self,
        call: &CallDescriptor,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, ApiError> {
        let max_attempts = self.policy.max_attempts;
        let mut state = State::Idle;

        loop {
            state = match state {
                State::Idle => State::Sending { attempt: 1 },
                State::Sending { attempt } => {
                    let started_at = Instant::now();
                    let sent = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(ApiError::Cancelled),
                        result = self.transport.send(call) => result,
                    };
                    let outcome = Outcome::classify(sent);
                    self.report(call.operation, attempt, started_at, &outcome);

                    match outcome {
                        Outcome::Success(response) => State::Succeeded(response),
                        Outcome::RetryableFailure(_) if attempt < max_attempts => {
                            State::Retrying { attempt }
                        }
                        Outcome::RetryableFailure(cause) => State::Exhausted {
                            attempts: attempt,
                            cause,
                        },
                        Outcome::FatalFailure(err) => State::Failed(err),
                    }
                }
                State::Retrying { attempt } => {
                    let delay = self.policy.backoff(attempt);
                    self.observer.on_backoff(call.operation, attempt, delay);
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(ApiError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                    State::Sending {
                        attempt: attempt + 1,
                    }
                }
                State::Succeeded(response) => return Ok(response),
                State::Exhausted { attempts, cause } => {
                    return Err(ApiError::NetworkExhausted { attempts, cause })
                }
                State::Failed(err) => return Err(err),
            };
        }
    }

    fn report(&self, operation: Operation, attempt: u32, started_at: Instant, outcome: &Outcome) {
        let result = match outcome {
            Outcome::Success(response) => AttemptResult::Succeeded {
                status: response.status,
            },
            Outcome::RetryableFailure(cause) => AttemptResult::Retryable {
                cause: cause.to_string(),
            },
            Outcome::FatalFailure(err) => AttemptResult::Fatal {
                error: err.to_string(),
            },
        };
        self.observer.on_attempt(&AttemptEvent {
            operation,
            attempt,
            max_attempts: self.policy.max_attempts,
            started_at,
            elapsed: started_at.elapsed(),
            result,
        });
    }
}
