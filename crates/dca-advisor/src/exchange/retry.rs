//! Retry with Exponential Backoff
//!
//! The retry loop is a small state machine. `RetryPolicy::transition` is pure
//! and `RetryPolicy::run` is the only place that sleeps.
//!
//! ```text
//!  Attempting(n) ──ok──────────────▶ Success
//!       │ ──fatal─────────────────▶ Failed
//!       │ ──retryable, n+1 = max──▶ Failed
//!       └─retryable──▶ Backoff(n, min(2^n, max_wait)) ──elapsed──▶ Attempting(n+1)
//! ```

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::error::{AdvisorError, Result};

/// Retry ceiling and backoff cap
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one
    pub max_retries: u32,

    /// Upper bound for a single backoff wait
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 10,
            max_wait: Duration::from_secs(10),
        }
    }
}

/// States of a single fetch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryState {
    /// Attempt number `attempt` (0-based) is in flight
    Attempting { attempt: u32 },

    /// Attempt `attempt` failed and we wait before the next one
    Backoff { attempt: u32, wait: Duration },

    Success,
    Failed,
}

impl RetryState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

/// What happened to drive the machine forward
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryEvent {
    Succeeded,
    Retryable,
    Fatal,
    WaitElapsed,
}

impl RetryEvent {
    pub const fn from_error(err: &AdvisorError) -> Self {
        if err.is_retryable() {
            Self::Retryable
        } else {
            Self::Fatal
        }
    }
}

/// Result of a retried operation together with the waits it took
#[derive(Debug)]
pub struct Retried<T> {
    pub result: Result<T>,

    /// Number of attempts made
    pub attempts: u32,

    /// Backoff waits performed, in order
    pub waits: Vec<Duration>,
}

impl RetryPolicy {
    pub const fn new(max_retries: u32, max_wait: Duration) -> Self {
        Self {
            max_retries,
            max_wait,
        }
    }

    /// Wait before retrying after attempt `attempt`: `min(2^attempt, max_wait)` seconds
    pub fn backoff_duration(&self, attempt: u32) -> Duration {
        let secs = 2u64.checked_pow(attempt).unwrap_or(u64::MAX);
        Duration::from_secs(secs).min(self.max_wait)
    }

    pub const fn initial_state() -> RetryState {
        RetryState::Attempting { attempt: 0 }
    }

    /// Pure transition function of the retry state machine
    pub fn transition(&self, state: RetryState, event: RetryEvent) -> RetryState {
        match (state, event) {
            (RetryState::Attempting { .. }, RetryEvent::Succeeded) => RetryState::Success,
            (RetryState::Attempting { .. }, RetryEvent::Fatal) => RetryState::Failed,
            (RetryState::Attempting { attempt }, RetryEvent::Retryable) => {
                if attempt.saturating_add(1) >= self.max_retries {
                    RetryState::Failed
                } else {
                    RetryState::Backoff {
                        attempt,
                        wait: self.backoff_duration(attempt),
                    }
                }
            }
            (RetryState::Backoff { attempt, .. }, RetryEvent::WaitElapsed) => {
                RetryState::Attempting {
                    attempt: attempt + 1,
                }
            }
            (other, _) => other,
        }
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt ceiling is reached. `label` identifies the fetch in logs.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Retried<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut state = Self::initial_state();
        let mut attempts = 0;
        let mut waits = Vec::new();
        let mut last_error = None;

        while !state.is_terminal() {
            state = match state {
                RetryState::Attempting { attempt } => {
                    attempts += 1;
                    match op(attempt).await {
                        Ok(value) => {
                            return Retried {
                                result: Ok(value),
                                attempts,
                                waits,
                            };
                        }
                        Err(err) => {
                            let next = self.transition(state, RetryEvent::from_error(&err));
                            if let RetryState::Backoff { wait, .. } = next {
                                warn!(
                                    token = label,
                                    attempt = attempt + 1,
                                    wait_secs = wait.as_secs(),
                                    error = %err,
                                    "Attempt failed, backing off"
                                );
                            }
                            last_error = Some(err);
                            next
                        }
                    }
                }
                RetryState::Backoff { wait, .. } => {
                    tokio::time::sleep(wait).await;
                    waits.push(wait);
                    self.transition(state, RetryEvent::WaitElapsed)
                }
                terminal => terminal,
            };
        }

        let err = match last_error {
            Some(err) if err.is_retryable() => AdvisorError::RetriesExhausted {
                token: label.to_string(),
                attempts,
                last: Box::new(err),
            },
            Some(err) => err,
            None => AdvisorError::Config("retry policy allows no attempts".into()),
        };
        error!(token = label, attempts, error = %err, "Fetch failed");

        Retried {
            result: Err(err),
            attempts,
            waits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate_limited() -> AdvisorError {
        AdvisorError::RateLimited { token: "y".into() }
    }

    /// Feed attempt results through the pure machine and collect the waits
    fn replay(policy: &RetryPolicy, events: &[RetryEvent]) -> (RetryState, Vec<Duration>) {
        let mut state = RetryPolicy::initial_state();
        let mut waits = Vec::new();
        for &event in events {
            state = policy.transition(state, event);
            if let RetryState::Backoff { wait, .. } = state {
                waits.push(wait);
                state = policy.transition(state, RetryEvent::WaitElapsed);
            }
            if state.is_terminal() {
                break;
            }
        }
        (state, waits)
    }

    #[test]
    fn test_backoff_doubles_until_cap() {
        let policy = RetryPolicy::default();
        let waits: Vec<u64> = (0..6).map(|a| policy.backoff_duration(a).as_secs()).collect();
        assert_eq!(waits, vec![1, 2, 4, 8, 10, 10]);
        assert_eq!(policy.backoff_duration(200), Duration::from_secs(10));
    }

    #[test]
    fn test_rate_limited_three_times_then_success() {
        let policy = RetryPolicy::default();
        let (state, waits) = replay(
            &policy,
            &[
                RetryEvent::Retryable,
                RetryEvent::Retryable,
                RetryEvent::Retryable,
                RetryEvent::Succeeded,
            ],
        );

        assert_eq!(state, RetryState::Success);
        assert_eq!(
            waits,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4)
            ]
        );
    }

    #[test]
    fn test_fatal_error_fails_without_backoff() {
        let policy = RetryPolicy::default();
        let (state, waits) = replay(&policy, &[RetryEvent::Fatal]);
        assert_eq!(state, RetryState::Failed);
        assert!(waits.is_empty());
    }

    #[test]
    fn test_last_attempt_does_not_back_off() {
        let policy = RetryPolicy::new(3, Duration::from_secs(10));
        let (state, waits) = replay(&policy, &[RetryEvent::Retryable; 5]);
        assert_eq!(state, RetryState::Failed);
        assert_eq!(waits.len(), 2);
    }

    #[test]
    fn test_terminal_states_absorb_events() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.transition(RetryState::Success, RetryEvent::Retryable),
            RetryState::Success
        );
        assert_eq!(
            policy.transition(RetryState::Failed, RetryEvent::WaitElapsed),
            RetryState::Failed
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_recovers_after_rate_limits() {
        let policy = RetryPolicy::default();
        let started = tokio::time::Instant::now();

        let retried = policy
            .run("y", |attempt| async move {
                if attempt < 3 {
                    Err(rate_limited())
                } else {
                    Ok(attempt)
                }
            })
            .await;

        assert_eq!(retried.result.unwrap(), 3);
        assert_eq!(retried.attempts, 4);
        assert_eq!(
            retried.waits,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4)
            ]
        );
        assert!(started.elapsed() >= Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_exhausts_retries() {
        let policy = RetryPolicy::new(4, Duration::from_secs(10));

        let retried: Retried<()> = policy.run("y", |_| async { Err(rate_limited()) }).await;

        assert_eq!(retried.attempts, 4);
        assert_eq!(retried.waits.len(), 3);
        assert!(matches!(
            retried.result,
            Err(AdvisorError::RetriesExhausted { attempts: 4, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_non_retryable_status() {
        let policy = RetryPolicy::default();

        let retried: Retried<()> = policy
            .run("y", |_| async {
                Err(AdvisorError::HttpStatus {
                    token: "y".into(),
                    status: 404,
                })
            })
            .await;

        assert_eq!(retried.attempts, 1);
        assert!(retried.waits.is_empty());
        assert!(matches!(
            retried.result,
            Err(AdvisorError::HttpStatus { status: 404, .. })
        ));
    }
}
