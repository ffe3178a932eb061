//! Named circuit breaker guarding outbound calls to a single collaborator.
//!
//! ```text
//! ┌────────┐  N failures   ┌──────┐  reset_timeout  ┌───────────┐
//! │ Closed ├──────────────►│ Open ├────────────────►│ Half-Open │
//! └────┬───┘               └──────┘                 └─────┬─────┘
//!      │                       ▲      trial failure       │
//!      │                       └──────────────────────────┤
//!      │◄─────────────────────────────────────────────────┘
//!                          trial success
//! ```
//!
//! Every call runs under `call_timeout`. A timeout, an operation error or a
//! dropped call future all count as a failure. Results that arrive after the
//! breaker has already changed state are ignored.

use std::{fmt, future::Future, sync::Arc, time::Duration};

use parking_lot::Mutex;
use thiserror::Error;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that trip a closed breaker.
    pub failure_threshold: u32,
    /// How long the breaker stays open before letting trial calls through.
    pub reset_timeout: Duration,
    /// Concurrent trial calls allowed while half-open.
    pub max_half_open_requests: u32,
    pub call_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 1,
            reset_timeout: Duration::from_secs(2),
            max_half_open_requests: 3,
            call_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half-open"),
        }
    }
}

#[derive(Debug, Error)]
pub enum BreakerError<E> {
    #[error("circuit breaker '{name}' is open, retry after {retry_after:?}")]
    Open { name: String, retry_after: Duration },
    #[error("call through circuit breaker '{name}' timed out after {timeout:?}")]
    Timeout { name: String, timeout: Duration },
    #[error(transparent)]
    Operation(E),
}

#[derive(Debug)]
struct Circuit {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    trials_in_flight: u32,
    /// Bumped on every state change so late results can be told apart.
    generation: u64,
}

impl Circuit {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            opened_at: None,
            trials_in_flight: 0,
            generation: 0,
        }
    }

    fn transition(&mut self, name: &str, to: CircuitState, reason: &'static str) {
        let from = self.state;
        self.state = to;
        self.generation += 1;
        self.trials_in_flight = 0;
        match to {
            CircuitState::Open => self.opened_at = Some(Instant::now()),
            CircuitState::Closed => {
                self.opened_at = None;
                self.consecutive_failures = 0;
            }
            CircuitState::HalfOpen => {}
        }

        tracing::warn!(
            breaker = name,
            from = %from,
            to = %to,
            "circuit breaker state transition: {reason}"
        );
    }

    /// Moves an open circuit to half-open once the reset timeout has elapsed.
    fn refresh(&mut self, name: &str, reset_timeout: Duration) {
        if self.state == CircuitState::Open
            && let Some(opened_at) = self.opened_at
            && opened_at.elapsed() >= reset_timeout
        {
            self.transition(name, CircuitState::HalfOpen, "allowing trial calls");
        }
    }
}

/// Breaker for one named collaborator. Clones share state.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    name: Arc<str>,
    config: CircuitBreakerConfig,
    circuit: Arc<Mutex<Circuit>>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<Arc<str>>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            circuit: Arc::new(Mutex::new(Circuit::new())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    pub fn state(&self) -> CircuitState {
        let mut circuit = self.circuit.lock();
        circuit.refresh(&self.name, self.config.reset_timeout);
        circuit.state
    }

    /// Runs `operation` if the breaker admits it.
    ///
    /// A rejected call never invokes `operation`.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let permit = self.acquire().map_err(|retry_after| BreakerError::Open {
            name: self.name.to_string(),
            retry_after,
        })?;

        match tokio::time::timeout(self.config.call_timeout, operation()).await {
            Ok(Ok(value)) => {
                permit.settle(true);
                Ok(value)
            }
            Ok(Err(e)) => {
                permit.settle(false);
                Err(BreakerError::Operation(e))
            }
            Err(_) => {
                permit.settle(false);
                Err(BreakerError::Timeout {
                    name: self.name.to_string(),
                    timeout: self.config.call_timeout,
                })
            }
        }
    }

    fn acquire(&self) -> Result<CallPermit<'_>, Duration> {
        let mut circuit = self.circuit.lock();
        circuit.refresh(&self.name, self.config.reset_timeout);

        match circuit.state {
            CircuitState::Closed => Ok(CallPermit::new(self, circuit.generation)),
            CircuitState::Open => {
                let retry_after = circuit
                    .opened_at
                    .map(|t| self.config.reset_timeout.saturating_sub(t.elapsed()))
                    .unwrap_or(self.config.reset_timeout);
                Err(retry_after)
            }
            CircuitState::HalfOpen => {
                if circuit.trials_in_flight >= self.config.max_half_open_requests {
                    return Err(Duration::ZERO);
                }
                circuit.trials_in_flight += 1;
                Ok(CallPermit::new(self, circuit.generation))
            }
        }
    }

    fn record(&self, generation: u64, success: bool) {
        let mut circuit = self.circuit.lock();
        if circuit.generation != generation {
            return;
        }

        match (circuit.state, success) {
            (CircuitState::Closed, true) => circuit.consecutive_failures = 0,
            (CircuitState::Closed, false) => {
                circuit.consecutive_failures += 1;
                if circuit.consecutive_failures >= self.config.failure_threshold {
                    circuit.transition(&self.name, CircuitState::Open, "collaborator unavailable");
                }
            }
            (CircuitState::HalfOpen, true) => {
                circuit.transition(&self.name, CircuitState::Closed, "recovery confirmed");
            }
            (CircuitState::HalfOpen, false) => {
                circuit.transition(&self.name, CircuitState::Open, "trial failed, reopening");
            }
            (CircuitState::Open, _) => {}
        }
    }
}

/// An admitted call. Dropping it unsettled counts as a failure.
struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    settled: bool,
}

impl<'a> CallPermit<'a> {
    fn new(breaker: &'a CircuitBreaker, generation: u64) -> Self {
        Self {
            breaker,
            generation,
            settled: false,
        }
    }

    fn settle(mut self, success: bool) {
        self.settled = true;
        self.breaker.record(self.generation, success);
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.breaker.record(self.generation, false);
        }
    }
}
