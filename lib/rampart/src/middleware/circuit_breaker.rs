//! Fixed-threshold circuit breaker.
//!
//! A minimal [`ProtectionGate`]: it opens after a run of consecutive failures,
//! rejects everything while open, and lets calls probe the downstream once the
//! open duration has elapsed.

use std::sync::atomic::{AtomicU8, AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::{Error, ProtectionGate};

/// Circuit breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls flow normally.
    Closed,
    /// Calls are rejected without reaching the transport.
    Open,
    /// Calls are let through to probe the downstream.
    HalfOpen,
}

impl CircuitState {
    const fn as_u8(self) -> u8 {
        match self {
            Self::Closed => 0,
            Self::Open => 1,
            Self::HalfOpen => 2,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Open,
            2 => Self::HalfOpen,
            _ => Self::Closed,
        }
    }
}

/// Configuration for the circuit breaker.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,
    /// How long the circuit stays open before probing.
    pub open_duration: Duration,
    /// Consecutive half-open successes that close the circuit.
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_duration: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

impl CircuitBreakerConfig {
    /// Set the failure threshold.
    #[must_use]
    pub const fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Set the open duration.
    #[must_use]
    pub const fn with_open_duration(mut self, duration: Duration) -> Self {
        self.open_duration = duration;
        self
    }

    /// Set the success threshold.
    #[must_use]
    pub const fn with_success_threshold(mut self, threshold: u32) -> Self {
        self.success_threshold = threshold;
        self
    }
}

/// Lock-free circuit breaker shared by every execution of a client.
///
/// Client errors (4xx) are the caller's fault and do not count as failures.
/// Neither do failures raised before the downstream was reached, such as an
/// invalid request.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use rampart::middleware::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
///
/// let breaker = CircuitBreaker::new(
///     CircuitBreakerConfig::default()
///         .with_failure_threshold(3)
///         .with_open_duration(Duration::from_secs(10)),
/// );
/// assert_eq!(breaker.state(), CircuitState::Closed);
/// ```
#[derive(Debug)]
pub struct CircuitBreaker {
    state: AtomicU8,
    failure_count: AtomicU32,
    success_count: AtomicU32,
    /// Millis since `epoch` when the circuit last opened.
    opened_at: AtomicU64,
    epoch: Instant,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    /// Closed breaker with the given configuration.
    #[must_use]
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            state: AtomicU8::new(CircuitState::Closed.as_u8()),
            failure_count: AtomicU32::new(0),
            success_count: AtomicU32::new(0),
            opened_at: AtomicU64::new(0),
            epoch: Instant::now(),
            config,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> CircuitState {
        CircuitState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Breaker configuration.
    #[must_use]
    pub const fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    fn now_millis(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn set_state(&self, state: CircuitState) {
        self.state.store(state.as_u8(), Ordering::SeqCst);
    }

    fn open(&self) {
        self.set_state(CircuitState::Open);
        self.opened_at.store(self.now_millis(), Ordering::SeqCst);
        warn!(
            open_ms = u64::try_from(self.config.open_duration.as_millis()).unwrap_or(u64::MAX),
            "circuit breaker opened"
        );
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

impl ProtectionGate for CircuitBreaker {
    fn try_acquire(&self) -> bool {
        match self.state() {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let opened_at = self.opened_at.load(Ordering::SeqCst);
                let elapsed = Duration::from_millis(self.now_millis().saturating_sub(opened_at));
                if elapsed < self.config.open_duration {
                    return false;
                }
                self.success_count.store(0, Ordering::SeqCst);
                self.set_state(CircuitState::HalfOpen);
                info!("circuit breaker half-open, probing downstream");
                true
            }
        }
    }

    fn on_success(&self) {
        match self.state() {
            CircuitState::Closed => self.failure_count.store(0, Ordering::SeqCst),
            CircuitState::HalfOpen => {
                let count = self.success_count.fetch_add(1, Ordering::SeqCst) + 1;
                if count >= self.config.success_threshold {
                    self.failure_count.store(0, Ordering::SeqCst);
                    self.set_state(CircuitState::Closed);
                    info!("circuit breaker closed");
                }
            }
            CircuitState::Open => {}
        }
    }

    fn on_failure(&self, error: &Error) {
        // Only failures that say something about the downstream count.
        if !error.is_retryable() || error.is_client_error() {
            return;
        }
        match self.state() {
            CircuitState::Closed => {
                let count = self.failure_count.fetch_add(1, Ordering::SeqCst) + 1;
                if count >= self.config.failure_threshold {
                    self.open();
                }
            }
            CircuitState::HalfOpen => self.open(),
            CircuitState::Open => {}
        }
    }
}
