//! Tower middleware realising the execution pipeline.
//!
//! One execution runs through this stack, outermost first:
//!
//! 1. [`Gate`] - asks the [`ProtectionGate`](crate::ProtectionGate); a denied
//!    call fails with `CallNotPermitted` and never reaches the transport.
//! 2. [`Deadline`] - bounds the whole attempt sequence.
//! 3. [`tower::retry::Retry`] driven by [`AttemptPolicy`] - immediate retries
//!    up to the spec's budget.
//! 4. [`Logging`] - one log line per attempt start, success and failure.
//! 5. The transport service.
//!
//! [`CircuitBreaker`] is the built-in fixed-threshold gate.

mod circuit_breaker;
mod deadline;
mod gate;
mod logging;
mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use deadline::{Deadline, DeadlineLayer};
pub use gate::{Gate, GateLayer};
pub use logging::{Logging, LoggingLayer};
pub use retry::AttemptPolicy;

// Re-export tower types for convenience
pub use tower::retry::{Retry, RetryLayer};
pub use tower::{Layer, ServiceBuilder};

/// The full attempt stack around a transport service `S`.
pub type AttemptStack<S> = Gate<Deadline<Retry<AttemptPolicy, Logging<S>>>>;
