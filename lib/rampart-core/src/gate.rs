//! Protection gate contract.

use std::sync::Arc;

use crate::Error;

/// Circuit-breaker-like collaborator wrapped around one attempt sequence.
///
/// The pipeline asks [`try_acquire`](Self::try_acquire) once per execution.
/// When it returns `false` the call is rejected with
/// [`Error::CallNotPermitted`] without reaching the transport. Otherwise the
/// outcome of the whole attempt sequence, retries included, is reported back
/// through [`on_success`](Self::on_success) or [`on_failure`](Self::on_failure).
///
/// Implementations are shared by every execution in flight and must be safe
/// for concurrent use.
pub trait ProtectionGate: Send + Sync {
    /// Returns `true` if the call may proceed.
    fn try_acquire(&self) -> bool;

    /// Record a successful attempt sequence.
    fn on_success(&self);

    /// Record a failed attempt sequence.
    fn on_failure(&self, error: &Error);
}

impl<G: ProtectionGate + ?Sized> ProtectionGate for Arc<G> {
    fn try_acquire(&self) -> bool {
        (**self).try_acquire()
    }

    fn on_success(&self) {
        (**self).on_success();
    }

    fn on_failure(&self, error: &Error) {
        (**self).on_failure(error);
    }
}

/// Gate that always lets calls through and records nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProtection;

impl ProtectionGate for NoProtection {
    fn try_acquire(&self) -> bool {
        true
    }

    fn on_success(&self) {}

    fn on_failure(&self, _error: &Error) {}
}
