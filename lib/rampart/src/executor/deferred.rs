//! Deferred execution on the ambient tokio runtime.

use std::fmt;
use std::future::Future;
use std::panic;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};

use serde::de::DeserializeOwned;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::{
    ClientError, Codec, Error, ErrorMapper, ExecutionPipeline, FailureDescription, HttpClient, Json,
    ProtectionGate, RequestSpec,
};

/// Starts each execution immediately as a task and hands back a [`Deferred`].
pub struct AsyncExecutor<C, E = ClientError> {
    pipeline: ExecutionPipeline<C, E>,
}

impl<C, E> Clone for AsyncExecutor<C, E> {
    fn clone(&self) -> Self {
        Self {
            pipeline: self.pipeline.clone(),
        }
    }
}

impl<C: fmt::Debug, E> fmt::Debug for AsyncExecutor<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncExecutor")
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

impl<C, E> AsyncExecutor<C, E> {
    /// The underlying pipeline.
    #[must_use]
    pub const fn pipeline(&self) -> &ExecutionPipeline<C, E> {
        &self.pipeline
    }
}

impl<C, E> AsyncExecutor<C, E>
where
    C: HttpClient,
    E: From<ClientError> + Send + 'static,
{
    /// Executor over a fresh pipeline with the default error mapper.
    #[must_use]
    pub fn new(client: C, gate: Arc<dyn ProtectionGate>) -> Self {
        Self::from_pipeline(ExecutionPipeline::new(client, gate))
    }
}

impl<C, E> AsyncExecutor<C, E>
where
    C: HttpClient,
    E: Send + 'static,
{
    /// Executor sharing an existing pipeline.
    #[must_use]
    pub const fn from_pipeline(pipeline: ExecutionPipeline<C, E>) -> Self {
        Self { pipeline }
    }

    /// Start executing and decode the JSON body.
    pub fn execute<T>(&self, spec: RequestSpec<E>) -> Deferred<T, E>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.execute_with(spec, Json)
    }

    /// Start executing and decode the body with `codec`.
    ///
    /// Outside a tokio runtime nothing is sent and the handle resolves to the
    /// mapped runtime failure.
    pub fn execute_with<T, D>(&self, spec: RequestSpec<E>, codec: D) -> Deferred<T, E>
    where
        T: Send + 'static,
        D: Codec<T>,
    {
        let errors = Arc::clone(self.pipeline.errors());
        match Handle::try_current() {
            Ok(handle) => {
                let pipeline = self.pipeline.clone();
                let handle = handle.spawn(async move { pipeline.run(spec, &codec).await });
                Deferred {
                    state: State::Running { handle, errors },
                }
            }
            Err(err) => {
                warn!(error = %err, "no tokio runtime for deferred execution");
                Deferred {
                    state: State::Failed {
                        failure: Error::runtime(err.to_string()).into(),
                        errors,
                    },
                }
            }
        }
    }
}

/// Handle to a running execution.
///
/// Resolves to exactly one outcome, already mapped to `E`. Dropping the
/// handle does not stop the execution; call [`abort`](Self::abort) for that.
/// An aborted execution resolves as a cancelled transport failure. A panic
/// inside the execution is propagated to the awaiting task.
pub struct Deferred<T, E = ClientError> {
    state: State<T, E>,
}

enum State<T, E> {
    Running {
        handle: JoinHandle<Result<T, E>>,
        errors: Arc<ErrorMapper<E>>,
    },
    Failed {
        failure: FailureDescription,
        errors: Arc<ErrorMapper<E>>,
    },
}

impl<T, E> Deferred<T, E> {
    /// Stop the execution if it is still running.
    pub fn abort(&self) {
        if let State::Running { handle, .. } = &self.state {
            handle.abort();
        }
    }

    /// Whether awaiting would complete without waiting.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        match &self.state {
            State::Running { handle, .. } => handle.is_finished(),
            State::Failed { .. } => true,
        }
    }
}

impl<T, E> fmt::Debug for Deferred<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            State::Running { .. } => "running",
            State::Failed { .. } => "failed",
        };
        f.debug_struct("Deferred").field("state", &state).finish()
    }
}

impl<T, E> Future for Deferred<T, E> {
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().state {
            State::Running { handle, errors } => match ready!(Pin::new(handle).poll(cx)) {
                Ok(result) => Poll::Ready(result),
                Err(err) if err.is_panic() => panic::resume_unwind(err.into_panic()),
                Err(_) => {
                    warn!("deferred execution cancelled");
                    Poll::Ready(Err(errors.resolve(&Error::Cancelled.into())))
                }
            },
            State::Failed { failure, errors } => Poll::Ready(Err(errors.resolve(failure))),
        }
    }
}
