//! Eager execution on a private runtime.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::runtime::{Builder, Runtime};
use tracing::error;

use crate::{
    ClientError, Codec, Error, ErrorMapper, ExecutionPipeline, HttpClient, Json, ProtectionGate,
    RequestSpec, Result,
};

/// Owns the runtime and shuts it down without blocking when dropped.
struct BlockingRuntime(Option<Runtime>);

impl BlockingRuntime {
    fn build() -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("rampart-blocking")
            .enable_all()
            .build()
            .map_err(|err| {
                error!(error = %err, "failed to build blocking runtime");
                Error::runtime(err.to_string())
            })?;
        Ok(Self(Some(runtime)))
    }
}

impl Drop for BlockingRuntime {
    fn drop(&mut self) {
        if let Some(runtime) = self.0.take() {
            runtime.shutdown_background();
        }
    }
}

/// Runs each execution to completion on the calling thread.
///
/// # Panics
///
/// The `execute*` methods panic when called from within an async context;
/// use [`AsyncExecutor`](crate::executor::AsyncExecutor) there, or move the
/// call to `tokio::task::spawn_blocking`.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use rampart::executor::BlockingExecutor;
/// use rampart::{HyperClient, NoProtection, RequestSpec};
///
/// # fn main() -> rampart::Result<()> {
/// let executor: BlockingExecutor<_> =
///     BlockingExecutor::new(HyperClient::new(), Arc::new(NoProtection))?;
/// let names: Vec<String> = executor
///     .execute_list(RequestSpec::get("https://api.example.com/names"))
///     .map_err(|err| rampart::Error::runtime(err.to_string()))?;
/// # Ok(())
/// # }
/// ```
pub struct BlockingExecutor<C, E = ClientError> {
    pipeline: ExecutionPipeline<C, E>,
    runtime: Arc<BlockingRuntime>,
}

impl<C, E> Clone for BlockingExecutor<C, E> {
    fn clone(&self) -> Self {
        Self {
            pipeline: self.pipeline.clone(),
            runtime: Arc::clone(&self.runtime),
        }
    }
}

impl<C: fmt::Debug, E> fmt::Debug for BlockingExecutor<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingExecutor")
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

impl<C, E> BlockingExecutor<C, E> {
    /// The underlying pipeline.
    #[must_use]
    pub const fn pipeline(&self) -> &ExecutionPipeline<C, E> {
        &self.pipeline
    }
}

impl<C, E> BlockingExecutor<C, E>
where
    C: HttpClient,
    E: From<ClientError> + 'static,
{
    /// Executor over a fresh pipeline with the default error mapper.
    pub fn new(client: C, gate: Arc<dyn ProtectionGate>) -> Result<Self> {
        Self::from_pipeline(ExecutionPipeline::new(client, gate))
    }
}

impl<C, E> BlockingExecutor<C, E>
where
    C: HttpClient,
{
    /// Executor sharing an existing pipeline.
    pub fn from_pipeline(pipeline: ExecutionPipeline<C, E>) -> Result<Self> {
        Ok(Self {
            pipeline,
            runtime: Arc::new(BlockingRuntime::build()?),
        })
    }

    /// Execute and decode the JSON body.
    pub fn execute<T>(&self, spec: RequestSpec<E>) -> std::result::Result<T, E>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.execute_with(spec, &Json)
    }

    /// Execute and decode the body with `codec`.
    pub fn execute_with<T, D>(&self, spec: RequestSpec<E>, codec: &D) -> std::result::Result<T, E>
    where
        D: Codec<T>,
    {
        self.block_on(self.pipeline.run(spec, codec))
    }

    /// Execute and decode the JSON body as a list.
    pub fn execute_list<T>(&self, spec: RequestSpec<E>) -> std::result::Result<Vec<T>, E>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.execute_list_with(spec, &Json)
    }

    /// Execute and decode the body as a list with `codec`.
    pub fn execute_list_with<T, D>(
        &self,
        spec: RequestSpec<E>,
        codec: &D,
    ) -> std::result::Result<Vec<T>, E>
    where
        D: Codec<T>,
    {
        self.block_on(self.pipeline.run_list(spec, codec))
    }

    fn block_on<T>(
        &self,
        future: impl Future<Output = std::result::Result<T, E>>,
    ) -> std::result::Result<T, E> {
        match &self.runtime.0 {
            Some(runtime) => runtime.block_on(future),
            None => Err(self.errors().resolve(&Error::runtime("runtime shut down").into())),
        }
    }

    fn errors(&self) -> &ErrorMapper<E> {
        self.pipeline.errors()
    }
}
