//! Lazy streaming execution.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::{
    ClientError, Codec, ExecutionPipeline, HttpClientStreaming, Json, ProtectionGate, RequestSpec,
    ResponseStream,
};

/// Hands back a cold [`ResponseStream`] per execution.
///
/// The request is sent when the stream is first polled; every element is one
/// newline-delimited frame of the body, decoded with the codec.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use futures_util::TryStreamExt;
/// use rampart::executor::StreamingExecutor;
/// use rampart::{HyperClient, NoProtection, RequestSpec, Text};
///
/// # async fn run() -> Result<(), rampart::ClientError> {
/// let executor: StreamingExecutor<_> =
///     StreamingExecutor::new(HyperClient::new(), Arc::new(NoProtection));
/// let lines: Vec<String> = executor
///     .execute_with(RequestSpec::get("https://example.com/events"), Text)
///     .try_collect()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct StreamingExecutor<C, E = ClientError> {
    pipeline: ExecutionPipeline<C, E>,
}

impl<C, E> Clone for StreamingExecutor<C, E> {
    fn clone(&self) -> Self {
        Self {
            pipeline: self.pipeline.clone(),
        }
    }
}

impl<C: fmt::Debug, E> fmt::Debug for StreamingExecutor<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingExecutor")
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

impl<C, E> StreamingExecutor<C, E> {
    /// The underlying pipeline.
    #[must_use]
    pub const fn pipeline(&self) -> &ExecutionPipeline<C, E> {
        &self.pipeline
    }
}

impl<C, E> StreamingExecutor<C, E>
where
    C: HttpClientStreaming,
    E: From<ClientError> + Send + 'static,
{
    /// Executor over a fresh pipeline with the default error mapper.
    #[must_use]
    pub fn new(client: C, gate: Arc<dyn ProtectionGate>) -> Self {
        Self::from_pipeline(ExecutionPipeline::new(client, gate))
    }
}

impl<C, E> StreamingExecutor<C, E>
where
    C: HttpClientStreaming,
    E: Send + 'static,
{
    /// Executor sharing an existing pipeline.
    #[must_use]
    pub const fn from_pipeline(pipeline: ExecutionPipeline<C, E>) -> Self {
        Self { pipeline }
    }

    /// Stream of JSON values, one per line.
    pub fn execute<T>(&self, spec: RequestSpec<E>) -> ResponseStream<T, E>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.execute_with(spec, Json)
    }

    /// Stream of values decoded with `codec`, one per line.
    pub fn execute_with<T, D>(&self, spec: RequestSpec<E>, codec: D) -> ResponseStream<T, E>
    where
        T: Send + 'static,
        D: Codec<T>,
    {
        self.pipeline.stream(spec, codec)
    }
}
