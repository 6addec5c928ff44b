//! One pipeline, three execution roles.

use std::fmt;
use std::sync::Arc;

use crate::executor::{AsyncExecutor, BlockingExecutor, StreamingExecutor};
use crate::{
    ClientError, ErrorMapper, ExecutionPipeline, HttpClientStreaming, HyperClient, ProtectionGate,
    Result,
};

/// Facade handing out the blocking, async and streaming executors.
///
/// All three share the transport, the protection gate and the error mapper,
/// so a circuit opened by one role rejects calls from the others.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use rampart::middleware::CircuitBreaker;
/// use rampart::{ClientError, ErrorMapper, HyperClient, RequestSpec, RestClient};
///
/// #[derive(Debug, serde::Deserialize)]
/// struct User {
///     name: String,
/// }
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let http = HyperClient::builder()
///     .base_url("https://api.example.com/".parse()?)
///     .build();
/// let errors = ErrorMapper::new().map(404, |failure| {
///     ClientError::from(failure)
/// });
/// let client = RestClient::with_error_mapper(http, Arc::new(CircuitBreaker::default()), errors)?;
///
/// let user: User = client
///     .asynchronous()
///     .execute(RequestSpec::get("users/42").retry(2))
///     .await?;
/// println!("{}", user.name);
/// # Ok(())
/// # }
/// ```
pub struct RestClient<C = HyperClient, E = ClientError> {
    blocking: BlockingExecutor<C, E>,
    asynchronous: AsyncExecutor<C, E>,
    streaming: StreamingExecutor<C, E>,
}

impl<C: fmt::Debug, E> fmt::Debug for RestClient<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient")
            .field("pipeline", self.asynchronous.pipeline())
            .finish_non_exhaustive()
    }
}

impl<C, E> Clone for RestClient<C, E> {
    fn clone(&self) -> Self {
        Self {
            blocking: self.blocking.clone(),
            asynchronous: self.asynchronous.clone(),
            streaming: self.streaming.clone(),
        }
    }
}

impl<C, E> RestClient<C, E>
where
    C: HttpClientStreaming,
    E: From<ClientError> + Send + 'static,
{
    /// Facade whose shared mapper only has the default [`ClientError`] factory.
    pub fn new(client: C, gate: Arc<dyn ProtectionGate>) -> Result<Self> {
        Self::with_error_mapper(client, gate, ErrorMapper::new())
    }
}

impl<C, E> RestClient<C, E>
where
    C: HttpClientStreaming,
    E: Send + 'static,
{
    /// Facade with a custom shared error mapper.
    ///
    /// Fails only when the blocking runtime cannot be built.
    pub fn with_error_mapper(
        client: C,
        gate: Arc<dyn ProtectionGate>,
        errors: ErrorMapper<E>,
    ) -> Result<Self> {
        let pipeline = ExecutionPipeline::with_error_mapper(client, gate, errors);
        Ok(Self {
            blocking: BlockingExecutor::from_pipeline(pipeline.clone())?,
            asynchronous: AsyncExecutor::from_pipeline(pipeline.clone()),
            streaming: StreamingExecutor::from_pipeline(pipeline),
        })
    }

    /// The eager role.
    #[must_use]
    pub const fn blocking(&self) -> &BlockingExecutor<C, E> {
        &self.blocking
    }

    /// The deferred role.
    #[must_use]
    pub const fn asynchronous(&self) -> &AsyncExecutor<C, E> {
        &self.asynchronous
    }

    /// The lazy role.
    #[must_use]
    pub const fn streaming(&self) -> &StreamingExecutor<C, E> {
        &self.streaming
    }
}
