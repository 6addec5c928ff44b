//! The execution pipeline.
//!
//! [`ExecutionPipeline`] turns a [`RequestSpec`] into a result:
//!
//! 1. the spec URL is resolved against the transport's base URL and the body
//!    serialization outcome is checked;
//! 2. the request runs through the [`AttemptStack`]: gate, deadline, retry,
//!    per-attempt logging, transport;
//! 3. a success is decoded with a [`Codec`];
//! 4. any terminal failure is resolved through the spec's local mappings and
//!    the shared [`ErrorMapper`].
//!
//! Raw [`Error`]s never leave the pipeline.

use std::fmt;
use std::future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::{self, BoxStream};
use futures_util::{StreamExt, TryStreamExt};
use tower::ServiceExt;
use tower::retry::RetryLayer;
use tracing::{debug, error, warn};
use url::Url;

use crate::framing::frames;
use crate::middleware::{AttemptPolicy, AttemptStack, DeadlineLayer, GateLayer, LoggingLayer};
use crate::transport::{StreamingTransport, Transport};
use crate::{
    ClientError, Codec, Error, ErrorMapper, FailureDescription, HttpClient, HttpClientStreaming,
    ProtectionGate, Request, RequestSpec, SpecParts, StatusMappings,
};

/// Lazily produced results of a streaming execution.
pub type ResponseStream<T, E = ClientError> = BoxStream<'static, Result<T, E>>;

/// A spec that passed validation, ready for the attempt stack.
struct Prepared<E> {
    request: Request<Bytes>,
    timeout: Duration,
    retry_count: u32,
    overrides: StatusMappings<E>,
}

/// Executes [`RequestSpec`]s against a transport.
///
/// Holds the transport, the shared protection gate and the shared error
/// mapper. Cloning is cheap; clones share all three.
pub struct ExecutionPipeline<C, E = ClientError> {
    client: Arc<C>,
    gate: Arc<dyn ProtectionGate>,
    errors: Arc<ErrorMapper<E>>,
}

impl<C, E> Clone for ExecutionPipeline<C, E> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            gate: Arc::clone(&self.gate),
            errors: Arc::clone(&self.errors),
        }
    }
}

impl<C, E> fmt::Debug for ExecutionPipeline<C, E>
where
    C: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionPipeline")
            .field("client", &self.client)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

impl<C, E> ExecutionPipeline<C, E>
where
    C: HttpClient,
    E: From<ClientError> + 'static,
{
    /// Pipeline whose shared mapper only has the default [`ClientError`] factory.
    #[must_use]
    pub fn new(client: C, gate: Arc<dyn ProtectionGate>) -> Self {
        Self::with_error_mapper(client, gate, ErrorMapper::new())
    }
}

impl<C, E> ExecutionPipeline<C, E>
where
    C: HttpClient,
{
    /// Pipeline with a custom shared error mapper.
    #[must_use]
    pub fn with_error_mapper(
        client: C,
        gate: Arc<dyn ProtectionGate>,
        errors: ErrorMapper<E>,
    ) -> Self {
        Self {
            client: Arc::new(client),
            gate,
            errors: Arc::new(errors),
        }
    }

    /// The transport.
    #[must_use]
    pub fn client(&self) -> &C {
        &self.client
    }

    /// The shared protection gate.
    #[must_use]
    pub fn gate(&self) -> &Arc<dyn ProtectionGate> {
        &self.gate
    }

    /// The shared error mapper.
    #[must_use]
    pub fn errors(&self) -> &Arc<ErrorMapper<E>> {
        &self.errors
    }

    /// Execute and decode the body as a single value.
    ///
    /// # Errors
    ///
    /// Returns the mapped caller error on any terminal failure.
    pub async fn run<T, D>(&self, spec: RequestSpec<E>, codec: &D) -> Result<T, E>
    where
        D: Codec<T>,
    {
        self.run_decoded(spec, |body| codec.decode(body)).await
    }

    /// Execute and decode the whole body as an ordered list.
    ///
    /// # Errors
    ///
    /// Returns the mapped caller error on any terminal failure.
    pub async fn run_list<T, D>(&self, spec: RequestSpec<E>, codec: &D) -> Result<Vec<T>, E>
    where
        D: Codec<T>,
    {
        self.run_decoded(spec, |body| codec.decode_seq(body)).await
    }

    async fn run_decoded<T>(
        &self,
        spec: RequestSpec<E>,
        decode: impl FnOnce(&[u8]) -> crate::Result<T> + Send,
    ) -> Result<T, E> {
        let Prepared {
            request,
            timeout,
            retry_count,
            overrides,
        } = self.prepare(spec)?;

        let transport = Transport::new(Arc::clone(&self.client));
        let response = match self
            .stack(timeout, retry_count, transport)
            .oneshot(request)
            .await
        {
            Ok(response) => response,
            Err(err) => return Err(self.fail(&overrides, err.into())),
        };

        let status = response.status();
        decode(response.body()).map_err(|err| {
            error!(status, error = %err, "failed to decode response body");
            self.fail(
                &overrides,
                FailureDescription::decoding(status, response.body(), err),
            )
        })
    }

    fn prepare(&self, spec: RequestSpec<E>) -> Result<Prepared<E>, E> {
        let SpecParts {
            method,
            url,
            headers,
            body,
            timeout,
            retry_count,
            error_map,
        } = spec.into_parts();

        let request = self.resolve_url(&url).and_then(|url| {
            let body = body.transpose()?;
            Ok(Request::from_parts(method, url, headers, body))
        });

        match request {
            Ok(request) => {
                if retry_count > 0 && !method.is_idempotent() {
                    warn!(
                        %method,
                        url = %request.url(),
                        retry_count,
                        "retry enabled on a non-idempotent request"
                    );
                }
                Ok(Prepared {
                    request,
                    timeout,
                    retry_count,
                    overrides: error_map,
                })
            }
            Err(err) => Err(self.fail(&error_map, err.into())),
        }
    }

    fn resolve_url(&self, raw: &str) -> crate::Result<Url> {
        match Url::parse(raw) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = self.client.base_url().ok_or_else(|| {
                    Error::invalid_request(format!("relative URL `{raw}` without a base URL"))
                })?;
                Ok(base.join(raw)?)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn stack<S>(&self, timeout: Duration, retry_count: u32, transport: S) -> AttemptStack<S> {
        tower::ServiceBuilder::new()
            .layer(GateLayer::new(Arc::clone(&self.gate)))
            .layer(DeadlineLayer::new(timeout))
            .layer(RetryLayer::new(AttemptPolicy::new(retry_count)))
            .layer(LoggingLayer::new())
            .service(transport)
    }

    fn fail(&self, overrides: &StatusMappings<E>, failure: FailureDescription) -> E {
        debug!(
            kind = %failure.kind(),
            status = ?failure.status(),
            "mapping terminal failure"
        );
        self.errors.resolve_with(overrides, &failure)
    }
}

impl<C, E> ExecutionPipeline<C, E>
where
    C: HttpClientStreaming,
    E: Send + 'static,
{
    /// Execute lazily and decode the body frame by frame.
    ///
    /// Nothing happens until the stream is first polled. The response head is
    /// obtained through the full attempt stack; after that each frame read is
    /// bounded by the spec's timeout and mid-stream failures are not retried.
    /// The first error ends the stream. Every call starts a fresh execution.
    pub fn stream<T, D>(&self, spec: RequestSpec<E>, codec: D) -> ResponseStream<T, E>
    where
        T: Send + 'static,
        D: Codec<T>,
    {
        let pipeline = self.clone();
        stream::once(async move { pipeline.open_stream(spec, codec).await })
            .flatten()
            .boxed()
    }

    async fn open_stream<T, D>(self, spec: RequestSpec<E>, codec: D) -> ResponseStream<T, E>
    where
        T: Send + 'static,
        D: Codec<T>,
    {
        let Prepared {
            request,
            timeout,
            retry_count,
            overrides,
        } = match self.prepare(spec) {
            Ok(prepared) => prepared,
            Err(err) => return stream::once(future::ready(Err(err))).boxed(),
        };

        let transport = StreamingTransport::new(Arc::clone(&self.client));
        let response = match self
            .stack(timeout, retry_count, transport)
            .oneshot(request)
            .await
        {
            Ok(response) => response,
            Err(err) => {
                let err = self.fail(&overrides, err.into());
                return stream::once(future::ready(Err(err))).boxed();
            }
        };

        let status = response.status();
        frames(response.into_body(), timeout)
            .map(move |frame| -> Result<T, FailureDescription> {
                let frame = frame.map_err(FailureDescription::from)?;
                codec.decode(&frame).map_err(|err| {
                    error!(status, error = %err, "failed to decode stream frame");
                    FailureDescription::decoding(status, &frame, err)
                })
            })
            .map_err(move |failure| self.fail(&overrides, failure))
            .scan(false, |failed, item| {
                let next = (!*failed).then(|| {
                    *failed = item.is_err();
                    item
                });
                future::ready(next)
            })
            .boxed()
    }
}
