//! The three execution roles over one [`ExecutionPipeline`](crate::ExecutionPipeline).
//!
//! | Role | Type | Result |
//! |------|------|--------|
//! | eager | [`BlockingExecutor`] | the decoded value, on return |
//! | deferred | [`AsyncExecutor`] | a [`Deferred`] handle, already running |
//! | lazy | [`StreamingExecutor`] | a [`ResponseStream`](crate::ResponseStream), started on first poll |
//!
//! All roles share the same gate, deadline, retry and error mapping rules.

mod blocking;
mod deferred;
mod streaming;

pub use blocking::BlockingExecutor;
pub use deferred::{AsyncExecutor, Deferred};
pub use streaming::StreamingExecutor;
