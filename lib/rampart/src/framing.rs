//! Newline framing of streamed bodies.

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt, stream};
use tracing::warn;

use crate::{Error, Result, StreamingBody};

struct Framer {
    body: StreamingBody,
    buffer: BytesMut,
    done: bool,
}

impl Framer {
    fn new(body: StreamingBody) -> Self {
        Self {
            body,
            buffer: BytesMut::new(),
            done: false,
        }
    }

    /// Next complete non-blank frame in the buffer.
    ///
    /// Once the body is exhausted the unterminated tail counts as a frame.
    fn next_frame(&mut self) -> Option<Bytes> {
        loop {
            let mut frame = match self.buffer.iter().position(|byte| *byte == b'\n') {
                Some(end) => {
                    let mut line = self.buffer.split_to(end + 1);
                    line.truncate(end);
                    line
                }
                None if self.done && !self.buffer.is_empty() => self.buffer.split(),
                None => return None,
            };

            if frame.last() == Some(&b'\r') {
                frame.truncate(frame.len() - 1);
            }
            if !frame.iter().all(u8::is_ascii_whitespace) {
                return Some(frame.freeze());
            }
        }
    }
}

/// Split `body` into newline-delimited frames, skipping blank ones.
///
/// Each wait for more bytes is bounded by `idle`; exceeding it ends the
/// stream with [`Error::Timeout`]. The first error ends the stream.
pub(crate) fn frames(
    body: StreamingBody,
    idle: Duration,
) -> impl Stream<Item = Result<Bytes>> + Send {
    stream::try_unfold(Framer::new(body), move |mut framer| async move {
        loop {
            if let Some(frame) = framer.next_frame() {
                return Ok::<_, Error>(Some((frame, framer)));
            }
            if framer.done {
                return Ok(None);
            }
            match tokio::time::timeout(idle, framer.body.next()).await {
                Ok(Some(chunk)) => framer.buffer.extend_from_slice(&chunk?),
                Ok(None) => framer.done = true,
                Err(_) => {
                    warn!(
                        idle_ms = u64::try_from(idle.as_millis()).unwrap_or(u64::MAX),
                        "stream idle timeout"
                    );
                    return Err(Error::Timeout);
                }
            }
        }
    })
}
