//! Byte-stream bodies.
//!
//! [`ByteStream`] is the currency for streaming request and response
//! bodies. It wraps any `futures` byte stream and carries a shared
//! cancellation flag so the dispatcher can cancel an unconsumed request
//! stream when a request fails, and tests can observe that it did.

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures_core::Stream;
use futures_util::StreamExt;

/// Boxed error type used by stream items.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

type Inner = Pin<Box<dyn Stream<Item = Result<Bytes, BoxError>> + Send>>;

/// An opaque stream of byte chunks.
///
/// Request streams are handed to handlers untouched; response streams
/// are written to the wire chunk by chunk. Dropping a `ByteStream`
/// releases its resources but does not count as cancellation —
/// [`ByteStream::cancel`] is the explicit signal, observable through
/// the paired [`StreamHandle`].
pub struct ByteStream {
    inner: Inner,
    cancelled: Arc<AtomicBool>,
}

impl ByteStream {
    /// Wraps an arbitrary byte stream.
    #[must_use]
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, BoxError>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Creates a single-chunk stream from a byte buffer.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        Self::new(futures_util::stream::once(async move { Ok(bytes) }))
    }

    /// Creates an empty stream.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(futures_util::stream::empty())
    }

    /// Returns a handle observing this stream's cancellation flag.
    #[must_use]
    pub fn handle(&self) -> StreamHandle {
        StreamHandle {
            cancelled: Arc::clone(&self.cancelled),
        }
    }

    /// Cancels the stream, releasing the underlying source.
    ///
    /// Called by the dispatcher when a request fails with its body
    /// stream still unconsumed. Never called on successful requests:
    /// a handler may intentionally leave a stream partially read.
    pub fn cancel(self) {
        self.cancelled.store(true, Ordering::SeqCst);
        drop(self.inner);
    }

    /// Reads the stream to completion, concatenating all chunks.
    pub async fn collect_bytes(mut self) -> Result<Bytes, BoxError> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.inner.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf.freeze())
    }
}

impl Stream for ByteStream {
    type Item = Result<Bytes, BoxError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for ByteStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteStream")
            .field("cancelled", &self.cancelled.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Observer for a [`ByteStream`]'s cancellation flag.
///
/// Remains valid after the stream itself has been consumed or dropped.
#[derive(Debug, Clone)]
pub struct StreamHandle {
    cancelled: Arc<AtomicBool>,
}

impl StreamHandle {
    /// Returns whether the stream was explicitly canceled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
