//! Sequential read/write facade over one accepted connection.
//!
//! The transport is only polled from inside [`Socket::read`], so while the
//! consumer is busy nothing is pulled off the wire: unread bytes stay in the
//! kernel buffer and TCP flow control pauses the peer. Each `read` hands out
//! at most one delivery, which bounds buffering to one in-flight chunk.
//!
//! End-of-stream and transport errors are sticky. Once either is observed it
//! is replayed to every later call without touching the transport again.

use std::io;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

/// Upper bound for a single delivery.
pub const READ_CHUNK_SIZE: usize = 16 * 1024;

/// Remembered transport failure. `io::Error` is not `Clone`, so the kind
/// and message are kept and a fresh error is rebuilt on every replay.
#[derive(Debug, Clone)]
struct StickyError {
    kind: io::ErrorKind,
    message: String,
}

impl StickyError {
    fn capture(err: &io::Error) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    fn replay(&self) -> io::Error {
        io::Error::new(self.kind, self.message.clone())
    }
}

#[derive(Debug)]
pub struct Socket<S> {
    stream: S,
    ended: bool,
    error: Option<StickyError>,
}

impl<S> Socket<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            ended: false,
            error: None,
        }
    }

    /// True once the peer has closed its sending side.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// True once any read or write has failed.
    pub fn is_broken(&self) -> bool {
        self.error.is_some()
    }

    fn fail(&mut self, err: io::Error) -> io::Error {
        if self.error.is_none() {
            self.error = Some(StickyError::capture(&err));
        }
        err
    }
}

impl<S: AsyncRead + Unpin> Socket<S> {
    /// Returns the next delivery from the peer.
    ///
    /// An empty result means end-of-stream, and every later call returns
    /// empty again. Only one read may be in flight at a time; the `&mut`
    /// receiver is what upholds that.
    pub async fn read(&mut self) -> io::Result<Bytes> {
        if let Some(err) = &self.error {
            return Err(err.replay());
        }
        if self.ended {
            return Ok(Bytes::new());
        }

        let mut chunk = BytesMut::with_capacity(READ_CHUNK_SIZE);
        match self.stream.read_buf(&mut chunk).await {
            Ok(0) => {
                trace!("peer closed the stream");
                self.ended = true;
                Ok(Bytes::new())
            }
            Ok(n) => {
                trace!(bytes = n, "socket read");
                Ok(chunk.freeze())
            }
            Err(e) => Err(self.fail(e)),
        }
    }
}

impl<S: AsyncWrite + Unpin> Socket<S> {
    /// Sends `data`, completing once the transport has accepted all of it.
    ///
    /// Fails immediately with the stored error if the connection is already
    /// broken.
    pub async fn write(&mut self, data: &[u8]) -> io::Result<()> {
        debug_assert!(!data.is_empty(), "empty writes are never issued");
        if let Some(err) = &self.error {
            return Err(err.replay());
        }

        if let Err(e) = self.stream.write_all(data).await {
            return Err(self.fail(e));
        }
        trace!(bytes = data.len(), "socket write");
        Ok(())
    }

    /// Flushes and shuts down the sending side, then drops the transport.
    pub async fn close(mut self) {
        if self.error.is_none() {
            if let Err(e) = self.stream.shutdown().await {
                trace!(error = %e, "shutdown failed");
            }
        }
    }
}
