//! Uniform streaming body readers.
//!
//! Every body, whatever backs it, is consumed the same way: call
//! [`BodyReader::read`] until it returns an empty slice, then
//! [`BodyReader::close`]. Readers that draw from the connection take the
//! socket and its buffer as arguments instead of holding on to them, so the
//! connection can keep writing while a request body is being streamed back.

use bytes::{Bytes, BytesMut};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tracing::trace;

use crate::http::buffer::DynBuf;
use crate::http::chunked::ChunkedDecoder;
use crate::http::error::HttpError;
use crate::http::request::RequestHead;
use crate::http::socket::Socket;

/// Bytes requested from a file per read.
pub const FILE_CHUNK_SIZE: usize = 16 * 1024;

#[derive(Debug)]
pub enum BodyReader {
    /// The next `remaining` bytes of the connection.
    Length(LengthReader),
    /// A chunk-decoded stream from the connection.
    Chunked(ChunkedReader),
    /// A fixed buffer handed out in one piece.
    Memory(MemoryReader),
    /// An open file of known size.
    File(FileReader),
    /// Slices produced by another task, length unknown.
    Channel(ChannelReader),
}

impl BodyReader {
    /// Picks the request body reader from the method and framing headers.
    ///
    /// 1. `GET`/`HEAD` with a positive length or chunked encoding is a 400.
    /// 2. `Content-Length` (forced to 0 for `GET`/`HEAD`) gives a length reader.
    /// 3. `Transfer-Encoding: chunked` gives a chunked reader.
    /// 4. Anything else has no usable framing: 501.
    pub fn from_request(head: &RequestHead) -> Result<Self, HttpError> {
        let allows_body = head.method.allows_body();
        let length = head.content_length()?;
        let chunked = head.is_chunked();

        if !allows_body && (length.is_some_and(|n| n > 0) || chunked) {
            return Err(HttpError::bad_request("HTTP Body not allowed"));
        }

        if !allows_body {
            return Ok(Self::from_length(0));
        }

        match (length, chunked) {
            (Some(n), _) => Ok(Self::from_length(n)),
            (None, true) => Ok(Self::chunked()),
            (None, false) => Err(HttpError::not_implemented("No body framing")),
        }
    }

    pub fn from_length(remaining: u64) -> Self {
        BodyReader::Length(LengthReader { remaining })
    }

    pub fn chunked() -> Self {
        BodyReader::Chunked(ChunkedReader::new())
    }

    pub fn from_memory(data: impl Into<Bytes>) -> Self {
        BodyReader::Memory(MemoryReader {
            data: Some(data.into()),
        })
    }

    pub fn from_file(file: File, size: u64) -> Self {
        BodyReader::File(FileReader {
            file: Some(file),
            size,
            got: 0,
        })
    }

    pub fn from_channel(rx: mpsc::Receiver<Bytes>) -> Self {
        BodyReader::Channel(ChannelReader { rx })
    }

    /// Declared body length, or `None` when it is only known at the end.
    pub fn length(&self) -> Option<u64> {
        match self {
            BodyReader::Length(r) => Some(r.remaining),
            BodyReader::Chunked(_) | BodyReader::Channel(_) => None,
            BodyReader::Memory(r) => Some(r.data.as_ref().map_or(0, |d| d.len() as u64)),
            BodyReader::File(r) => Some(r.size),
        }
    }

    /// Next slice of the body. Empty means the body is finished, and every
    /// later call returns empty too.
    pub async fn read<S: AsyncRead + Unpin>(
        &mut self,
        socket: &mut Socket<S>,
        buf: &mut DynBuf,
    ) -> Result<Bytes, HttpError> {
        match self {
            BodyReader::Length(r) => r.read(socket, buf).await,
            BodyReader::Chunked(r) => r.read(socket, buf).await,
            BodyReader::Memory(r) => Ok(r.read()),
            BodyReader::File(r) => r.read().await,
            BodyReader::Channel(r) => Ok(r.read().await),
        }
    }

    /// Releases any held resource. Safe to call more than once.
    pub async fn close(&mut self) {
        if let BodyReader::File(r) = self {
            r.close();
        }
    }
}

/// Reads once from the socket into `buf`. A closed stream here means the
/// peer stopped in the middle of a message.
pub(crate) async fn pull<S: AsyncRead + Unpin>(
    socket: &mut Socket<S>,
    buf: &mut DynBuf,
) -> Result<(), HttpError> {
    let data = socket.read().await?;
    if data.is_empty() {
        return Err(HttpError::unexpected_eof());
    }
    buf.push(&data);
    Ok(())
}

#[derive(Debug)]
pub struct LengthReader {
    remaining: u64,
}

impl LengthReader {
    async fn read<S: AsyncRead + Unpin>(
        &mut self,
        socket: &mut Socket<S>,
        buf: &mut DynBuf,
    ) -> Result<Bytes, HttpError> {
        if self.remaining == 0 {
            return Ok(Bytes::new());
        }
        if buf.is_empty() {
            pull(socket, buf).await?;
        }

        let consume = self.remaining.min(buf.len() as u64) as usize;
        let data = Bytes::copy_from_slice(&buf.as_slice()[..consume]);
        buf.pop(consume);
        self.remaining -= consume as u64;
        Ok(data)
    }
}

#[derive(Debug)]
pub struct ChunkedReader {
    decoder: ChunkedDecoder,
}

impl ChunkedReader {
    fn new() -> Self {
        Self {
            decoder: ChunkedDecoder::new(),
        }
    }

    async fn read<S: AsyncRead + Unpin>(
        &mut self,
        socket: &mut Socket<S>,
        buf: &mut DynBuf,
    ) -> Result<Bytes, HttpError> {
        Ok(self.decoder.next_chunk(socket, buf).await?.unwrap_or_default())
    }
}

/// Not restartable: the payload is handed out once.
#[derive(Debug)]
pub struct MemoryReader {
    data: Option<Bytes>,
}

impl MemoryReader {
    fn read(&mut self) -> Bytes {
        self.data.take().unwrap_or_default()
    }
}

#[derive(Debug)]
pub struct FileReader {
    file: Option<File>,
    size: u64,
    got: u64,
}

impl FileReader {
    async fn read(&mut self) -> Result<Bytes, HttpError> {
        let Some(file) = self.file.as_mut() else {
            return Ok(Bytes::new());
        };

        let mut chunk = BytesMut::with_capacity(FILE_CHUNK_SIZE);
        let n = file
            .read_buf(&mut chunk)
            .await
            .map_err(|e| HttpError::internal(format!("file read failed: {e}")))?;
        self.got += n as u64;

        if self.got > self.size || (self.got < self.size && n == 0) {
            return Err(HttpError::internal(format!(
                "file read {} bytes, expected {}",
                self.got, self.size
            )));
        }
        Ok(chunk.freeze())
    }

    fn close(&mut self) {
        if self.file.take().is_some() {
            trace!(bytes = self.got, "file body closed");
        }
    }
}

#[derive(Debug)]
pub struct ChannelReader {
    rx: mpsc::Receiver<Bytes>,
}

impl ChannelReader {
    async fn read(&mut self) -> Bytes {
        // Empty slices from the producer would read as end-of-body.
        while let Some(data) = self.rx.recv().await {
            if !data.is_empty() {
                return data;
            }
        }
        Bytes::new()
    }
}
