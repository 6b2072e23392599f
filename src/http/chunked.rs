//! `Transfer-Encoding: chunked` in both directions.
//!
//! Wire format: `<hex-size>\r\n<payload>\r\n`, repeated, ended by a
//! zero-size chunk and a blank line.

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::AsyncRead;
use tracing::trace;

use crate::http::body::pull;
use crate::http::buffer::DynBuf;
use crate::http::error::HttpError;
use crate::http::parser::CRLF;
use crate::http::socket::Socket;

/// Longest size or trailer line accepted before giving up.
pub const MAX_CHUNK_LINE: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    Size,
    Data(u64),
    DataEnd,
    Trailer,
    Done,
}

/// Lazily decodes a chunked body out of the connection buffer.
///
/// Each call to [`ChunkedDecoder::next_chunk`] yields at most one slice of
/// payload, pulling more bytes from the socket only when the buffer runs dry.
#[derive(Debug)]
pub struct ChunkedDecoder {
    state: ChunkedState,
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkedDecoder {
    pub fn new() -> Self {
        Self { state: ChunkedState::Size }
    }

    pub fn is_done(&self) -> bool {
        self.state == ChunkedState::Done
    }

    /// Next payload slice, or `None` once the zero-size chunk and any
    /// trailers have been consumed.
    pub async fn next_chunk<S: AsyncRead + Unpin>(
        &mut self,
        socket: &mut Socket<S>,
        buf: &mut DynBuf,
    ) -> Result<Option<Bytes>, HttpError> {
        loop {
            match self.state {
                ChunkedState::Size => {
                    let Some(idx) = find_line(buf)? else {
                        pull(socket, buf).await?;
                        continue;
                    };

                    let size = parse_chunk_size(&buf.as_slice()[..idx])?;
                    buf.pop(idx + CRLF.len());
                    trace!(size, "chunk header");

                    self.state = if size == 0 {
                        ChunkedState::Trailer
                    } else {
                        ChunkedState::Data(size)
                    };
                }
                ChunkedState::Data(remaining) => {
                    if buf.is_empty() {
                        pull(socket, buf).await?;
                    }

                    let take = remaining.min(buf.len() as u64) as usize;
                    let data = Bytes::copy_from_slice(&buf.as_slice()[..take]);
                    buf.pop(take);

                    let remaining = remaining - take as u64;
                    self.state = if remaining == 0 {
                        ChunkedState::DataEnd
                    } else {
                        ChunkedState::Data(remaining)
                    };
                    return Ok(Some(data));
                }
                ChunkedState::DataEnd => {
                    while buf.len() < CRLF.len() {
                        pull(socket, buf).await?;
                    }
                    if &buf.as_slice()[..CRLF.len()] != CRLF {
                        return Err(HttpError::bad_request("Malformed chunk terminator"));
                    }
                    buf.pop(CRLF.len());
                    self.state = ChunkedState::Size;
                }
                ChunkedState::Trailer => {
                    let Some(idx) = find_line(buf)? else {
                        pull(socket, buf).await?;
                        continue;
                    };

                    // Trailer fields are not surfaced; the blank line ends the body.
                    buf.pop(idx + CRLF.len());
                    if idx == 0 {
                        self.state = ChunkedState::Done;
                    }
                }
                ChunkedState::Done => return Ok(None),
            }
        }
    }
}

fn find_line(buf: &DynBuf) -> Result<Option<usize>, HttpError> {
    match buf.find(CRLF) {
        Some(idx) => Ok(Some(idx)),
        None if buf.len() >= MAX_CHUNK_LINE => Err(HttpError::bad_request("Chunk line too long")),
        None => Ok(None),
    }
}

fn parse_chunk_size(line: &[u8]) -> Result<u64, HttpError> {
    // Extensions after `;` are ignored.
    let size = match line.iter().position(|b| *b == b';') {
        Some(idx) => &line[..idx],
        None => line,
    };

    std::str::from_utf8(size.trim_ascii())
        .ok()
        .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_hexdigit()))
        .and_then(|s| u64::from_str_radix(s, 16).ok())
        .ok_or_else(|| HttpError::bad_request("Invalid chunk size"))
}

/// Frames one payload slice. An empty slice yields the terminating
/// zero-size chunk.
pub fn encode_chunk(data: &[u8]) -> Bytes {
    let size = format!("{:x}", data.len());
    let mut frame = BytesMut::with_capacity(size.len() + data.len() + 2 * CRLF.len());

    frame.put_slice(size.as_bytes());
    frame.put_slice(CRLF);
    frame.put_slice(data);
    frame.put_slice(CRLF);
    frame.freeze()
}
