use tokio::io::{AsyncRead, AsyncWrite};
use tracing::trace;

use crate::http::body::BodyReader;
use crate::http::buffer::DynBuf;
use crate::http::chunked::encode_chunk;
use crate::http::error::HttpError;
use crate::http::parser::CRLF;
use crate::http::response::{Response, ResponseBody, StatusCode};
use crate::http::socket::Socket;

const HTTP_VERSION: &str = "HTTP/1.1";

fn serialize_head(status: StatusCode, headers: &[(String, String)]) -> Vec<u8> {
    let mut buf = Vec::new();

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        status.as_u16(),
        status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    // Headers
    for (k, v) in headers {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(CRLF);
    }

    // Header/body separator
    buf.extend_from_slice(CRLF);

    buf
}

/// Serializes one response head and streams a body behind it.
#[derive(Debug)]
pub struct ResponseWriter {
    head: Vec<u8>,
    chunked: bool,
}

impl ResponseWriter {
    /// Appends the single framing header to `headers` and serializes the
    /// head: `Content-Length` when `length` is known, chunked otherwise.
    pub fn new(status: StatusCode, headers: &mut Vec<(String, String)>, length: Option<u64>) -> Self {
        let chunked = match length {
            Some(n) => {
                headers.push(("Content-Length".to_string(), n.to_string()));
                false
            }
            None => {
                headers.push(("Transfer-Encoding".to_string(), "chunked".to_string()));
                true
            }
        };

        Self {
            head: serialize_head(status, headers),
            chunked,
        }
    }

    pub fn head(&self) -> &[u8] {
        &self.head
    }

    /// Writes the head in one write, then the body until it reads empty.
    ///
    /// Empty slices are never written, except that chunked framing always
    /// ends with the zero-size chunk. Closing `body` is the caller's job.
    pub async fn write_to_stream<S: AsyncRead + AsyncWrite + Unpin>(
        &self,
        socket: &mut Socket<S>,
        buf: &mut DynBuf,
        body: &mut BodyReader,
    ) -> Result<(), HttpError> {
        socket.write(&self.head).await?;

        loop {
            let data = body.read(socket, buf).await?;
            let last = data.is_empty();

            if self.chunked {
                socket.write(&encode_chunk(&data)).await?;
            } else if !last {
                socket.write(&data).await?;
            }
            trace!(bytes = data.len(), chunked = self.chunked, "body slice written");

            if last {
                return Ok(());
            }
        }
    }
}

/// Sends `response`, streaming either its own body or, for echo responses,
/// the request body.
pub async fn write_response<S: AsyncRead + AsyncWrite + Unpin>(
    socket: &mut Socket<S>,
    buf: &mut DynBuf,
    response: &mut Response,
    request_body: &mut BodyReader,
) -> Result<(), HttpError> {
    let body = match &mut response.body {
        ResponseBody::Reader(reader) => reader,
        ResponseBody::Request => request_body,
    };

    let writer = ResponseWriter::new(response.status, &mut response.headers, body.length());
    writer.write_to_stream(socket, buf, body).await
}
