use bytes::Bytes;
use thiserror::Error;
use tokio::io::AsyncRead;
use tracing::debug;

use crate::http::buffer::DynBuf;
use crate::http::error::HttpError;
use crate::http::request::{Method, RequestHead};
use crate::http::socket::Socket;

pub const CRLF: &[u8] = b"\r\n";
pub const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Largest unparsed head we are willing to buffer (same as Apache).
pub const MAX_HEAD_SIZE: usize = 8 * 1024;

const VERSION_PREFIX: &str = "HTTP/";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed request line")]
    InvalidRequestLine,
    #[error("unsupported method: {0}")]
    InvalidMethod(String),
    #[error("invalid protocol version")]
    InvalidVersion,
}

impl From<ParseError> for HttpError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::InvalidMethod(_) => HttpError::not_implemented(err.to_string()),
            _ => HttpError::bad_request(err.to_string()),
        }
    }
}

/// Reads from `socket` until a complete request head sits in `buf`.
///
/// Returns `Ok(None)` when the peer closes cleanly between requests. Bytes
/// after the head stay in `buf` for the body reader or the next request.
pub async fn read_request_head<S: AsyncRead + Unpin>(
    socket: &mut Socket<S>,
    buf: &mut DynBuf,
    max_head_size: usize,
) -> Result<Option<RequestHead>, HttpError> {
    loop {
        if let Some(head) = cut_message(buf, max_head_size)? {
            return Ok(Some(head));
        }

        let data = socket.read().await?;
        if data.is_empty() {
            if buf.is_empty() {
                return Ok(None);
            }
            return Err(HttpError::unexpected_eof());
        }
        buf.push(&data);
    }
}

/// Splits one complete head off the front of `buf`, if there is one.
pub fn cut_message(buf: &mut DynBuf, max_head_size: usize) -> Result<Option<RequestHead>, HttpError> {
    let Some(idx) = buf.find(HEAD_TERMINATOR) else {
        if buf.len() >= max_head_size {
            return Err(HttpError::headers_too_large());
        }
        return Ok(None);
    };

    let end = idx + HEAD_TERMINATOR.len();
    let head = parse_request_head(&buf.as_slice()[..end])?;
    buf.pop(end);

    debug!(method = head.method.as_str(), uri = %head.uri_str(), version = %head.version, "request head parsed");
    Ok(Some(head))
}

/// Parses a head that ends with the blank-line terminator.
pub fn parse_request_head(bytes: &[u8]) -> Result<RequestHead, ParseError> {
    let bytes = bytes.strip_suffix(HEAD_TERMINATOR).unwrap_or(bytes);
    let mut lines = split_lines(bytes);

    let request_line = lines.next().ok_or(ParseError::InvalidRequestLine)?;
    let (method, uri, version) = parse_request_line(request_line)?;

    // Header lines are stored as-is; lookup does the splitting.
    let headers = lines.map(Bytes::copy_from_slice).collect();

    Ok(RequestHead {
        method,
        uri: Bytes::copy_from_slice(uri),
        version,
        headers,
    })
}

fn parse_request_line(line: &[u8]) -> Result<(Method, &[u8], String), ParseError> {
    let parts: Vec<&[u8]> = line.split(|b| *b == b' ').collect();
    let [method, uri, version] = parts[..] else {
        return Err(ParseError::InvalidRequestLine);
    };

    if uri.is_empty() {
        return Err(ParseError::InvalidRequestLine);
    }

    let method = std::str::from_utf8(method).map_err(|_| ParseError::InvalidRequestLine)?;
    let method = Method::from_str(method).ok_or_else(|| ParseError::InvalidMethod(method.to_string()))?;

    let version = std::str::from_utf8(version)
        .ok()
        .and_then(|v| v.strip_prefix(VERSION_PREFIX))
        .filter(|v| !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit() || b == b'.'))
        .ok_or(ParseError::InvalidVersion)?;

    Ok((method, uri, version.to_string()))
}

fn split_lines(bytes: &[u8]) -> impl Iterator<Item = &[u8]> {
    let mut rest = Some(bytes);
    std::iter::from_fn(move || {
        let current = rest?;
        match current.windows(CRLF.len()).position(|w| w == CRLF) {
            Some(idx) => {
                rest = Some(&current[idx + CRLF.len()..]);
                Some(&current[..idx])
            }
            None => {
                rest = None;
                Some(current)
            }
        }
    })
}
