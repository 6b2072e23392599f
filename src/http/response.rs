use bytes::Bytes;

use crate::http::body::BodyReader;

/// HTTP status codes the server can answer with.
///
/// - `Ok` (200): Request successful
/// - `BadRequest` (400): Malformed request or body framing
/// - `NotFound` (404): Resource not found
/// - `PayloadTooLarge` (413): Request head exceeded the size limit
/// - `InternalServerError` (500): Server fault
/// - `NotImplemented` (501): Unsupported method or body framing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 404 Not Found
    NotFound,
    /// 413 Payload Too Large
    PayloadTooLarge,
    /// 500 Internal Server Error
    InternalServerError,
    /// 501 Not Implemented
    NotImplemented,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use handspun::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotImplemented.as_u16(), 501);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::PayloadTooLarge => 413,
            StatusCode::InternalServerError => 500,
            StatusCode::NotImplemented => 501,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use handspun::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::PayloadTooLarge => "Payload Too Large",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::NotImplemented => "Not Implemented",
        }
    }
}

/// Where a response body comes from.
#[derive(Debug)]
pub enum ResponseBody {
    /// A reader owned by the response.
    Reader(BodyReader),
    /// Stream the request body straight back to the client.
    Request,
}

/// A response head plus its body source.
///
/// Headers keep insertion order and may repeat. The framing header
/// (`Content-Length` or `Transfer-Encoding`) is added by the writer and
/// must not be set here.
#[derive(Debug)]
pub struct Response {
    /// The HTTP status code
    pub status: StatusCode,
    /// Header name/value pairs, in order
    pub headers: Vec<(String, String)>,
    pub body: ResponseBody,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```ignore
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .header("Content-Type", "text/plain")
///     .body(BodyReader::from_memory("hi\n"))
///     .build();
/// ```
#[derive(Debug)]
pub struct ResponseBuilder {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: ResponseBody,
}

impl ResponseBuilder {
    /// Creates a new response builder with an empty in-memory body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: ResponseBody::Reader(BodyReader::from_memory(Bytes::new())),
        }
    }

    /// Appends a header. Earlier headers with the same name are kept.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Sets the response body.
    pub fn body(mut self, body: BodyReader) -> Self {
        self.body = ResponseBody::Reader(body);
        self
    }

    /// Echoes the request body back as the response body.
    pub fn echo(mut self) -> Self {
        self.body = ResponseBody::Request;
        self
    }

    pub fn build(self) -> Response {
        Response {
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }
}

impl Response {
    /// Creates a simple 200 OK response with an in-memory body.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        ResponseBuilder::new(StatusCode::Ok)
            .body(BodyReader::from_memory(body))
            .build()
    }

    /// Creates a 404 Not Found response.
    pub fn not_found() -> Self {
        Self::status_only(StatusCode::NotFound)
    }

    /// Body is the bare reason phrase.
    pub fn status_only(status: StatusCode) -> Self {
        ResponseBuilder::new(status)
            .body(BodyReader::from_memory(status.reason_phrase()))
            .build()
    }

    /// Error response sent before closing a failed connection: the
    /// message followed by a newline.
    pub fn error(status: StatusCode, message: &str) -> Self {
        ResponseBuilder::new(status)
            .body(BodyReader::from_memory(format!("{message}\n")))
            .build()
    }

    /// Releases whatever the response body holds open.
    pub async fn close(&mut self) {
        if let ResponseBody::Reader(reader) = &mut self.body {
            reader.close().await;
        }
    }
}
