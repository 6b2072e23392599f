use bytes::Bytes;

use crate::http::error::HttpError;

/// HTTP request methods.
///
/// Any other token on the request line is answered with 501.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// POST - Create or submit data
    POST,
    /// PUT - Replace a resource
    PUT,
    /// PATCH - Partial modification of a resource
    PATCH,
    /// DELETE - Delete a resource
    DELETE,
    /// OPTIONS - Describe communication options
    OPTIONS,
    /// TRACE - Loop the request back
    TRACE,
}

impl Method {
    /// Parses an HTTP method from a string.
    ///
    /// # Arguments
    ///
    /// * `s` - String representation of the method (case-sensitive, uppercase)
    ///
    /// # Returns
    ///
    /// `Some(Method)` if the string matches a known method, `None` otherwise.
    ///
    /// # Example
    ///
    /// ```
    /// # use handspun::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("get"), None);
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            "HEAD" => Some(Method::HEAD),
            "POST" => Some(Method::POST),
            "PUT" => Some(Method::PUT),
            "PATCH" => Some(Method::PATCH),
            "DELETE" => Some(Method::DELETE),
            "OPTIONS" => Some(Method::OPTIONS),
            "TRACE" => Some(Method::TRACE),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::PATCH => "PATCH",
            Method::DELETE => "DELETE",
            Method::OPTIONS => "OPTIONS",
            Method::TRACE => "TRACE",
        }
    }

    /// `GET` and `HEAD` must not carry a request body.
    pub fn allows_body(&self) -> bool {
        !matches!(self, Method::GET | Method::HEAD)
    }
}

/// Parsed request line plus raw header lines.
///
/// Header lines are kept verbatim and in arrival order; duplicates are not
/// merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// Raw request target bytes (e.g. `/index.html?x=1`)
    pub uri: Bytes,
    /// Protocol version with the `HTTP/` prefix stripped (e.g. `1.1`)
    pub version: String,
    /// Header lines, without their line terminators
    pub headers: Vec<Bytes>,
}

/// Builder for constructing request heads without going through the parser.
#[derive(Debug)]
pub struct RequestBuilder {
    method: Option<Method>,
    uri: Option<Bytes>,
    version: Option<String>,
    headers: Vec<Bytes>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: None,
            uri: None,
            version: None,
            headers: Vec::new(),
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn uri(mut self, uri: impl Into<Bytes>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Appends a header line as `Name: value`.
    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.headers.push(Bytes::from(format!("{key}: {value}")));
        self
    }

    pub fn build(self) -> Result<RequestHead, &'static str> {
        Ok(RequestHead {
            method: self.method.ok_or("method missing")?,
            uri: self.uri.ok_or("uri missing")?,
            version: self.version.unwrap_or_else(|| "1.1".to_string()),
            headers: self.headers,
        })
    }
}

impl RequestHead {
    /// Retrieves a header value by name.
    ///
    /// The name is compared case-insensitively against the text before the
    /// first `:` of each line. The first matching line wins and its value is
    /// returned with surrounding whitespace trimmed.
    pub fn header(&self, key: &str) -> Option<&[u8]> {
        self.headers.iter().find_map(|line| {
            let colon = line.iter().position(|b| *b == b':')?;
            let (name, value) = line.split_at(colon);
            name.trim_ascii()
                .eq_ignore_ascii_case(key.as_bytes())
                .then(|| value[1..].trim_ascii())
        })
    }

    /// Parses the `Content-Length` header, if present.
    ///
    /// Anything but a non-negative decimal integer is a 400.
    pub fn content_length(&self) -> Result<Option<u64>, HttpError> {
        let Some(raw) = self.header("Content-Length") else {
            return Ok(None);
        };

        std::str::from_utf8(raw)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Some)
            .ok_or_else(|| HttpError::bad_request("Invalid content length"))
    }

    /// True when `Transfer-Encoding` is exactly `chunked`, ignoring case.
    pub fn is_chunked(&self) -> bool {
        self.header("Transfer-Encoding")
            .is_some_and(|v| v.eq_ignore_ascii_case(b"chunked"))
    }

    /// HTTP/1.0 clients get their connection closed after one response.
    pub fn closes_after_response(&self) -> bool {
        self.version == "1.0"
    }

    /// The request target as text, with invalid UTF-8 replaced.
    pub fn uri_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.uri)
    }
}
