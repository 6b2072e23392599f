//! Handspun - HTTP/1.1 over raw TCP
//!
//! Byte buffering, message framing, header parsing, and chunked bodies are
//! all done here on top of a plain tokio socket, without an HTTP library.

pub mod config;
pub mod http;
pub mod router;
pub mod server;
