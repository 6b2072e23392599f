//! HTTP/1.1 protocol engine.
//!
//! Everything between the raw TCP socket and the router lives here.
//!
//! # Architecture
//!
//! The HTTP layer is organized into several submodules, leaves first:
//!
//! - **`buffer`**: growable byte accumulator with in-place compaction
//! - **`socket`**: sequential, one-read-at-a-time facade over the transport
//! - **`parser`**: finds and parses request heads in the buffer
//! - **`request`**: request head representation and header lookup
//! - **`body`**: the uniform body reader and its variants
//! - **`chunked`**: chunked transfer-coding, decode and encode
//! - **`response`**: status codes and response representation
//! - **`writer`**: picks the framing and streams a response out
//! - **`connection`**: the per-connection request/response state machine
//! - **`error`**: protocol, internal, and transport failures
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌──────────────────┐
//!        │   AwaitingHead   │ ← Accumulate bytes until a full head is buffered
//!        └──────┬───────────┘
//!               │ Head framed and parsed
//!               ▼
//!        ┌──────────────────┐
//!        │   HeadParsed     │ ← Pick the request body reader, route
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │  BodyDispatched  │ ← Write head, stream body
//!        └──────┬───────────┘
//!               │ Response sent
//!               ▼
//!        ┌──────────────────┐
//!        │  ResponseSent    │
//!        └──────┬───────────┘
//!               ├─ HTTP/1.1 → drain request body → AwaitingHead
//!               └─ HTTP/1.0 → Closed
//! ```
//!
//! Any error leaves the machine. Protocol errors are answered with a
//! best-effort error response; transport errors are not. The socket is
//! closed either way.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use handspun::config::Config;
//! use handspun::http::connection::Connection;
//! use handspun::router::Router;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cfg = Config::default();
//!     let router = Arc::new(Router::new(&cfg));
//!     let listener = TcpListener::bind("127.0.0.1:3000").await?;
//!
//!     loop {
//!         let (socket, _addr) = listener.accept().await?;
//!         let conn = Connection::new(socket, Arc::clone(&router), cfg.max_head_size);
//!         tokio::spawn(async move {
//!             if let Err(e) = conn.run().await {
//!                 eprintln!("Connection error: {}", e);
//!             }
//!         });
//!     }
//! }
//! ```

pub mod body;
pub mod buffer;
pub mod chunked;
pub mod connection;
pub mod error;
pub mod parser;
pub mod request;
pub mod response;
pub mod socket;
pub mod writer;
