//! Maps a request target to a response.
//!
//! The connection loop hands every parsed head to [`Router::handle`] and
//! streams whatever body comes back.

pub mod listing;
pub mod static_files;

use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::config::{Config, SheepConfig};
use crate::http::body::BodyReader;
use crate::http::request::RequestHead;
use crate::http::response::{Response, ResponseBuilder, StatusCode};

pub use static_files::StaticFiles;

/// Value of the `Server` header on routed responses.
pub const SERVER_NAME: &str = concat!("handspun/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct Router {
    static_files: StaticFiles,
    sheep: SheepConfig,
}

impl Router {
    pub fn new(cfg: &Config) -> Self {
        Self {
            static_files: StaticFiles::new(cfg.static_files.clone()),
            sheep: cfg.sheep.clone(),
        }
    }

    pub async fn handle(&self, head: &RequestHead) -> Response {
        let uri = head.uri_str();

        if let Some(rest) = uri.strip_prefix(self.static_files.mount()) {
            return self.static_files.serve(rest).await;
        }

        let builder = ResponseBuilder::new(StatusCode::Ok).header("Server", SERVER_NAME);
        match uri.as_ref() {
            "/echo" => builder.echo().build(),
            "/sheep" => builder.body(self.count_sheep()).build(),
            _ => builder.body(BodyReader::from_memory("hello world\n")).build(),
        }
    }

    /// Streams `0\n`, `1\n`, ... one line per interval. Dropping the reader
    /// stops the producer at its next send.
    fn count_sheep(&self) -> BodyReader {
        let (tx, rx) = mpsc::channel::<Bytes>(1);
        let count = self.sheep.count;
        let interval = Duration::from_millis(self.sheep.interval_ms);

        tokio::spawn(async move {
            for i in 0..count {
                tokio::time::sleep(interval).await;
                if tx.send(Bytes::from(format!("{i}\n"))).await.is_err() {
                    break;
                }
            }
        });

        BodyReader::from_channel(rx)
    }
}
