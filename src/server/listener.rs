use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{Instrument, info, info_span, warn};

use crate::config::Config;
use crate::http::connection::Connection;
use crate::router::Router;

pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&cfg.listen_addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    serve(listener, cfg).await
}

/// Accepts forever, one task per connection. An accept error is fatal.
pub async fn serve(listener: TcpListener, cfg: &Config) -> anyhow::Result<()> {
    let router = Arc::new(Router::new(cfg));

    loop {
        let (socket, peer) = listener.accept().await?;
        info!("Accepted connection from {}", peer);
        if let Err(e) = socket.set_nodelay(true) {
            warn!("Could not disable Nagle for {}: {}", peer, e);
        }

        let conn = Connection::new(socket, Arc::clone(&router), cfg.max_head_size);
        tokio::spawn(
            async move {
                if let Err(e) = conn.run().await {
                    tracing::debug!("Connection from {} ended with error: {}", peer, e);
                }
            }
            .instrument(info_span!("conn", %peer)),
        );
    }
}
