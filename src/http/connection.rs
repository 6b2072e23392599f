use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, error, warn};

use crate::http::body::BodyReader;
use crate::http::buffer::DynBuf;
use crate::http::error::HttpError;
use crate::http::parser::read_request_head;
use crate::http::request::RequestHead;
use crate::http::response::Response;
use crate::http::socket::Socket;
use crate::http::writer::write_response;
use crate::router::Router;

pub struct Connection<S> {
    socket: Socket<S>,
    buffer: DynBuf,
    router: Arc<Router>,
    max_head_size: usize,
    state: ConnectionState,
}

#[derive(Debug)]
pub enum ConnectionState {
    AwaitingHead,
    HeadParsed(RequestHead),
    BodyDispatched {
        head: RequestHead,
        request_body: BodyReader,
        response: Response,
    },
    ResponseSent {
        request_body: BodyReader,
        close: bool,
    },
    Closed,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Connection<S> {
    pub fn new(stream: S, router: Arc<Router>, max_head_size: usize) -> Self {
        Self {
            socket: Socket::new(stream),
            buffer: DynBuf::new(),
            router,
            max_head_size,
            state: ConnectionState::AwaitingHead,
        }
    }

    /// Serves requests until the peer leaves or something fails, then
    /// closes the socket. Protocol errors get a best-effort error response
    /// first; transport errors do not.
    pub async fn run(mut self) -> Result<(), HttpError> {
        let result = self.serve().await;

        if let Err(e) = &result {
            self.report(e).await;
        }

        self.socket.close().await;
        result
    }

    async fn serve(&mut self) -> Result<(), HttpError> {
        loop {
            self.state = match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::AwaitingHead => {
                    match read_request_head(&mut self.socket, &mut self.buffer, self.max_head_size).await? {
                        Some(head) => ConnectionState::HeadParsed(head),
                        None => ConnectionState::Closed,
                    }
                }

                ConnectionState::HeadParsed(head) => {
                    let request_body = BodyReader::from_request(&head)?;
                    let response = self.router.handle(&head).await;
                    ConnectionState::BodyDispatched {
                        head,
                        request_body,
                        response,
                    }
                }

                ConnectionState::BodyDispatched {
                    head,
                    mut request_body,
                    mut response,
                } => {
                    let written = write_response(
                        &mut self.socket,
                        &mut self.buffer,
                        &mut response,
                        &mut request_body,
                    )
                    .await;
                    response.close().await;
                    written?;

                    debug!(status = response.status.as_u16(), uri = %head.uri_str(), "response sent");
                    ConnectionState::ResponseSent {
                        request_body,
                        close: head.closes_after_response(),
                    }
                }

                ConnectionState::ResponseSent { close: true, .. } => ConnectionState::Closed,

                ConnectionState::ResponseSent {
                    mut request_body,
                    close: false,
                } => {
                    // Leftover body bytes would otherwise be read as the next head.
                    while !request_body.read(&mut self.socket, &mut self.buffer).await?.is_empty() {}
                    ConnectionState::AwaitingHead
                }

                ConnectionState::Closed => return Ok(()),
            };
        }
    }

    async fn report(&mut self, err: &HttpError) {
        let Some(status) = err.status() else {
            warn!(error = %err, "transport failure, dropping connection");
            return;
        };

        match err {
            HttpError::Internal { .. } => error!(error = %err, "internal failure while serving"),
            _ => warn!(status = status.as_u16(), error = %err, "protocol error"),
        }

        let message = match err {
            HttpError::Protocol { message, .. } => message.as_str(),
            _ => status.reason_phrase(),
        };
        let mut response = Response::error(status, message);
        let mut no_body = BodyReader::from_length(0);

        if let Err(e) = write_response(&mut self.socket, &mut self.buffer, &mut response, &mut no_body).await {
            debug!(error = %e, "could not deliver error response");
        }
        response.close().await;
    }
}
