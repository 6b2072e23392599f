use std::io;

use thiserror::Error;

use crate::http::response::StatusCode;

/// Everything that can end a connection early.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Client-caused failure. Answered with `status` and `message`, then
    /// the connection is closed.
    #[error("{message}")]
    Protocol { status: StatusCode, message: String },

    /// A local fault, such as a file body that did not match its declared
    /// size. Answered with a 500.
    #[error("internal error: {reason}")]
    Internal { reason: String },

    /// The socket itself failed. Nothing more can be sent.
    #[error("transport error: {source}")]
    Transport {
        #[from]
        source: io::Error,
    },
}

impl HttpError {
    pub fn protocol(status: StatusCode, message: impl Into<String>) -> Self {
        HttpError::Protocol {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::protocol(StatusCode::BadRequest, message)
    }

    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::protocol(StatusCode::NotImplemented, message)
    }

    pub fn headers_too_large() -> Self {
        Self::protocol(StatusCode::PayloadTooLarge, "Headers are too large")
    }

    pub fn unexpected_eof() -> Self {
        Self::bad_request("Unexpected EOF")
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        HttpError::Internal {
            reason: reason.into(),
        }
    }

    /// Status to answer with, or `None` when no response can be sent.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HttpError::Protocol { status, .. } => Some(*status),
            HttpError::Internal { .. } => Some(StatusCode::InternalServerError),
            HttpError::Transport { .. } => None,
        }
    }
}
