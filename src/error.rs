use thiserror::Error;

use crate::{
    codec::ProtocolError, config::ConfigError, net::TransportError, request::RequestError,
};

/// Anything that can go wrong between building a request and reading its result.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to start the async runtime")]
    Runtime(#[source] std::io::Error),
}

impl Error {
    /// The engine answered, but not with what was asked for.
    pub fn is_protocol(&self) -> bool {
        matches!(self, Error::Protocol(_))
    }

    /// The client can't be used for further requests.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Transport(
                TransportError::Closed
                    | TransportError::Io(_)
                    | TransportError::TimedOut(_)
                    | TransportError::Broken
            )
        )
    }
}
