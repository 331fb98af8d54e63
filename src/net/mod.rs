use std::error::Error;

use bytes::Bytes;
use futures::Future;
use thiserror::Error;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    time::error::Elapsed,
};

use crate::net::connection::{Connection, ConnectionError};

pub mod channel;
pub mod connection;
pub mod zmq;

/// A medium carrying whole messages to and from the engine.
///
/// Framing is the transport's business; callers only ever see complete
/// messages.
pub trait Transport {
    type Error: Into<TransportError>;

    /// Send one message
    ///
    /// * `msg`: serialized message
    fn send(&mut self, msg: Bytes) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Wait for the next message
    fn recv(&mut self) -> impl Future<Output = Result<Bytes, Self::Error>> + Send;

    /// Flush and release the underlying resources.
    fn close(self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

impl<R, W> Transport for Connection<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    type Error = ConnectionError;

    fn send(&mut self, msg: Bytes) -> impl Future<Output = Result<(), Self::Error>> + Send {
        Connection::send(self, msg)
    }

    async fn recv(&mut self) -> Result<Bytes, Self::Error> {
        Connection::recv(self).await.map(|buf| buf.freeze())
    }

    fn close(self) -> impl Future<Output = Result<(), Self::Error>> + Send {
        Connection::close(self)
    }
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Could not connect to {address}")]
    Connect {
        address: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    #[error("Engine closed the connection")]
    Closed,
    #[error("Transport failed")]
    Io(#[source] Box<dyn Error + Send + Sync>),
    #[error("No reply after {0}")]
    TimedOut(Elapsed),
    #[error("Channel used out of order: {0}")]
    OutOfOrder(&'static str),
    #[error("Channel is unusable after an abandoned request")]
    Broken,
}

impl From<ConnectionError> for TransportError {
    fn from(err: ConnectionError) -> Self {
        match err {
            ConnectionError::Closed => TransportError::Closed,
            ConnectionError::Io(e) => TransportError::Io(Box::new(e)),
        }
    }
}
