//! ZeroMQ `REQ` socket transport, the way engines are reached.
//!
//! The engine binds a `REP` socket, so framing and the request/reply
//! discipline are ZMTP's; this only moves whole messages in and out.
//! A multipart reply is joined back into one message.

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures::Future;
use zeromq::{ReqSocket, Socket, SocketRecv, SocketSend, ZmqError, ZmqMessage};

use crate::net::{Transport, TransportError};

pub struct ZmqTransport {
    socket: ReqSocket,
}

impl ZmqTransport {
    /// Connect a `REQ` socket to `endpoint`, e.g. `tcp://localhost:5556`.
    pub async fn connect(endpoint: &str) -> Result<Self, TransportError> {
        let mut socket = ReqSocket::new();
        socket
            .connect(endpoint)
            .await
            .map_err(|e| TransportError::Connect {
                address: endpoint.to_owned(),
                source: e.to_string().into(),
            })?;
        Ok(Self { socket })
    }

    /// Like [`ZmqTransport::connect`], giving up after `timeout`.
    ///
    /// A refused connection is retried until then, so an engine that is still
    /// starting up can be waited for.
    pub async fn connect_timeout(endpoint: &str, timeout: Duration) -> Result<Self, TransportError> {
        tokio::time::timeout(timeout, Self::connect(endpoint))
            .await
            .map_err(|elapsed| TransportError::Connect {
                address: endpoint.to_owned(),
                source: Box::new(elapsed),
            })?
    }
}

impl From<ZmqError> for TransportError {
    fn from(err: ZmqError) -> Self {
        TransportError::Io(err.to_string().into())
    }
}

impl Transport for ZmqTransport {
    type Error = ZmqError;

    fn send(&mut self, msg: Bytes) -> impl Future<Output = Result<(), Self::Error>> + Send {
        self.socket.send(ZmqMessage::from(msg))
    }

    async fn recv(&mut self) -> Result<Bytes, Self::Error> {
        let frames = self.socket.recv().await?.into_vec();
        if let [frame] = &frames[..] {
            return Ok(frame.clone());
        }
        let mut buf = BytesMut::new();
        for frame in frames {
            buf.extend_from_slice(&frame);
        }
        Ok(buf.freeze())
    }

    async fn close(self) -> Result<(), Self::Error> {
        let errors = self.socket.close().await;
        for err in &errors {
            tracing::warn!("Error while closing socket: {err}");
        }
        Ok(())
    }
}
