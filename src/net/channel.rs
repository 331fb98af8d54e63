//! Lock-step request/reply on top of a [`Transport`].
//!
//! Exactly one request may be outstanding. Sending a second request before
//! the first reply has been read, or reading a reply that was never asked
//! for, is refused instead of letting envelopes interleave. A channel whose
//! request was abandoned half-way (send failure, receive failure, timeout)
//! can't tell which reply belongs to whom anymore and refuses all further use.

use std::time::Duration;

use bytes::Bytes;

use crate::net::{Transport, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    AwaitingReply,
    Broken,
}

/// ```
/// # tokio_test::block_on(async {
/// use bytes::Bytes;
/// use faas::net::{channel::ReqChannel, connection::DuplexConnection};
///
/// let (client, mut engine) = DuplexConnection::in_memory();
/// let mut channel = ReqChannel::new(client);
///
/// channel.send_request(Bytes::from_static(b"ping")).await.unwrap();
/// let msg = engine.recv().await.unwrap();
/// engine.send(msg.freeze()).await.unwrap();
///
/// let reply = channel.recv_reply().await.unwrap();
/// assert_eq!(&reply[..], b"ping");
/// # })
/// ```
pub struct ReqChannel<T: Transport> {
    transport: T,
    state: State,
}

impl<T: Transport> ReqChannel<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            state: State::Idle,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state == State::Idle
    }

    pub fn is_broken(&self) -> bool {
        self.state == State::Broken
    }

    /// Send a request. The channel must be idle.
    pub async fn send_request(&mut self, msg: Bytes) -> Result<(), TransportError> {
        match self.state {
            State::Idle => {}
            State::AwaitingReply => {
                return Err(TransportError::OutOfOrder("a request is already in flight"))
            }
            State::Broken => return Err(TransportError::Broken),
        }
        // Anything short of a completed send leaves the engine in an unknown state.
        self.state = State::Broken;
        self.transport.send(msg).await.map_err(Into::<TransportError>::into)?;
        self.state = State::AwaitingReply;
        Ok(())
    }

    /// Wait for the reply to the outstanding request.
    pub async fn recv_reply(&mut self) -> Result<Bytes, TransportError> {
        match self.state {
            State::AwaitingReply => {}
            State::Idle => return Err(TransportError::OutOfOrder("no request in flight")),
            State::Broken => return Err(TransportError::Broken),
        }
        self.state = State::Broken;
        let reply = self.transport.recv().await.map_err(Into::<TransportError>::into)?;
        self.state = State::Idle;
        Ok(reply)
    }

    /// Send a request and wait for its reply.
    pub async fn request(&mut self, msg: Bytes) -> Result<Bytes, TransportError> {
        self.send_request(msg).await?;
        self.recv_reply().await
    }

    /// Like [`Self::request`], but give up after `timeout`.
    ///
    /// A late reply can't be matched to anything, so giving up breaks the channel.
    pub async fn request_timeout(
        &mut self,
        msg: Bytes,
        timeout: Duration,
    ) -> Result<Bytes, TransportError> {
        let reply = tokio::time::timeout(timeout, self.request(msg)).await;
        match reply {
            Ok(reply) => reply,
            Err(elapsed) => {
                self.state = State::Broken;
                Err(TransportError::TimedOut(elapsed))
            }
        }
    }

    pub async fn close(self) -> Result<(), TransportError> {
        self.transport.close().await.map_err(Into::into)
    }
}
