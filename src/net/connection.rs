//! Framed byte connections in 'some' medium.
//!
//! The medium can be anything that implements `AsyncRead`/`AsyncWrite`.
//! Engines are reached over ZeroMQ (see [`crate::net::zmq`]); this is the
//! medium for in-process engines, with built-in in-memory duplex connections.
//!
//! Every message is one frame, prefixed with its length as a big-endian `u32`.
//! The connection knows nothing about the request/reply discipline on top;
//! see [`crate::net::channel`] for that.

use bytes::{Bytes, BytesMut};
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, DuplexStream, ReadHalf, WriteHalf};
use tokio_util::codec::{FramedRead, FramedWrite, LengthDelimitedCodec};

/// Largest frame accepted in either direction.
pub const MAX_FRAME_LENGTH: usize = 256 * 1024 * 1024;

pub struct Connection<R: AsyncRead + Unpin, W: AsyncWrite + Unpin> {
    reader: FramedRead<R, LengthDelimitedCodec>,
    writer: FramedWrite<W, LengthDelimitedCodec>,
}

#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("No message to receive")]
    Closed,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl<R: AsyncRead + Unpin, W: AsyncWrite + Unpin> Connection<R, W> {
    /// Construct a new connection from a reader and writer
    ///
    /// * `reader`: Reader to receive messages from
    /// * `writer`: Writer to send messages to
    pub fn new(reader: R, writer: W) -> Self {
        let codec = LengthDelimitedCodec::builder()
            .max_frame_length(MAX_FRAME_LENGTH)
            .new_codec();
        let reader = FramedRead::new(reader, codec.clone());
        let writer = FramedWrite::new(writer, codec);

        Connection { reader, writer }
    }

    /// Send a message, waiting until it is written out
    ///
    /// * `msg`: Message to send
    pub async fn send(&mut self, msg: Bytes) -> Result<(), ConnectionError> {
        self.writer.send(msg).await?;
        Ok(())
    }

    /// Receive a message waiting for arrival
    pub async fn recv(&mut self) -> Result<BytesMut, ConnectionError> {
        let buf = self.reader.next().await.ok_or(ConnectionError::Closed)??;
        Ok(buf)
    }

    /// Flush pending frames and shut down the writing side.
    pub async fn close(mut self) -> Result<(), ConnectionError> {
        SinkExt::<Bytes>::close(&mut self.writer).await?;
        Ok(())
    }
}

/// Connection to a in-memory data stream.
/// This always have a corresponding other connection in the same process.
pub type DuplexConnection = Connection<ReadHalf<DuplexStream>, WriteHalf<DuplexStream>>;
impl DuplexConnection {
    /// Construct a duplex/in-memory connection pair
    pub fn in_memory() -> (Self, Self) {
        let (s1, s2) = tokio::io::duplex(4096);

        let (r1, w1) = tokio::io::split(s1);
        let (r2, w2) = tokio::io::split(s2);

        (Self::new(r1, w1), Self::new(r2, w2))
    }
}
