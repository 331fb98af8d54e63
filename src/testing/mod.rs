//! Mock engines for exercising clients without a real MPC engine.

use prost::Message;
use tokio::task::JoinHandle;
use zeromq::{RepSocket, Socket, SocketRecv, SocketSend, ZmqMessage};

use crate::{
    config::EngineAddress, net::connection::DuplexConnection, proto::ServiceOutput,
    request::TaskRequest,
};

mod mock;

pub use mock::{canned, hang_up, identity};

/// Spawn an engine answering every request with `handler`.
///
/// The handler returning `None` makes the engine hang up instead of
/// replying. The engine stops once the client closes its end, yielding every
/// request it received, in order.
pub fn engine<H>(mut handler: H) -> (DuplexConnection, JoinHandle<Vec<TaskRequest>>)
where
    H: FnMut(TaskRequest) -> Option<ServiceOutput> + Send + 'static,
{
    let (client, mut server) = DuplexConnection::in_memory();
    let engine = tokio::spawn(async move {
        let mut seen = Vec::new();
        while let Ok(msg) = server.recv().await {
            let request = TaskRequest::decode(&msg).expect("engine got a malformed request");
            seen.push(request.clone());
            let Some(reply) = handler(request) else {
                break;
            };
            server
                .send(reply.encode_to_vec().into())
                .await
                .expect("client went away");
        }
        seen
    });
    (client, engine)
}

/// Bind a ZeroMQ `REP` engine on a free local port serving `requests` requests.
///
/// `REP` sockets never see the client leave, so the number of requests has
/// to be known up front. A handler returning `None` stops the engine early.
pub async fn rep_engine<H>(
    requests: usize,
    mut handler: H,
) -> (EngineAddress, JoinHandle<Vec<TaskRequest>>)
where
    H: FnMut(TaskRequest) -> Option<ServiceOutput> + Send + 'static,
{
    let mut socket = RepSocket::new();
    let endpoint = socket
        .bind("tcp://127.0.0.1:0")
        .await
        .expect("engine could not bind");
    let address = endpoint
        .to_string()
        .parse()
        .expect("engine bound to an odd endpoint");
    let engine = tokio::spawn(async move {
        let mut seen = Vec::new();
        for _ in 0..requests {
            let msg = socket.recv().await.expect("client went away");
            let request =
                TaskRequest::decode(&msg.into_vec().concat()).expect("engine got a malformed request");
            seen.push(request.clone());
            let Some(reply) = handler(request) else {
                break;
            };
            socket
                .send(ZmqMessage::from(reply.encode_to_vec()))
                .await
                .expect("client went away");
        }
        seen
    });
    (address, engine)
}
