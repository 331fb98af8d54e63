use std::{sync::mpsc, thread, time::Duration};

use faas::{
    client::blocking,
    config::{ClientConfig, EngineAddress, RuntimeKind},
    proto::{LinearRegressionOutput, Matrix, NeuralNetworkOutput, TTestOutput, Vector},
    Error, TaskRequest, TaskResponse,
};
use prost::Message;
use zeromq::{RepSocket, Socket, SocketRecv, SocketSend, ZmqMessage};

/// Bind a `REP` engine on a fresh port and answer `requests` requests with
/// `handler`, the way the engine service does.
fn spawn_engine<H>(requests: usize, mut handler: H) -> (EngineAddress, thread::JoinHandle<usize>)
where
    H: FnMut(TaskRequest) -> TaskResponse + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let engine = thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let mut socket = RepSocket::new();
            let endpoint = socket.bind("tcp://127.0.0.1:0").await.unwrap();
            tx.send(endpoint.to_string()).unwrap();
            for _ in 0..requests {
                let msg = socket.recv().await.unwrap();
                let request = TaskRequest::decode(&msg.into_vec().concat()).unwrap();
                let reply = handler(request).into_envelope().encode_to_vec();
                socket.send(ZmqMessage::from(reply)).await.unwrap();
            }
            requests
        })
    });
    let address = rx.recv().unwrap().parse().unwrap();
    (address, engine)
}

#[test]
fn linear_regression_over_zmq() {
    let (address, engine) = spawn_engine(2, |request| {
        assert!(matches!(request, TaskRequest::LinearRegression(_)));
        TaskResponse::LinearRegression(LinearRegressionOutput {
            beta: vec![1.5, -2.0],
        })
    });

    let config = ClientConfig::new(address);
    let mut client = blocking::Client::connect(&config).unwrap();
    let x = [[0.1, 0.2], [0.3, 0.4]];
    let beta = client.linear_regression(x, [None::<f64>, None]).unwrap();
    assert_eq!(beta, vec![1.5, -2.0]);
    let beta = client.linear_regression(x, [1.0, 2.0]).unwrap();
    assert_eq!(beta, vec![1.5, -2.0]);

    assert_eq!(engine.join().unwrap(), 2);
    client.shutdown().unwrap();
}

#[test]
fn neural_network_over_zmq() {
    let (address, engine) = spawn_engine(1, |request| {
        let TaskRequest::NeuralNetwork(input) = request else {
            panic!("engine got {request:?}");
        };
        let layers = input.network.unwrap_or_default().weights.len();
        TaskResponse::NeuralNetwork(NeuralNetworkOutput {
            weights: (0..layers)
                .map(|i| Matrix {
                    rows: vec![Vector {
                        value: vec![i as f64],
                    }],
                })
                .collect(),
            biases: (0..layers).map(|_| Vector { value: vec![0.0] }).collect(),
        })
    });

    let config = ClientConfig::new(address);
    let mut client = blocking::Client::connect(&config).unwrap();
    let network = TaskRequest::neural_network()
        .features([[0.0, 1.0], [1.0, 0.0]])
        .scalar_labels([None::<f64>, None])
        .layer([[0.5, 0.5], [0.5, 0.5]], [0.0, 0.0])
        .column_layer([0.5, 0.5], 0.0);
    let layers = client.neural_network(network).unwrap();
    assert_eq!(layers.len(), 2);
    assert_eq!(layers[1].weights, vec![vec![1.0]]);

    assert_eq!(engine.join().unwrap(), 1);
    client.shutdown().unwrap();
}

#[test]
fn multi_threaded_runtime_from_json() {
    let (address, engine) = spawn_engine(1, |_| {
        TaskResponse::TTest(TTestOutput {
            t: std::f64::consts::PI,
        })
    });

    let json = format!(
        r#"{{ "address": "{address}", "timeout_ms": 5000, "runtime": "multi_threaded" }}"#
    );
    let config = ClientConfig::from_json(&json).unwrap();
    assert_eq!(config.runtime, RuntimeKind::MultiThreaded);
    assert_eq!(config.timeout(), Some(Duration::from_secs(5)));

    let mut client = blocking::Client::connect(&config).unwrap();
    let t = client
        .ttest([Some(1.0), Some(2.0), None], [2.0, 3.0, 4.0])
        .unwrap();
    assert_eq!(t, std::f64::consts::PI);

    assert_eq!(engine.join().unwrap(), 1);
    client.shutdown().unwrap();
}

#[test]
fn nobody_listening() {
    // Bind and drop to find a port that is very likely closed.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let config = ClientConfig::new(EngineAddress::new("127.0.0.1", port))
        .with_timeout(Duration::from_millis(300));
    let err = blocking::Client::connect(&config).err().unwrap();
    assert!(matches!(
        err,
        Error::Transport(faas::net::TransportError::Connect { .. })
    ));
}
