//! One session with the engine.
//!
//! A [`Client`] owns its channel and performs exactly one round trip per
//! call. All calls take `&mut self`, so a session can't have two requests in
//! flight; independent sessions need independent clients.

use std::time::Duration;

use crate::{
    codec::scalar::IntoScalar,
    config::EngineAddress,
    net::{channel::ReqChannel, zmq::ZmqTransport, Transport},
    request::{NeuralNetworkBuilder, TaskRequest},
    response::{self, TaskOutput, TaskResponse, TrainedLayer},
    Error,
};

pub struct Client<T: Transport> {
    channel: ReqChannel<T>,
    timeout: Option<Duration>,
}

impl Client<ZmqTransport> {
    /// Connect a ZeroMQ `REQ` socket to the engine listening at `address`.
    pub async fn connect(address: &EngineAddress) -> Result<Self, Error> {
        let socket = ZmqTransport::connect(&address.to_string()).await?;
        tracing::info!(%address, "Connected to engine");
        Ok(Self::new(socket))
    }

    /// Connect with `timeout` bounding both the connection attempt and every
    /// later call.
    pub async fn connect_timeout(address: &EngineAddress, timeout: Duration) -> Result<Self, Error> {
        let socket = ZmqTransport::connect_timeout(&address.to_string(), timeout).await?;
        tracing::info!(%address, "Connected to engine");
        Ok(Self::new(socket).with_timeout(timeout))
    }
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T) -> Self {
        Self {
            channel: ReqChannel::new(transport),
            timeout: None,
        }
    }

    /// Give up on any reply that takes longer than `timeout`.
    ///
    /// A call that times out leaves the client unusable.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn is_broken(&self) -> bool {
        self.channel.is_broken()
    }

    /// Send `request` and wait for the engine's reply.
    #[tracing::instrument(skip_all, fields(task = %request.kind()))]
    pub async fn call(&mut self, request: TaskRequest) -> Result<TaskResponse, Error> {
        let msg = request.into_bytes();
        tracing::debug!(bytes = msg.len(), "Sending request");
        let reply = match self.timeout {
            Some(timeout) => self.channel.request_timeout(msg, timeout).await?,
            None => self.channel.request(msg).await?,
        };
        tracing::debug!(bytes = reply.len(), "Received reply");
        let response = TaskResponse::decode(&reply)?;
        Ok(response)
    }

    /// Like [`Self::call`], but also check and decode the result.
    pub async fn run(&mut self, request: TaskRequest) -> Result<TaskOutput, Error> {
        let kind = request.kind();
        let response = self.call(request).await?;
        Ok(response::decode(kind, response)?)
    }

    /// Fit `y` on the rows of `x`, returning the coefficients.
    pub async fn linear_regression<X, Y>(&mut self, x: X, y: Y) -> Result<Vec<f64>, Error>
    where
        X: IntoIterator,
        X::Item: IntoIterator,
        <X::Item as IntoIterator>::Item: IntoScalar,
        Y: IntoIterator,
        Y::Item: IntoScalar,
    {
        let response = self.call(TaskRequest::linear_regression(x, y)).await?;
        Ok(response::linear_regression(response)?)
    }

    /// Two-sample t-test, returning the t statistic.
    pub async fn ttest<X, Y>(&mut self, x: X, y: Y) -> Result<f64, Error>
    where
        X: IntoIterator,
        X::Item: IntoScalar,
        Y: IntoIterator,
        Y::Item: IntoScalar,
    {
        let response = self.call(TaskRequest::ttest(x, y)?).await?;
        Ok(response::ttest(response)?)
    }

    /// Train the network described by `network`, returning the trained layers.
    pub async fn neural_network(
        &mut self,
        network: NeuralNetworkBuilder,
    ) -> Result<Vec<TrainedLayer>, Error> {
        let response = self.call(network.build()?).await?;
        Ok(response::neural_network(response)?)
    }

    /// End the session, flushing and closing the transport.
    pub async fn close(self) -> Result<(), Error> {
        self.channel.close().await?;
        Ok(())
    }
}

/// Synchronous facade over [`Client`], driving it on its own tokio runtime.
pub mod blocking {
    use std::time::Duration;

    use tokio::runtime::Runtime;

    use crate::{
        codec::scalar::IntoScalar,
        config::{ClientConfig, RuntimeKind},
        net::{zmq::ZmqTransport, Transport},
        request::{NeuralNetworkBuilder, TaskRequest},
        response::{TaskOutput, TaskResponse, TrainedLayer},
        Error,
    };

    pub struct Client<T: Transport> {
        parent: super::Client<T>,
        runtime: Runtime,
    }

    pub(crate) fn runtime(kind: RuntimeKind) -> Result<Runtime, Error> {
        let mut builder = match kind {
            RuntimeKind::SingleThreaded => tokio::runtime::Builder::new_current_thread(),
            RuntimeKind::MultiThreaded => tokio::runtime::Builder::new_multi_thread(),
        };
        builder.enable_all().build().map_err(Error::Runtime)
    }

    impl Client<ZmqTransport> {
        /// Connect to the engine named in `config`, blocking until connected.
        ///
        /// Without a timeout a refused connection is retried forever.
        pub fn connect(config: &ClientConfig) -> Result<Self, Error> {
            let runtime = runtime(config.runtime)?;
            let parent = match config.timeout() {
                Some(timeout) => {
                    runtime.block_on(super::Client::connect_timeout(&config.address, timeout))?
                }
                None => runtime.block_on(super::Client::connect(&config.address))?,
            };
            Ok(Self { parent, runtime })
        }
    }

    impl<T: Transport> Client<T> {
        /// Drive an existing async client on `runtime`.
        pub fn from_parts(parent: super::Client<T>, runtime: Runtime) -> Self {
            Self { parent, runtime }
        }

        pub fn is_broken(&self) -> bool {
            self.parent.is_broken()
        }

        pub fn call(&mut self, request: TaskRequest) -> Result<TaskResponse, Error> {
            self.runtime.block_on(self.parent.call(request))
        }

        pub fn run(&mut self, request: TaskRequest) -> Result<TaskOutput, Error> {
            self.runtime.block_on(self.parent.run(request))
        }

        pub fn linear_regression<X, Y>(&mut self, x: X, y: Y) -> Result<Vec<f64>, Error>
        where
            X: IntoIterator,
            X::Item: IntoIterator,
            <X::Item as IntoIterator>::Item: IntoScalar,
            Y: IntoIterator,
            Y::Item: IntoScalar,
        {
            self.runtime.block_on(self.parent.linear_regression(x, y))
        }

        pub fn ttest<X, Y>(&mut self, x: X, y: Y) -> Result<f64, Error>
        where
            X: IntoIterator,
            X::Item: IntoScalar,
            Y: IntoIterator,
            Y::Item: IntoScalar,
        {
            self.runtime.block_on(self.parent.ttest(x, y))
        }

        pub fn neural_network(
            &mut self,
            network: NeuralNetworkBuilder,
        ) -> Result<Vec<TrainedLayer>, Error> {
            self.runtime.block_on(self.parent.neural_network(network))
        }

        /// Close the session and stop the runtime.
        pub fn shutdown(self) -> Result<(), Error> {
            let Self { parent, runtime } = self;
            let res = runtime.block_on(parent.close());
            runtime.shutdown_timeout(Duration::from_secs(5));
            res
        }
    }
}
