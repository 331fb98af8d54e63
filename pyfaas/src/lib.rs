use std::{sync::Mutex, time::Duration};

use faas::{
    client::blocking,
    config::{ClientConfig, EngineAddress, RuntimeKind},
    net::zmq::ZmqTransport,
    TaskRequest,
};
use pyo3::{
    exceptions::{PyIOError, PyRuntimeError, PyValueError},
    prelude::*,
};

/// A value or a row of values. `None` is a value only the other party knows.
#[derive(FromPyObject)]
enum Entry {
    Many(Vec<Option<f64>>),
    One(Option<f64>),
}

impl Entry {
    fn into_row(self) -> Vec<Option<f64>> {
        match self {
            Entry::Many(row) => row,
            Entry::One(value) => vec![value],
        }
    }
}

fn to_py(err: faas::Error) -> PyErr {
    match err {
        faas::Error::Transport(_) | faas::Error::Runtime(_) => PyIOError::new_err(err.to_string()),
        _ => PyValueError::new_err(err.to_string()),
    }
}

#[pyclass(frozen)]
struct Faas(Mutex<Option<blocking::Client<ZmqTransport>>>);

impl Faas {
    fn with_client<T>(
        &self,
        f: impl FnOnce(&mut blocking::Client<ZmqTransport>) -> Result<T, faas::Error>,
    ) -> PyResult<T> {
        let mut client = self
            .0
            .lock()
            .map_err(|_| PyRuntimeError::new_err("Client lock poisoned"))?;
        let client = client
            .as_mut()
            .ok_or_else(|| PyIOError::new_err("Connection is closed"))?;
        f(client).map_err(to_py)
    }
}

#[pymethods]
impl Faas {
    /// Fit `y` on the rows of `x`, returning the coefficients
    ///
    /// * `x`: one row of features per sample
    /// * `y`: one target per sample
    fn linreg(
        &self,
        py: Python<'_>,
        x: Vec<Vec<Option<f64>>>,
        y: Vec<Option<f64>>,
    ) -> PyResult<Vec<f64>> {
        py.allow_threads(|| self.with_client(|c| c.linear_regression(x, y)))
    }

    /// Two-sample t-test, returning the t statistic
    fn ttest(&self, py: Python<'_>, x: Vec<Option<f64>>, y: Vec<Option<f64>>) -> PyResult<f64> {
        py.allow_threads(|| self.with_client(|c| c.ttest(x, y)))
    }

    /// Train a neural network, returning one `(weights, bias)` pair per layer
    ///
    /// * `x`: one row of features per sample
    /// * `y`: one label, or one row of labels, per sample
    /// * `weights`: one matrix per layer, each row a list or a single value
    /// * `biases`: one bias vector, or a single bias, per layer
    #[pyo3(signature = (x, y, weights, biases, categories=2, epochs=1, learningrate=1.0))]
    #[allow(clippy::too_many_arguments)]
    fn neuralnetwork(
        &self,
        py: Python<'_>,
        x: Vec<Vec<Option<f64>>>,
        y: Vec<Entry>,
        weights: Vec<Vec<Entry>>,
        biases: Vec<Entry>,
        categories: u32,
        epochs: u32,
        learningrate: f64,
    ) -> PyResult<Vec<(Vec<Vec<f64>>, Vec<f64>)>> {
        if weights.len() != biases.len() {
            return Err(PyValueError::new_err(format!(
                "Got {} weight matrices but {} biases",
                weights.len(),
                biases.len()
            )));
        }
        let network = weights.into_iter().zip(biases).fold(
            TaskRequest::neural_network()
                .features(x)
                .labels(y.into_iter().map(Entry::into_row))
                .categories(categories)
                .epochs(epochs)
                .learning_rate(learningrate),
            |network, (w, b)| network.layer(w.into_iter().map(Entry::into_row), b.into_row()),
        );
        let layers = py.allow_threads(|| self.with_client(|c| c.neural_network(network)))?;
        Ok(layers
            .into_iter()
            .map(|layer| (layer.weights, layer.bias))
            .collect())
    }

    /// Close the connection to the engine
    fn close(&self, py: Python<'_>) -> PyResult<()> {
        let client = self
            .0
            .lock()
            .map_err(|_| PyRuntimeError::new_err("Client lock poisoned"))?
            .take();
        match client {
            Some(client) => py.allow_threads(|| client.shutdown()).map_err(to_py),
            None => Ok(()),
        }
    }
}

/// Connect a ZeroMQ `REQ` socket to the engine at `tcp://<host>:<port>`
///
/// * `port`: engine port
/// * `host`: engine host
/// * `timeout_ms`: (optional) give up on connecting and on replies after this
///   many milliseconds
/// * `multithreaded`: use a multithreaded runtime
#[pyfunction]
#[pyo3(signature = (port, host="localhost", timeout_ms=None, multithreaded=false))]
fn connect(
    py: Python<'_>,
    port: u16,
    host: &str,
    timeout_ms: Option<u64>,
    multithreaded: bool,
) -> PyResult<Faas> {
    let mut config = ClientConfig::new(EngineAddress::new(host, port));
    if let Some(ms) = timeout_ms {
        config = config.with_timeout(Duration::from_millis(ms));
    }
    if multithreaded {
        config = config.with_runtime(RuntimeKind::MultiThreaded);
    }
    let client = py
        .allow_threads(|| blocking::Client::connect(&config))
        .map_err(to_py)?;
    Ok(Faas(Mutex::new(Some(client))))
}

/// A Python module implemented in Rust.
#[pymodule]
fn pyfaas(m: &Bound<'_, PyModule>) -> PyResult<()> {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::from_default_env();
    // Another extension may already have installed a subscriber.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    m.add_function(wrap_pyfunction!(connect, m)?)?;
    m.add_class::<Faas>()?;
    Ok(())
}
