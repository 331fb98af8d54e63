//! Task requests and how they are assembled.
//!
//! A [`TaskRequest`] always carries exactly one task, so an envelope with no
//! task or with several can't be built. Requests are plain values: building
//! one does no I/O, and nothing about it changes once built.

use std::fmt;

use bytes::Bytes;
use prost::Message;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    codec::{scalar::IntoScalar, tensor, ProtocolError, ShapeError},
    proto::{
        service_input::Input, ActivationFunction, LinearRegressionInput, MpcMatrix, MpcVector,
        NeuralNetworkData, NeuralNetworkInput, NeuralNetworkParameters, ServiceInput, TTestInput,
    },
};

pub const DEFAULT_CATEGORIES: u32 = 2;
pub const DEFAULT_EPOCHS: u32 = 1;
pub const DEFAULT_LEARNING_RATE: f64 = 1.0;

/// Which computation an envelope carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    LinearRegression,
    TTest,
    NeuralNetwork,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskKind::LinearRegression => "linear-regression",
            TaskKind::TTest => "t-test",
            TaskKind::NeuralNetwork => "neural-network",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequestError {
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error("Invalid {name}: {value}")]
    InvalidHyperParameter { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskRequest {
    LinearRegression(LinearRegressionInput),
    TTest(TTestInput),
    NeuralNetwork(NeuralNetworkInput),
}

impl TaskRequest {
    /// Linear regression of `y` on the rows of `x`.
    ///
    /// One row of `x` per sample and one entry of `y` per sample is expected,
    /// but not enforced; the engine adds the intercept column itself.
    ///
    /// * `x`: samples, one row of features each
    /// * `y`: targets
    pub fn linear_regression<X, Y>(x: X, y: Y) -> Self
    where
        X: IntoIterator,
        X::Item: IntoIterator,
        <X::Item as IntoIterator>::Item: IntoScalar,
        Y: IntoIterator,
        Y::Item: IntoScalar,
    {
        let x = tensor::encode_matrix(x).rows;
        let y = tensor::encode_vector(y);
        if x.len() != y.values.len() {
            tracing::warn!(
                samples = x.len(),
                targets = y.values.len(),
                "Linear regression got a different number of samples and targets"
            );
        }
        TaskRequest::LinearRegression(LinearRegressionInput { x, y: Some(y) })
    }

    /// Two-sample t-test between `x` and `y`, which must be of equal length.
    pub fn ttest<X, Y>(x: X, y: Y) -> Result<Self, RequestError>
    where
        X: IntoIterator,
        X::Item: IntoScalar,
        Y: IntoIterator,
        Y::Item: IntoScalar,
    {
        let x = tensor::encode_vector(x);
        let y = tensor::encode_vector(y);
        let (nx, ny) = (x.values.len(), y.values.len());
        if nx != ny {
            return Err(ShapeError::SampleMismatch { x: nx, y: ny }.into());
        }
        Ok(TaskRequest::TTest(TTestInput {
            x: Some(x),
            y: Some(y),
        }))
    }

    pub fn neural_network() -> NeuralNetworkBuilder {
        NeuralNetworkBuilder::default()
    }

    pub fn kind(&self) -> TaskKind {
        match self {
            TaskRequest::LinearRegression(_) => TaskKind::LinearRegression,
            TaskRequest::TTest(_) => TaskKind::TTest,
            TaskRequest::NeuralNetwork(_) => TaskKind::NeuralNetwork,
        }
    }

    pub fn into_envelope(self) -> ServiceInput {
        let input = match self {
            TaskRequest::LinearRegression(input) => Input::LinearRegressionInput(input),
            TaskRequest::TTest(input) => Input::TTestInput(input),
            TaskRequest::NeuralNetwork(input) => Input::NeuralNetworkInput(input),
        };
        ServiceInput { input: Some(input) }
    }

    pub fn from_envelope(envelope: ServiceInput) -> Result<Self, ProtocolError> {
        let request = match envelope.input.ok_or(ProtocolError::EmptyRequest)? {
            Input::LinearRegressionInput(input) => TaskRequest::LinearRegression(input),
            Input::TTestInput(input) => TaskRequest::TTest(input),
            Input::NeuralNetworkInput(input) => TaskRequest::NeuralNetwork(input),
        };
        Ok(request)
    }

    /// Serialize into the bytes of one request message.
    pub fn into_bytes(self) -> Bytes {
        self.into_envelope().encode_to_vec().into()
    }

    pub fn decode(buf: &[u8]) -> Result<Self, ProtocolError> {
        Self::from_envelope(ServiceInput::decode(buf)?)
    }
}

/// Builder for a neural-network training request.
///
/// Layers are given in order, each as a weight matrix and a bias vector.
/// Hyperparameters default to two categories, one epoch and a learning rate
/// of one.
#[derive(Debug, Clone)]
pub struct NeuralNetworkBuilder {
    x: Vec<MpcVector>,
    y: Vec<MpcVector>,
    weights: Vec<MpcMatrix>,
    biases: Vec<MpcVector>,
    categories: u32,
    epochs: u32,
    learning_rate: f64,
    activation: ActivationFunction,
}

impl Default for NeuralNetworkBuilder {
    fn default() -> Self {
        Self {
            x: Vec::new(),
            y: Vec::new(),
            weights: Vec::new(),
            biases: Vec::new(),
            categories: DEFAULT_CATEGORIES,
            epochs: DEFAULT_EPOCHS,
            learning_rate: DEFAULT_LEARNING_RATE,
            activation: ActivationFunction::Sigmoid,
        }
    }
}

impl NeuralNetworkBuilder {
    /// Training samples, one row of features each.
    pub fn features<R>(mut self, rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator,
        <R::Item as IntoIterator>::Item: IntoScalar,
    {
        self.x = tensor::encode_matrix(rows).rows;
        self
    }

    /// Labels given as one vector per sample, e.g. one-hot encoded.
    pub fn labels<R>(mut self, rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator,
        <R::Item as IntoIterator>::Item: IntoScalar,
    {
        self.y = tensor::encode_matrix(rows).rows;
        self
    }

    /// Labels given as one scalar per sample.
    pub fn scalar_labels<I>(mut self, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoScalar,
    {
        self.y = tensor::encode_column(values).rows;
        self
    }

    /// Append a layer with a full weight matrix and bias vector.
    pub fn layer<W, B>(self, weights: W, bias: B) -> Self
    where
        W: IntoIterator,
        W::Item: IntoIterator,
        <W::Item as IntoIterator>::Item: IntoScalar,
        B: IntoIterator,
        B::Item: IntoScalar,
    {
        self.layer_encoded(tensor::encode_matrix(weights), tensor::encode_vector(bias))
    }

    /// Append a single-neuron layer: one weight per input and a scalar bias.
    pub fn column_layer<W>(self, weights: W, bias: impl IntoScalar) -> Self
    where
        W: IntoIterator,
        W::Item: IntoScalar,
    {
        self.layer_encoded(
            tensor::encode_column(weights),
            tensor::encode_row_as_vector(bias),
        )
    }

    /// Append an already encoded layer.
    pub fn layer_encoded(mut self, weights: MpcMatrix, bias: MpcVector) -> Self {
        self.weights.push(weights);
        self.biases.push(bias);
        self
    }

    pub fn categories(mut self, categories: u32) -> Self {
        self.categories = categories;
        self
    }

    pub fn epochs(mut self, epochs: u32) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn activation(mut self, activation: ActivationFunction) -> Self {
        self.activation = activation;
        self
    }

    pub fn build(self) -> Result<TaskRequest, RequestError> {
        let categories = positive_int("categories", self.categories)?;
        let epochs = positive_int("epochs", self.epochs)?;
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(RequestError::InvalidHyperParameter {
                name: "learning rate",
                value: self.learning_rate.to_string(),
            });
        }
        let (nx, ny) = (self.x.len(), self.y.len());
        if nx != ny {
            return Err(ShapeError::SampleMismatch { x: nx, y: ny }.into());
        }

        let mut input = NeuralNetworkInput {
            network: Some(NeuralNetworkParameters {
                weights: self.weights,
                biases: self.biases,
            }),
            data: Some(NeuralNetworkData {
                x: self.x,
                y: self.y,
            }),
            categories,
            epochs,
            learningrate: self.learning_rate,
            activation: 0,
        };
        input.set_activation(self.activation);
        Ok(TaskRequest::NeuralNetwork(input))
    }
}

fn positive_int(name: &'static str, value: u32) -> Result<i32, RequestError> {
    match i32::try_from(value) {
        Ok(v) if v >= 1 => Ok(v),
        _ => Err(RequestError::InvalidHyperParameter {
            name,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::codec::tensor::{decode_matrix, decode_vector};

    #[test]
    fn linear_regression_with_unknown_targets() {
        let request =
            TaskRequest::linear_regression([[0.1, 0.2], [0.3, 0.4]], [None::<f64>, None]);
        assert_eq!(request.kind(), TaskKind::LinearRegression);

        let TaskRequest::LinearRegression(input) = request else {
            panic!("Expected a linear regression request");
        };
        assert_eq!(input.x.len(), 2);
        for row in &input.x {
            assert_eq!(row.values.len(), 2);
            assert!(row.values.iter().all(|v| v.value.is_some()));
        }
        let y = input.y.expect("y is always set");
        assert_eq!(decode_vector(&y), vec![None, None]);
    }

    #[test_log::test]
    fn mismatched_linear_regression_is_still_built() {
        let request = TaskRequest::linear_regression([[1.0, 2.0], [3.0, 4.0]], [Some(1.0)]);
        let TaskRequest::LinearRegression(input) = request else {
            panic!("Expected a linear regression request");
        };
        let x: Vec<Vec<Option<f64>>> = input.x.iter().map(decode_vector).collect();
        assert_eq!(
            x,
            vec![vec![Some(1.0), Some(2.0)], vec![Some(3.0), Some(4.0)]]
        );
        let y = input.y.expect("y is always set");
        assert_eq!(decode_vector(&y), vec![Some(1.0)]);
    }

    #[test]
    fn envelope_has_the_right_arm() {
        let envelope = TaskRequest::linear_regression([[1.0]], [2.0]).into_envelope();
        assert!(matches!(
            envelope.input,
            Some(Input::LinearRegressionInput(_))
        ));

        let request = TaskRequest::neural_network()
            .features([[1.0]])
            .scalar_labels([1.0])
            .build()
            .unwrap();
        assert!(matches!(
            request.into_envelope().input,
            Some(Input::NeuralNetworkInput(_))
        ));
    }

    #[test]
    fn bytes_decode_to_the_same_request() {
        let request = TaskRequest::linear_regression([[1.0, 2.0]], [Some(3.0)]);
        let bytes = request.clone().into_bytes();
        assert_eq!(TaskRequest::decode(&bytes).unwrap(), request);
    }

    #[test]
    fn empty_envelope_is_rejected() {
        let err = TaskRequest::from_envelope(ServiceInput::default()).unwrap_err();
        assert_eq!(err, ProtocolError::EmptyRequest);
    }

    #[test]
    fn ttest_needs_equal_samples() {
        let err = TaskRequest::ttest([1.0, 2.0], [Some(1.0)]).unwrap_err();
        assert_eq!(
            err,
            RequestError::Shape(ShapeError::SampleMismatch { x: 2, y: 1 })
        );
        let request = TaskRequest::ttest([1.0, 2.0], [None::<f64>, None]).unwrap();
        assert_eq!(request.kind(), TaskKind::TTest);
    }

    #[test]
    fn neural_network_defaults() {
        let TaskRequest::NeuralNetwork(input) = TaskRequest::neural_network().build().unwrap()
        else {
            panic!("Expected a neural network request");
        };
        assert_eq!(input.categories, 2);
        assert_eq!(input.epochs, 1);
        assert_eq!(input.learningrate, 1.0);
        assert_eq!(input.activation(), ActivationFunction::Sigmoid);
    }

    #[test]
    fn neural_network_shapes() {
        let request = TaskRequest::neural_network()
            .features([[Some(0.5), None], [Some(0.1), None]])
            .labels([[1.0, 0.0], [0.0, 1.0]])
            .layer([[0.1, 0.2], [0.3, 0.4]], [0.0, 0.0])
            .column_layer([0.5, 0.6], 0.7)
            .categories(3)
            .epochs(10)
            .learning_rate(0.25)
            .build()
            .unwrap();

        let TaskRequest::NeuralNetwork(input) = request else {
            panic!("Expected a neural network request");
        };
        assert_eq!((input.categories, input.epochs), (3, 10));
        assert_eq!(input.learningrate, 0.25);

        let network = input.network.unwrap();
        assert_eq!(network.weights.len(), 2);
        assert_eq!(network.biases.len(), 2);
        assert_eq!(
            decode_matrix(&network.weights[1]),
            vec![vec![Some(0.5)], vec![Some(0.6)]]
        );
        assert_eq!(decode_vector(&network.biases[1]), vec![Some(0.7)]);

        let data = input.data.unwrap();
        assert_eq!(decode_vector(&data.x[0]), vec![Some(0.5), None]);
        assert_eq!(decode_vector(&data.y[1]), vec![Some(0.0), Some(1.0)]);
    }

    #[test]
    fn scalar_labels_nest_per_sample() {
        let TaskRequest::NeuralNetwork(input) = TaskRequest::neural_network()
            .features([[1.0], [2.0], [3.0]])
            .scalar_labels([Some(1.0), None, Some(0.0)])
            .build()
            .unwrap()
        else {
            panic!("Expected a neural network request");
        };
        let y = input.data.unwrap().y;
        assert_eq!(y.len(), 3);
        assert_eq!(decode_vector(&y[1]), vec![None]);
    }

    #[test]
    fn invalid_hyperparameters() {
        let builder = TaskRequest::neural_network;
        assert!(matches!(
            builder().categories(0).build(),
            Err(RequestError::InvalidHyperParameter { name: "categories", .. })
        ));
        assert!(matches!(
            builder().epochs(0).build(),
            Err(RequestError::InvalidHyperParameter { name: "epochs", .. })
        ));
        assert!(matches!(
            builder().epochs(u32::MAX).build(),
            Err(RequestError::InvalidHyperParameter { name: "epochs", .. })
        ));
        for rate in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                builder().learning_rate(rate).build(),
                Err(RequestError::InvalidHyperParameter { name: "learning rate", .. })
            ));
        }
        assert_eq!(
            builder().features([[1.0]]).build(),
            Err(RequestError::Shape(ShapeError::SampleMismatch { x: 1, y: 0 }))
        );
    }
}
