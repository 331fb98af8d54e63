//! Replies from the engine and how they are turned back into numbers.

use bytes::Bytes;
use prost::Message;
use serde::{Deserialize, Serialize};

use crate::{
    codec::{tensor, ProtocolError},
    proto::{
        service_output::Output, EngineFailure, LinearRegressionOutput, NeuralNetworkOutput,
        ServiceOutput, TTestOutput,
    },
    request::TaskKind,
};

#[derive(Debug, Clone, PartialEq)]
pub enum TaskResponse {
    LinearRegression(LinearRegressionOutput),
    TTest(TTestOutput),
    NeuralNetwork(NeuralNetworkOutput),
}

/// One trained layer, in the order the engine returned them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedLayer {
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

/// Decoded result of any task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "task", content = "result", rename_all = "kebab-case")]
pub enum TaskOutput {
    LinearRegression(Vec<f64>),
    TTest(f64),
    NeuralNetwork(Vec<TrainedLayer>),
}

impl TaskResponse {
    /// Select the task arm of a reply envelope.
    ///
    /// An envelope without any arm is reported as [`ProtocolError::EmptyReply`],
    /// the reserved failure arm as [`ProtocolError::EngineFailure`].
    pub fn from_envelope(envelope: ServiceOutput) -> Result<Self, ProtocolError> {
        match envelope.output.ok_or(ProtocolError::EmptyReply)? {
            Output::LinearRegressionOutput(output) => Ok(TaskResponse::LinearRegression(output)),
            Output::TTestOutput(output) => Ok(TaskResponse::TTest(output)),
            Output::NeuralNetworkOutput(output) => Ok(TaskResponse::NeuralNetwork(output)),
            Output::EngineFailure(EngineFailure { message }) => {
                Err(ProtocolError::EngineFailure(message))
            }
        }
    }

    pub fn decode(buf: &[u8]) -> Result<Self, ProtocolError> {
        Self::from_envelope(ServiceOutput::decode(buf)?)
    }

    pub fn into_envelope(self) -> ServiceOutput {
        let output = match self {
            TaskResponse::LinearRegression(output) => Output::LinearRegressionOutput(output),
            TaskResponse::TTest(output) => Output::TTestOutput(output),
            TaskResponse::NeuralNetwork(output) => Output::NeuralNetworkOutput(output),
        };
        ServiceOutput {
            output: Some(output),
        }
    }

    pub fn into_bytes(self) -> Bytes {
        self.into_envelope().encode_to_vec().into()
    }

    pub fn kind(&self) -> TaskKind {
        match self {
            TaskResponse::LinearRegression(_) => TaskKind::LinearRegression,
            TaskResponse::TTest(_) => TaskKind::TTest,
            TaskResponse::NeuralNetwork(_) => TaskKind::NeuralNetwork,
        }
    }
}

/// Decode a reply to a request of kind `expected`.
pub fn decode(expected: TaskKind, response: TaskResponse) -> Result<TaskOutput, ProtocolError> {
    let output = match expected {
        TaskKind::LinearRegression => TaskOutput::LinearRegression(linear_regression(response)?),
        TaskKind::TTest => TaskOutput::TTest(ttest(response)?),
        TaskKind::NeuralNetwork => TaskOutput::NeuralNetwork(neural_network(response)?),
    };
    Ok(output)
}

/// The fitted coefficients, intercept first.
pub fn linear_regression(response: TaskResponse) -> Result<Vec<f64>, ProtocolError> {
    match response {
        TaskResponse::LinearRegression(LinearRegressionOutput { beta }) => Ok(beta),
        other => Err(mismatch(TaskKind::LinearRegression, &other)),
    }
}

/// The t statistic.
pub fn ttest(response: TaskResponse) -> Result<f64, ProtocolError> {
    match response {
        TaskResponse::TTest(TTestOutput { t }) => Ok(t),
        other => Err(mismatch(TaskKind::TTest, &other)),
    }
}

pub fn neural_network(response: TaskResponse) -> Result<Vec<TrainedLayer>, ProtocolError> {
    let NeuralNetworkOutput { weights, biases } = match response {
        TaskResponse::NeuralNetwork(output) => output,
        other => return Err(mismatch(TaskKind::NeuralNetwork, &other)),
    };
    if weights.len() != biases.len() {
        return Err(ProtocolError::LayerMismatch {
            weights: weights.len(),
            biases: biases.len(),
        });
    }
    let layers = weights
        .into_iter()
        .zip(biases)
        .map(|(weights, bias)| TrainedLayer {
            weights: tensor::decode_plain_matrix(weights),
            bias: tensor::decode_plain_vector(bias),
        })
        .collect();
    Ok(layers)
}

fn mismatch(expected: TaskKind, got: &TaskResponse) -> ProtocolError {
    ProtocolError::TagMismatch {
        expected,
        got: got.kind(),
    }
}
