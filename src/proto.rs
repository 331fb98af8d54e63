//! Wire schema shared with the engine.
//!
//! These are the protobuf messages of the service, written out as `prost`
//! derives so no `protoc` is needed at build time. Field numbers must stay in
//! sync with the engine's `.proto` files; nothing in here is hand-tuned.

/// A single input value. `None` marks a value only the other party knows.
#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct MpcInput {
    #[prost(double, optional, tag = "1")]
    pub value: Option<f64>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct MpcVector {
    #[prost(message, repeated, tag = "1")]
    pub values: Vec<MpcInput>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct MpcMatrix {
    #[prost(message, repeated, tag = "1")]
    pub rows: Vec<MpcVector>,
}

/// Opened (public) vector, only ever produced by the engine.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Vector {
    #[prost(double, repeated, tag = "1")]
    pub value: Vec<f64>,
}

/// Opened (public) matrix, only ever produced by the engine.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Matrix {
    #[prost(message, repeated, tag = "1")]
    pub rows: Vec<Vector>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct LinearRegressionInput {
    #[prost(message, repeated, tag = "1")]
    pub x: Vec<MpcVector>,
    #[prost(message, optional, tag = "2")]
    pub y: Option<MpcVector>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct LinearRegressionOutput {
    #[prost(double, repeated, tag = "1")]
    pub beta: Vec<f64>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct TTestInput {
    #[prost(message, optional, tag = "1")]
    pub x: Option<MpcVector>,
    #[prost(message, optional, tag = "2")]
    pub y: Option<MpcVector>,
}

#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct TTestOutput {
    #[prost(double, tag = "1")]
    pub t: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ActivationFunction {
    Sigmoid = 0,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct NeuralNetworkParameters {
    #[prost(message, repeated, tag = "1")]
    pub weights: Vec<MpcMatrix>,
    #[prost(message, repeated, tag = "2")]
    pub biases: Vec<MpcVector>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct NeuralNetworkData {
    #[prost(message, repeated, tag = "1")]
    pub x: Vec<MpcVector>,
    #[prost(message, repeated, tag = "2")]
    pub y: Vec<MpcVector>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct NeuralNetworkInput {
    #[prost(message, optional, tag = "1")]
    pub network: Option<NeuralNetworkParameters>,
    #[prost(message, optional, tag = "2")]
    pub data: Option<NeuralNetworkData>,
    #[prost(int32, tag = "3")]
    pub categories: i32,
    #[prost(int32, tag = "4")]
    pub epochs: i32,
    #[prost(double, tag = "5")]
    pub learningrate: f64,
    #[prost(enumeration = "ActivationFunction", tag = "6")]
    pub activation: i32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct NeuralNetworkOutput {
    #[prost(message, repeated, tag = "1")]
    pub weights: Vec<Matrix>,
    #[prost(message, repeated, tag = "2")]
    pub biases: Vec<Vector>,
}

/// Reserved reply arm for failures inside the engine.
#[derive(Clone, PartialEq, prost::Message)]
pub struct EngineFailure {
    #[prost(string, tag = "1")]
    pub message: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ServiceInput {
    #[prost(oneof = "service_input::Input", tags = "1, 2, 3")]
    pub input: Option<service_input::Input>,
}

pub mod service_input {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Input {
        #[prost(message, tag = "1")]
        LinearRegressionInput(super::LinearRegressionInput),
        #[prost(message, tag = "2")]
        TTestInput(super::TTestInput),
        #[prost(message, tag = "3")]
        NeuralNetworkInput(super::NeuralNetworkInput),
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ServiceOutput {
    #[prost(oneof = "service_output::Output", tags = "1, 2, 3, 15")]
    pub output: Option<service_output::Output>,
}

pub mod service_output {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Output {
        #[prost(message, tag = "1")]
        LinearRegressionOutput(super::LinearRegressionOutput),
        #[prost(message, tag = "2")]
        TTestOutput(super::TTestOutput),
        #[prost(message, tag = "3")]
        NeuralNetworkOutput(super::NeuralNetworkOutput),
        #[prost(message, tag = "15")]
        EngineFailure(super::EngineFailure),
    }
}
