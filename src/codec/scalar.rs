use crate::{
    codec::{Position, ProtocolError},
    proto::MpcInput,
};

/// Anything that can stand in for one input value.
///
/// Plain numbers are known values, `Option`s may be unknown.
pub trait IntoScalar {
    fn into_scalar(self) -> Option<f64>;
}

impl IntoScalar for f64 {
    fn into_scalar(self) -> Option<f64> {
        Some(self)
    }
}

impl IntoScalar for Option<f64> {
    fn into_scalar(self) -> Option<f64> {
        self
    }
}

impl IntoScalar for &f64 {
    fn into_scalar(self) -> Option<f64> {
        Some(*self)
    }
}

impl IntoScalar for &Option<f64> {
    fn into_scalar(self) -> Option<f64> {
        *self
    }
}

pub fn encode(value: impl IntoScalar) -> MpcInput {
    MpcInput {
        value: value.into_scalar(),
    }
}

pub fn decode(input: &MpcInput) -> Option<f64> {
    input.value
}

/// Decode a value that the engine promised to be present.
pub fn decode_known(input: &MpcInput, at: Position) -> Result<f64, ProtocolError> {
    input.value.ok_or(ProtocolError::MissingValue(at))
}
