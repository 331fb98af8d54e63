//! Conversion between caller-side numbers and the wire schema.
//!
//! Inputs are optional scalars: `Some(x)` is a value this party knows,
//! `None` is a value only the other party knows. Results coming back from
//! the engine are always opened, so they decode into plain `f64`s.

pub mod scalar;
pub mod tensor;

use thiserror::Error;

use crate::request::TaskKind;

/// Caller-supplied data has a shape the wire schema can't carry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("Flat buffer of length {len} does not split into rows of {columns}")]
    UnevenRows { len: usize, columns: usize },
    #[error("Cannot split {len} values into rows of zero columns")]
    ZeroColumns { len: usize },
    #[error("Samples differ in length: x has {x}, y has {y}")]
    SampleMismatch { x: usize, y: usize },
}

/// A reply from the engine could not be turned back into numbers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("Malformed reply: {0}")]
    Malformed(#[from] prost::DecodeError),
    #[error("Reply carried no result")]
    EmptyReply,
    #[error("Request carried no task")]
    EmptyRequest,
    #[error("Expected a {expected} result, got {got}")]
    TagMismatch { expected: TaskKind, got: TaskKind },
    #[error("Engine omitted the value at {0}")]
    MissingValue(Position),
    #[error("Engine returned {weights} weight matrices but {biases} bias vectors")]
    LayerMismatch { weights: usize, biases: usize },
    #[error("Engine failed: {0}")]
    EngineFailure(String),
}

/// Where in a tensor a value was expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Element(usize),
    Cell { row: usize, column: usize },
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Position::Element(i) => write!(f, "[{i}]"),
            Position::Cell { row, column } => write!(f, "[{row}][{column}]"),
        }
    }
}
