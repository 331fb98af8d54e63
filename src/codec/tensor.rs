//! Vectors and matrices of optional scalars.
//!
//! Order and length are preserved exactly, an empty input gives an empty
//! message. Rows of a matrix are encoded independently, so ragged input stays
//! ragged; keeping shapes consistent is up to the caller.
//!
//! Rank-one data that the engine expects nested (labels, single-neuron
//! weights, scalar biases) has its own entry points, so the caller always
//! says which shape is meant.

use itertools::Itertools;

use crate::{
    codec::{
        scalar::{self, IntoScalar},
        Position, ProtocolError, ShapeError,
    },
    proto::{Matrix, MpcMatrix, MpcVector, Vector},
};

pub fn encode_vector<I>(values: I) -> MpcVector
where
    I: IntoIterator,
    I::Item: IntoScalar,
{
    MpcVector {
        values: values.into_iter().map(scalar::encode).collect(),
    }
}

/// A single scalar as a one-element vector.
pub fn encode_row_as_vector(value: impl IntoScalar) -> MpcVector {
    MpcVector {
        values: vec![scalar::encode(value)],
    }
}

pub fn encode_matrix<R>(rows: R) -> MpcMatrix
where
    R: IntoIterator,
    R::Item: IntoIterator,
    <R::Item as IntoIterator>::Item: IntoScalar,
{
    MpcMatrix {
        rows: rows.into_iter().map(encode_vector).collect(),
    }
}

/// Rank-one data as a one-column matrix: every element becomes its own row.
pub fn encode_column<I>(values: I) -> MpcMatrix
where
    I: IntoIterator,
    I::Item: IntoScalar,
{
    MpcMatrix {
        rows: values.into_iter().map(encode_row_as_vector).collect(),
    }
}

impl MpcMatrix {
    /// See [`encode_flat`].
    pub fn from_flat<I>(values: I, columns: usize) -> Result<Self, ShapeError>
    where
        I: IntoIterator,
        I::Item: IntoScalar,
    {
        encode_flat(values, columns)
    }
}

/// Split a row-major buffer into rows of `columns` values each.
pub fn encode_flat<I>(values: I, columns: usize) -> Result<MpcMatrix, ShapeError>
where
    I: IntoIterator,
    I::Item: IntoScalar,
{
    let values = values.into_iter().map(scalar::encode).collect_vec();
    let len = values.len();
    if len == 0 {
        return Ok(MpcMatrix::default());
    }
    if columns == 0 {
        return Err(ShapeError::ZeroColumns { len });
    }
    if len % columns != 0 {
        return Err(ShapeError::UnevenRows { len, columns });
    }
    let rows = values
        .chunks(columns)
        .map(|row| MpcVector {
            values: row.to_vec(),
        })
        .collect();
    Ok(MpcMatrix { rows })
}

pub fn decode_vector(vector: &MpcVector) -> Vec<Option<f64>> {
    vector.values.iter().map(scalar::decode).collect()
}

pub fn decode_matrix(matrix: &MpcMatrix) -> Vec<Vec<Option<f64>>> {
    matrix.rows.iter().map(decode_vector).collect()
}

/// Decode a vector in which every value must be present.
pub fn decode_known_vector(vector: &MpcVector) -> Result<Vec<f64>, ProtocolError> {
    vector
        .values
        .iter()
        .enumerate()
        .map(|(i, v)| scalar::decode_known(v, Position::Element(i)))
        .collect()
}

/// Decode a matrix in which every value must be present.
pub fn decode_known_matrix(matrix: &MpcMatrix) -> Result<Vec<Vec<f64>>, ProtocolError> {
    matrix
        .rows
        .iter()
        .enumerate()
        .map(|(row, vector)| {
            vector
                .values
                .iter()
                .enumerate()
                .map(|(column, v)| scalar::decode_known(v, Position::Cell { row, column }))
                .collect::<Result<Vec<f64>, _>>()
        })
        .collect()
}

pub fn decode_plain_vector(vector: Vector) -> Vec<f64> {
    vector.value
}

pub fn decode_plain_matrix(matrix: Matrix) -> Vec<Vec<f64>> {
    matrix.rows.into_iter().map(decode_plain_vector).collect()
}

pub fn plain_vector(values: impl IntoIterator<Item = f64>) -> Vector {
    Vector {
        value: values.into_iter().collect(),
    }
}

pub fn plain_matrix<R>(rows: R) -> Matrix
where
    R: IntoIterator,
    R::Item: IntoIterator<Item = f64>,
{
    Matrix {
        rows: rows.into_iter().map(plain_vector).collect(),
    }
}
