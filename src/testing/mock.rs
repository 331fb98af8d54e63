use itertools::Itertools;

use crate::{
    codec::{scalar, tensor},
    proto::{LinearRegressionOutput, MpcVector, NeuralNetworkOutput, ServiceOutput, TTestOutput},
    request::TaskRequest,
    response::TaskResponse,
};

fn known(vector: &MpcVector) -> Vec<f64> {
    vector.values.iter().filter_map(scalar::decode).collect_vec()
}

/// Reflect the known part of each request back.
///
/// * linear regression: `beta` is the known entries of `y`
/// * t-test: `t` is the sum of the known entries of `x` minus those of `y`
/// * neural network: the layers are returned with unknown entries dropped
pub fn identity(request: TaskRequest) -> Option<ServiceOutput> {
    let response = match request {
        TaskRequest::LinearRegression(input) => {
            TaskResponse::LinearRegression(LinearRegressionOutput {
                beta: input.y.as_ref().map(known).unwrap_or_default(),
            })
        }
        TaskRequest::TTest(input) => {
            let sum = |v: Option<MpcVector>| v.map_or(0.0, |v| known(&v).iter().sum::<f64>());
            TaskResponse::TTest(TTestOutput {
                t: sum(input.x) - sum(input.y),
            })
        }
        TaskRequest::NeuralNetwork(input) => {
            let network = input.network.unwrap_or_default();
            let weights = network
                .weights
                .iter()
                .map(|m| tensor::plain_matrix(m.rows.iter().map(known)))
                .collect();
            let biases = network
                .biases
                .iter()
                .map(|b| tensor::plain_vector(known(b)))
                .collect();
            TaskResponse::NeuralNetwork(NeuralNetworkOutput { weights, biases })
        }
    };
    Some(response.into_envelope())
}

/// Answer every request with `reply`, whatever it asked for.
pub fn canned(reply: ServiceOutput) -> impl FnMut(TaskRequest) -> Option<ServiceOutput> + Send {
    move |_| Some(reply.clone())
}

/// Close the connection instead of answering.
pub fn hang_up(_: TaskRequest) -> Option<ServiceOutput> {
    None
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::response;

    #[test]
    fn identity_drops_unknowns() {
        let request = TaskRequest::linear_regression([[1.0], [2.0]], [Some(4.0), None]);
        let reply = identity(request).unwrap();
        let beta = response::linear_regression(TaskResponse::from_envelope(reply).unwrap());
        assert_eq!(beta.unwrap(), vec![4.0]);
    }
}
