//! Client for running statistics and neural-network training on a remote
//! MPC engine.
//!
//! Inputs are tensors of optional scalars, where an absent value is one only
//! the other party knows. A [`client::Client`] sends one task per call and
//! waits for the engine's opened result.
#![deny(unsafe_code)]

pub mod client;
pub mod codec;
pub mod config;
mod error;
pub mod net;
pub mod proto;
pub mod request;
pub mod response;

#[cfg(test)]
mod testing;

pub use client::Client;
pub use config::{ClientConfig, EngineAddress};
pub use error::Error;
pub use request::{TaskKind, TaskRequest};
pub use response::{TaskOutput, TaskResponse, TrainedLayer};
