//! synthesizes the cloudformation stack for the QuantumBros front end:
//! a private, versioned s3 bucket served through a cloudfront distribution
//! that reads the bucket with an origin access control.

pub mod config;
pub mod error;
pub mod graph;
pub mod stack;

pub use config::{StackConfig, SynthSettings};
pub use error::{ConfigError, SynthError};
pub use graph::{OutputKeys, ResourceGraph, StackOutputs};
pub use stack::synthesize;
