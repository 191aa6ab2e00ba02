//! Layer configuration.

use crate::core::{Error, Result};
use crate::layers::activation::Activation;
use crate::layers::init::InitConfig;
use serde::{Deserialize, Serialize};

/// Compute device owning a layer's parameters.
///
/// Parameter math in this crate executes on the host; the device is recorded
/// at construction so an embedding runtime can handle accelerator placement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Device {
    /// Host CPU, the default.
    #[default]
    Cpu,
    /// CUDA accelerator with the given ordinal.
    Cuda(usize),
}

/// Kind tag for a layer configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerKind {
    /// Graph neural network layer.
    #[default]
    Gnn,
}

/// Aggregation applied to a neighbor set before the relation transform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Aggregation {
    /// Average over the neighbor set, the default.
    #[default]
    Mean,
    /// Plain sum over the neighbor set.
    Sum,
}

/// Options specific to GNN layers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GnnLayerOptions {
    /// Neighbor aggregation function.
    pub aggregation: Aggregation,
}

/// Optimizer wiring carried through the configuration.
///
/// The layer never acts on this; it exists so a surrounding training
/// collaborator can recover its settings from the checkpointed config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Optimizer algorithm name (e.g. "adagrad").
    pub algorithm: String,
    /// Learning rate.
    pub learning_rate: f32,
}

/// Finalized configuration for one layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    /// Input feature dimension.
    pub input_dim: usize,
    /// Output feature dimension.
    pub output_dim: usize,
    /// Layer kind tag.
    pub kind: LayerKind,
    /// Layer-specific options.
    pub options: GnnLayerOptions,
    /// Weight initialization distribution.
    pub init: InitConfig,
    /// Whether the layer owns a bias vector.
    pub bias: bool,
    /// Bias initialization distribution.
    pub bias_init: InitConfig,
    /// Optimizer wiring; absent when the layer is constructed standalone.
    pub optimizer: Option<OptimizerConfig>,
    /// Activation function.
    pub activation: Activation,
}

impl LayerConfig {
    /// A GNN-tagged configuration with the documented defaults: Glorot
    /// uniform weights, no bias, zeros bias init, identity activation, no
    /// optimizer attached.
    pub fn gnn(input_dim: usize, output_dim: usize) -> Self {
        Self {
            input_dim,
            output_dim,
            kind: LayerKind::Gnn,
            options: GnnLayerOptions::default(),
            init: InitConfig::GlorotUniform,
            bias: false,
            bias_init: InitConfig::Zeros,
            optimizer: None,
            activation: Activation::None,
        }
    }

    /// Reject configurations a layer cannot be built from.
    pub fn validate(&self) -> Result<()> {
        if self.input_dim == 0 {
            return Err(Error::InvalidConfig("input_dim must be positive".to_string()));
        }
        if self.output_dim == 0 {
            return Err(Error::InvalidConfig("output_dim must be positive".to_string()));
        }
        Ok(())
    }
}
