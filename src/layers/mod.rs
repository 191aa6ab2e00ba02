//! Graph neural network layers.
//!
//! Provides the relational graph convolution layer (R-GCN) together with its
//! configuration, initialization, activation, and checkpointing support.

pub mod activation;
pub mod config;
pub mod init;
pub mod matrix;
pub mod rgcn;
pub mod state;

pub use activation::Activation;
pub use config::{Aggregation, Device, GnnLayerOptions, LayerConfig, LayerKind, OptimizerConfig};
pub use init::InitConfig;
pub use matrix::Matrix;
pub use rgcn::{RgcnLayer, RgcnOptions};
pub use state::LayerState;

use crate::core::Result;
use crate::graph::DenseGraph;
use std::collections::HashMap;

/// Capability set every GNN layer provides: reinitialization, message
/// passing over a batch, and parameter enumeration.
///
/// Layer variants are selected at configuration time; [`RgcnLayer`] is the
/// relational variant this crate implements.
pub trait GnnLayer {
    /// Input feature dimension.
    fn input_dim(&self) -> usize;

    /// Output feature dimension.
    fn output_dim(&self) -> usize;

    /// Redraw every owned parameter from its configured distribution.
    fn reset(&mut self);

    /// Run message passing over one batch of target nodes.
    fn forward(
        &self,
        inputs: &HashMap<String, Vec<f32>>,
        graph: &DenseGraph,
        train: bool,
    ) -> Result<HashMap<String, Vec<f32>>>;

    /// Every learnable matrix of the layer.
    fn parameters(&self) -> Vec<&Matrix>;
}
