//! Checkpointable layer state.
//!
//! A [`LayerState`] is the snapshot a surrounding persistence mechanism
//! saves and restores to reproduce a trained layer verbatim. Loading is
//! shape-checked; a snapshot can never resize a layer in place.

use crate::core::{Error, Result};
use crate::layers::matrix::Matrix;
use crate::layers::rgcn::RgcnLayer;
use serde::{Deserialize, Serialize};

/// Snapshot of every learnable parameter of an [`RgcnLayer`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerState {
    /// Input feature dimension.
    pub input_dim: usize,
    /// Output feature dimension.
    pub output_dim: usize,
    /// Number of relation types.
    pub num_relations: usize,
    /// Per-relation matrices, natural direction.
    pub relation_matrices: Vec<Matrix>,
    /// Per-relation matrices, reverse direction.
    pub inverse_relation_matrices: Vec<Matrix>,
    /// Self-loop matrix.
    pub self_matrix: Matrix,
    /// Bias vector, when the layer has one.
    pub bias: Option<Vec<f32>>,
}

impl LayerState {
    /// Encode as JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encode as compact bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode from compact bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

impl RgcnLayer {
    /// Snapshot the layer's learnable parameters.
    pub fn state(&self) -> LayerState {
        LayerState {
            input_dim: self.config().input_dim,
            output_dim: self.config().output_dim,
            num_relations: self.num_relations(),
            relation_matrices: self.relation_matrices().to_vec(),
            inverse_relation_matrices: self.inverse_relation_matrices().to_vec(),
            self_matrix: self.self_matrix().clone(),
            bias: self.bias().map(|b| b.to_vec()),
        }
    }

    /// Restore parameters from a snapshot.
    ///
    /// The snapshot must match the layer's dimensions, relation count, and
    /// bias configuration exactly; any disagreement is rejected with
    /// [`Error::InvalidConfig`] and the layer is left untouched.
    pub fn load_state(&mut self, state: LayerState) -> Result<()> {
        let config = self.config();
        if state.input_dim != config.input_dim || state.output_dim != config.output_dim {
            return Err(Error::InvalidConfig(format!(
                "snapshot dims [{}, {}] do not match layer dims [{}, {}]",
                state.output_dim, state.input_dim, config.output_dim, config.input_dim
            )));
        }
        if state.num_relations != self.num_relations()
            || state.relation_matrices.len() != self.num_relations()
            || state.inverse_relation_matrices.len() != self.num_relations()
        {
            return Err(Error::InvalidConfig(format!(
                "snapshot relation count {} does not match layer relation count {}",
                state.num_relations,
                self.num_relations()
            )));
        }
        let matrices = state
            .relation_matrices
            .iter()
            .chain(state.inverse_relation_matrices.iter())
            .chain(std::iter::once(&state.self_matrix));
        for m in matrices {
            if m.rows() != config.output_dim || m.cols() != config.input_dim {
                return Err(Error::InvalidConfig(format!(
                    "snapshot matrix shape [{}, {}] does not match layer dims [{}, {}]",
                    m.rows(),
                    m.cols(),
                    config.output_dim,
                    config.input_dim
                )));
            }
        }
        match (&state.bias, config.bias) {
            (Some(b), true) if b.len() == config.output_dim => {}
            (None, false) => {}
            _ => {
                return Err(Error::InvalidConfig(
                    "snapshot bias does not match layer bias configuration".to_string(),
                ));
            }
        }

        self.set_parameters(
            state.relation_matrices,
            state.inverse_relation_matrices,
            state.self_matrix,
            state.bias,
        );
        Ok(())
    }
}
