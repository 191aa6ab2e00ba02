//! Activation functions applied to a layer's pre-activation output.

use crate::core::Error;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Activation function identifier, resolved once at construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    /// Identity, the default.
    #[default]
    None,
    Relu,
    Sigmoid,
    Tanh,
}

impl Activation {
    /// Apply the activation element-wise, in place.
    pub fn apply(&self, values: &mut [f32]) {
        match self {
            Activation::None => {}
            Activation::Relu => {
                for v in values.iter_mut() {
                    *v = v.max(0.0);
                }
            }
            Activation::Sigmoid => {
                for v in values.iter_mut() {
                    *v = 1.0 / (1.0 + (-*v).exp());
                }
            }
            Activation::Tanh => {
                for v in values.iter_mut() {
                    *v = v.tanh();
                }
            }
        }
    }
}

impl FromStr for Activation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "identity" => Ok(Activation::None),
            "relu" => Ok(Activation::Relu),
            "sigmoid" => Ok(Activation::Sigmoid),
            "tanh" => Ok(Activation::Tanh),
            other => Err(Error::UnknownActivation(other.to_string())),
        }
    }
}
