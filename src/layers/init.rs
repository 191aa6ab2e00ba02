//! Parameter initialization distributions.

use crate::core::Error;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A tagged initialization distribution for layer parameters.
///
/// Glorot variants derive their scale from the matrix shape (fan-in is the
/// column count, fan-out the row count). Deterministic variants produce
/// bit-identical buffers on every draw.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum InitConfig {
    Zeros,
    Ones,
    Constant(f32),
    Uniform { low: f32, high: f32 },
    Normal { mean: f32, std: f32 },
    GlorotUniform,
    GlorotNormal,
}

impl InitConfig {
    /// Fill a `rows x cols` row-major buffer from this distribution.
    pub fn fill<R: Rng>(&self, rows: usize, cols: usize, rng: &mut R) -> Vec<f32> {
        let len = rows * cols;
        match self {
            InitConfig::Zeros => vec![0.0; len],
            InitConfig::Ones => vec![1.0; len],
            InitConfig::Constant(c) => vec![*c; len],
            InitConfig::Uniform { low, high } => {
                (0..len).map(|_| rng.gen::<f32>() * (high - low) + low).collect()
            }
            InitConfig::Normal { mean, std } => {
                (0..len).map(|_| mean + std * sample_standard_normal(rng)).collect()
            }
            InitConfig::GlorotUniform => {
                let bound = (6.0 / (rows + cols) as f32).sqrt();
                (0..len).map(|_| rng.gen::<f32>() * 2.0 * bound - bound).collect()
            }
            InitConfig::GlorotNormal => {
                let std = (2.0 / (rows + cols) as f32).sqrt();
                (0..len).map(|_| std * sample_standard_normal(rng)).collect()
            }
        }
    }

    /// Fill a flat vector of `len` elements (used for bias terms).
    ///
    /// Glorot scales degenerate to fan-in 1 here; bias initialization is
    /// normally `Zeros` anyway.
    pub fn fill_vec<R: Rng>(&self, len: usize, rng: &mut R) -> Vec<f32> {
        self.fill(len, 1, rng)
    }
}

impl FromStr for InitConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "zeros" => Ok(InitConfig::Zeros),
            "ones" => Ok(InitConfig::Ones),
            "uniform" => Ok(InitConfig::Uniform { low: -0.05, high: 0.05 }),
            "normal" => Ok(InitConfig::Normal { mean: 0.0, std: 0.05 }),
            "glorot_uniform" => Ok(InitConfig::GlorotUniform),
            "glorot_normal" => Ok(InitConfig::GlorotNormal),
            other => Err(Error::UnknownInit(other.to_string())),
        }
    }
}

/// Draw one standard-normal sample via the Box-Muller transform.
fn sample_standard_normal<R: Rng>(rng: &mut R) -> f32 {
    let u1: f32 = rng.gen::<f32>().max(f32::MIN_POSITIVE);
    let u2: f32 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos()
}
