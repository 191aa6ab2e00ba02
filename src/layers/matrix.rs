//! Dense row-major matrix used for layer parameters.

use crate::layers::init::InitConfig;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A dense `rows x cols` matrix of `f32`, stored row-major.
///
/// Every learnable parameter of a layer is one of these with shape
/// `[output_dim, input_dim]`. The shape is fixed at construction; `refill`
/// redraws values in place without changing it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Matrix {
    /// Create a matrix filled from the given initializer.
    pub fn init<R: Rng>(rows: usize, cols: usize, init: &InitConfig, rng: &mut R) -> Self {
        Self {
            rows,
            cols,
            data: init.fill(rows, cols, rng),
        }
    }

    /// Create a zero matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Element at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.cols + col]
    }

    /// Flat row-major view of the data.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Redraw every element in place from the given initializer.
    pub fn refill<R: Rng>(&mut self, init: &InitConfig, rng: &mut R) {
        self.data = init.fill(self.rows, self.cols, rng);
    }

    /// Matrix-vector product `self * x`.
    ///
    /// `x` must have length `cols`; the caller validates this against the
    /// layer's input dimension before getting here.
    pub fn matvec(&self, x: &[f32]) -> Vec<f32> {
        debug_assert_eq!(x.len(), self.cols);
        let mut out = vec![0.0; self.rows];
        for (i, out_i) in out.iter_mut().enumerate() {
            let row = &self.data[i * self.cols..(i + 1) * self.cols];
            *out_i = row.iter().zip(x.iter()).map(|(w, v)| w * v).sum();
        }
        out
    }
}

/// Add `src` into `dst` element-wise.
pub(crate) fn add_assign(dst: &mut [f32], src: &[f32]) {
    for (d, s) in dst.iter_mut().zip(src.iter()) {
        *d += s;
    }
}

/// Scale `v` in place by `factor`.
pub(crate) fn scale(v: &mut [f32], factor: f32) {
    for x in v.iter_mut() {
        *x *= factor;
    }
}
