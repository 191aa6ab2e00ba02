//! Multi-relational graph structures.
//!
//! Provides the batch-scoped neighbor structure consumed by a layer's
//! forward pass.

pub mod dense;

pub use dense::{DenseGraph, Direction};
