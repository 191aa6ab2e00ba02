//! # relconv - Relational Graph Convolution Layers
//!
//! A library implementing relational graph convolution (R-GCN) message
//! passing for multi-relational graphs:
//! - Per-relation transformation matrices in both edge directions plus a
//!   self-loop matrix
//! - Configurable initialization, bias, activation, and neighbor aggregation
//! - Batch-scoped dense graphs and map-keyed node features
//! - Shape-checked checkpoint snapshots for external persistence
//!
//! ## Quick Start
//!
//! ```rust
//! use std::collections::HashMap;
//! use relconv::graph::{DenseGraph, Direction};
//! use relconv::layers::{RgcnLayer, RgcnOptions};
//!
//! let layer = RgcnLayer::with_dims(4, 2, 1, RgcnOptions::default()).unwrap();
//!
//! let mut inputs = HashMap::new();
//! inputs.insert("paper".to_string(), vec![0.1, 0.2, 0.3, 0.4]);
//! inputs.insert("author".to_string(), vec![0.5, 0.5, 0.5, 0.5]);
//!
//! let mut graph = DenseGraph::new(["paper"]);
//! graph.add_edge(0, Direction::Outgoing, "paper", "author");
//!
//! let outputs = layer.forward(&inputs, &graph, false).unwrap();
//! assert_eq!(outputs["paper"].len(), 2);
//! ```

pub mod core;
pub mod graph;
pub mod layers;

pub use crate::core::error::{Error, Result};
