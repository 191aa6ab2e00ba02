//! Relational graph convolution (R-GCN) layer.
//!
//! Owns one transformation matrix per relation and direction plus a
//! self-loop matrix, and computes per-node outputs by aggregating neighbor
//! contributions relation by relation.

use crate::core::{Error, Result};
use crate::graph::{DenseGraph, Direction};
use crate::layers::activation::Activation;
use crate::layers::config::{Aggregation, Device, LayerConfig};
use crate::layers::init::InitConfig;
use crate::layers::matrix::{add_assign, scale, Matrix};
use crate::layers::GnnLayer;
use std::collections::HashMap;
use tracing::debug;

/// Defaulted arguments of the convenience constructor.
///
/// Mirrors the defaults a caller gets when only dimensions and relation
/// count are known: host device, Glorot-uniform weights, no bias, zeros
/// bias init, identity activation.
#[derive(Clone, Debug)]
pub struct RgcnOptions {
    /// Compute device; `None` selects the host.
    pub device: Option<Device>,
    /// Weight initialization distribution.
    pub init: InitConfig,
    /// Whether to add a learnable bias vector.
    pub bias: bool,
    /// Bias initialization distribution.
    pub bias_init: InitConfig,
    /// Activation function.
    pub activation: Activation,
}

impl Default for RgcnOptions {
    fn default() -> Self {
        Self {
            device: None,
            init: InitConfig::GlorotUniform,
            bias: false,
            bias_init: InitConfig::Zeros,
            activation: Activation::None,
        }
    }
}

/// A relational graph convolution layer.
///
/// For each target node the output is the self-loop term plus, per relation,
/// the aggregated neighbor contributions in both edge directions, followed
/// by bias and activation:
///
/// ```text
/// out(t) = act( W_self * x(t)
///             + sum_r W_r     * agg(x(n) for n in outgoing(r, t))
///             + sum_r W_r_inv * agg(x(n) for n in incoming(r, t))
///             + bias )
/// ```
///
/// An empty neighbor set contributes zero. The relation count is fixed at
/// construction; `reset` redraws parameter values but never reshapes them.
pub struct RgcnLayer {
    config: LayerConfig,
    num_relations: usize,
    device: Device,
    relation_matrices: Vec<Matrix>,
    inverse_relation_matrices: Vec<Matrix>,
    self_matrix: Matrix,
    bias: Option<Vec<f32>>,
}

impl RgcnLayer {
    /// Build a layer from a finalized configuration.
    ///
    /// All parameters are freshly drawn from the configured distributions.
    /// Fails with [`Error::InvalidConfig`] when a dimension is zero.
    pub fn new(config: LayerConfig, num_relations: usize, device: Device) -> Result<Self> {
        config.validate()?;

        let rows = config.output_dim;
        let cols = config.input_dim;
        let mut rng = rand::thread_rng();

        let relation_matrices: Vec<Matrix> = (0..num_relations)
            .map(|_| Matrix::init(rows, cols, &config.init, &mut rng))
            .collect();
        let inverse_relation_matrices: Vec<Matrix> = (0..num_relations)
            .map(|_| Matrix::init(rows, cols, &config.init, &mut rng))
            .collect();
        let self_matrix = Matrix::init(rows, cols, &config.init, &mut rng);
        let bias = config
            .bias
            .then(|| config.bias_init.fill_vec(rows, &mut rng));

        debug!(
            input_dim = cols,
            output_dim = rows,
            num_relations,
            ?device,
            "constructed rgcn layer"
        );

        Ok(Self {
            config,
            num_relations,
            device,
            relation_matrices,
            inverse_relation_matrices,
            self_matrix,
            bias,
        })
    }

    /// Build a layer from dimensions alone.
    ///
    /// Internally assembles a GNN-tagged [`LayerConfig`] with no optimizer
    /// attached, applying the defaults in [`RgcnOptions`], then delegates to
    /// [`RgcnLayer::new`].
    pub fn with_dims(
        input_dim: usize,
        output_dim: usize,
        num_relations: usize,
        options: RgcnOptions,
    ) -> Result<Self> {
        let mut config = LayerConfig::gnn(input_dim, output_dim);
        config.init = options.init;
        config.bias = options.bias;
        config.bias_init = options.bias_init;
        config.activation = options.activation;
        Self::new(config, num_relations, options.device.unwrap_or_default())
    }

    /// The layer configuration.
    pub fn config(&self) -> &LayerConfig {
        &self.config
    }

    /// Number of relation types, fixed at construction.
    pub fn num_relations(&self) -> usize {
        self.num_relations
    }

    /// Device the parameters are placed on.
    pub fn device(&self) -> Device {
        self.device
    }

    /// Per-relation matrices for the natural edge direction.
    pub fn relation_matrices(&self) -> &[Matrix] {
        &self.relation_matrices
    }

    /// Per-relation matrices for the reverse edge direction.
    pub fn inverse_relation_matrices(&self) -> &[Matrix] {
        &self.inverse_relation_matrices
    }

    /// The self-loop matrix.
    pub fn self_matrix(&self) -> &Matrix {
        &self.self_matrix
    }

    /// The bias vector, when the layer was configured with one.
    pub fn bias(&self) -> Option<&[f32]> {
        self.bias.as_deref()
    }

    /// Redraw every owned parameter in place from its configured
    /// distribution. Shapes are preserved; each call redraws fresh values,
    /// so only deterministic distributions reproduce the same parameters.
    pub fn reset(&mut self) {
        let mut rng = rand::thread_rng();
        for m in self
            .relation_matrices
            .iter_mut()
            .chain(self.inverse_relation_matrices.iter_mut())
        {
            m.refill(&self.config.init, &mut rng);
        }
        self.self_matrix.refill(&self.config.init, &mut rng);
        if let Some(bias) = self.bias.as_mut() {
            *bias = self.config.bias_init.fill_vec(bias.len(), &mut rng);
        }
        debug!(num_relations = self.num_relations, "reset rgcn layer");
    }

    /// Run message passing over one batch.
    ///
    /// `inputs` maps every node the batch touches (targets and their
    /// neighbors) to its feature vector of length `input_dim`; `graph`
    /// supplies the batch's targets and per-relation adjacency. The result
    /// maps each target to its output vector of length `output_dim`.
    ///
    /// `train` does not change the numeric output: this execution path keeps
    /// no gradient tape, so the flag is only surfaced to the structured log
    /// and reserved for runtimes that track gradients.
    pub fn forward(
        &self,
        inputs: &HashMap<String, Vec<f32>>,
        graph: &DenseGraph,
        train: bool,
    ) -> Result<HashMap<String, Vec<f32>>> {
        let input_dim = self.config.input_dim;
        for (node, features) in inputs {
            if features.len() != input_dim {
                return Err(Error::ShapeMismatch {
                    node: node.clone(),
                    expected: input_dim,
                    found: features.len(),
                });
            }
        }
        if let Some(relation) = graph.max_relation() {
            if relation >= self.num_relations {
                return Err(Error::RelationOutOfRange {
                    relation,
                    num_relations: self.num_relations,
                });
            }
        }

        let mut outputs = HashMap::with_capacity(graph.targets().len());
        for target in graph.targets() {
            let self_features = inputs
                .get(target)
                .ok_or_else(|| Error::MissingFeatures(target.clone()))?;
            let mut out = self.self_matrix.matvec(self_features);

            for relation in 0..self.num_relations {
                let sides = [
                    (Direction::Outgoing, &self.relation_matrices[relation]),
                    (Direction::Incoming, &self.inverse_relation_matrices[relation]),
                ];
                for (direction, matrix) in sides {
                    let neighbors = graph.neighbors(relation, direction, target);
                    if neighbors.is_empty() {
                        continue;
                    }
                    let aggregated = self.aggregate(neighbors, inputs)?;
                    add_assign(&mut out, &matrix.matvec(&aggregated));
                }
            }

            if let Some(bias) = &self.bias {
                add_assign(&mut out, bias);
            }
            self.config.activation.apply(&mut out);
            outputs.insert(target.clone(), out);
        }

        debug!(
            targets = graph.targets().len(),
            edges = graph.num_edges(),
            train,
            "rgcn forward"
        );
        Ok(outputs)
    }

    /// Replace every parameter at once. The caller has already verified the
    /// shape invariants; see `load_state`.
    pub(crate) fn set_parameters(
        &mut self,
        relation_matrices: Vec<Matrix>,
        inverse_relation_matrices: Vec<Matrix>,
        self_matrix: Matrix,
        bias: Option<Vec<f32>>,
    ) {
        self.relation_matrices = relation_matrices;
        self.inverse_relation_matrices = inverse_relation_matrices;
        self.self_matrix = self_matrix;
        self.bias = bias;
    }

    /// Aggregate one neighbor set's feature vectors.
    ///
    /// The relation transform is linear, so aggregating features first and
    /// transforming once is equivalent to transforming each neighbor.
    fn aggregate(
        &self,
        neighbors: &[String],
        inputs: &HashMap<String, Vec<f32>>,
    ) -> Result<Vec<f32>> {
        let mut acc = vec![0.0; self.config.input_dim];
        for neighbor in neighbors {
            let features = inputs
                .get(neighbor)
                .ok_or_else(|| Error::MissingFeatures(neighbor.clone()))?;
            add_assign(&mut acc, features);
        }
        if self.config.options.aggregation == Aggregation::Mean {
            scale(&mut acc, 1.0 / neighbors.len() as f32);
        }
        Ok(acc)
    }
}

impl GnnLayer for RgcnLayer {
    fn input_dim(&self) -> usize {
        self.config.input_dim
    }

    fn output_dim(&self) -> usize {
        self.config.output_dim
    }

    fn reset(&mut self) {
        RgcnLayer::reset(self);
    }

    fn forward(
        &self,
        inputs: &HashMap<String, Vec<f32>>,
        graph: &DenseGraph,
        train: bool,
    ) -> Result<HashMap<String, Vec<f32>>> {
        RgcnLayer::forward(self, inputs, graph, train)
    }

    fn parameters(&self) -> Vec<&Matrix> {
        self.relation_matrices
            .iter()
            .chain(self.inverse_relation_matrices.iter())
            .chain(std::iter::once(&self.self_matrix))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zeros_layer(
        input_dim: usize,
        output_dim: usize,
        num_relations: usize,
    ) -> RgcnLayer {
        RgcnLayer::with_dims(
            input_dim,
            output_dim,
            num_relations,
            RgcnOptions {
                init: InitConfig::Zeros,
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn constant_layer(
        input_dim: usize,
        output_dim: usize,
        num_relations: usize,
        value: f32,
    ) -> RgcnLayer {
        RgcnLayer::with_dims(
            input_dim,
            output_dim,
            num_relations,
            RgcnOptions {
                init: InitConfig::Constant(value),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn test_construction_shapes() {
        let layer = RgcnLayer::with_dims(4, 2, 3, RgcnOptions::default()).unwrap();
        assert_eq!(layer.relation_matrices().len(), 3);
        assert_eq!(layer.inverse_relation_matrices().len(), 3);
        assert_eq!(layer.num_relations(), 3);
        for m in layer.parameters() {
            assert_eq!(m.rows(), 2);
            assert_eq!(m.cols(), 4);
        }
        assert!(layer.bias().is_none());
        assert_eq!(layer.device(), Device::Cpu);
    }

    #[test]
    fn test_zero_relations_is_valid() {
        let layer = zeros_layer(4, 2, 0);
        assert!(layer.relation_matrices().is_empty());
        assert!(layer.inverse_relation_matrices().is_empty());
    }

    #[test]
    fn test_invalid_dims_rejected() {
        assert!(matches!(
            RgcnLayer::with_dims(0, 2, 1, RgcnOptions::default()),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            RgcnLayer::new(LayerConfig::gnn(4, 0), 1, Device::Cpu),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_bias_shape() {
        let layer = RgcnLayer::with_dims(
            4,
            2,
            1,
            RgcnOptions {
                bias: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(layer.bias().unwrap(), &[0.0, 0.0]);
    }

    #[test]
    fn test_forward_isolated_node_zero_init() {
        // input_dim=4, output_dim=2, one relation, zeros everywhere: an
        // isolated node maps to the zero vector.
        let layer = zeros_layer(4, 2, 1);
        let mut inputs = HashMap::new();
        inputs.insert("t".to_string(), vec![1.0, 1.0, 1.0, 1.0]);
        let graph = DenseGraph::new(["t"]);

        let outputs = layer.forward(&inputs, &graph, true).unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs["t"], vec![0.0, 0.0]);
    }

    #[test]
    fn test_forward_neighbor_zero_init() {
        // A neighbor under relation 0 exercises the aggregation path but
        // cannot move a zero-weight result.
        let layer = zeros_layer(4, 2, 2);
        let mut inputs = HashMap::new();
        inputs.insert("t".to_string(), vec![1.0, 1.0, 1.0, 1.0]);
        inputs.insert("s".to_string(), vec![9.0, -3.0, 0.5, 7.0]);
        let mut graph = DenseGraph::new(["t"]);
        graph.add_edge(0, Direction::Outgoing, "t", "s");

        let outputs = layer.forward(&inputs, &graph, true).unwrap();
        assert_eq!(outputs["t"], vec![0.0, 0.0]);
    }

    #[test]
    fn test_forward_mean_aggregation() {
        // All weights 1.0: self term is sum(x_t) per row, neighbor term is
        // sum(mean of neighbor features) per row.
        let layer = constant_layer(2, 1, 1, 1.0);
        let mut inputs = HashMap::new();
        inputs.insert("t".to_string(), vec![1.0, 2.0]);
        inputs.insert("a".to_string(), vec![1.0, 1.0]);
        inputs.insert("b".to_string(), vec![3.0, 5.0]);
        let mut graph = DenseGraph::new(["t"]);
        graph.add_edge(0, Direction::Outgoing, "t", "a");
        graph.add_edge(0, Direction::Outgoing, "t", "b");

        // self: 1+2 = 3; mean neighbors: [2, 3] -> 5; total 8.
        let outputs = layer.forward(&inputs, &graph, true).unwrap();
        assert_eq!(outputs["t"], vec![8.0]);
    }

    #[test]
    fn test_forward_sum_aggregation() {
        let mut config = LayerConfig::gnn(2, 1);
        config.init = InitConfig::Constant(1.0);
        config.options.aggregation = Aggregation::Sum;
        let layer = RgcnLayer::new(config, 1, Device::Cpu).unwrap();

        let mut inputs = HashMap::new();
        inputs.insert("t".to_string(), vec![1.0, 2.0]);
        inputs.insert("a".to_string(), vec![1.0, 1.0]);
        inputs.insert("b".to_string(), vec![3.0, 5.0]);
        let mut graph = DenseGraph::new(["t"]);
        graph.add_edge(0, Direction::Outgoing, "t", "a");
        graph.add_edge(0, Direction::Outgoing, "t", "b");

        // self: 3; summed neighbors: [4, 6] -> 10; total 13.
        let outputs = layer.forward(&inputs, &graph, true).unwrap();
        assert_eq!(outputs["t"], vec![13.0]);
    }

    #[test]
    fn test_incoming_edges_use_inverse_matrices() {
        // Forward matrices zero, inverse matrices all ones: only an
        // incoming edge can move the output.
        use crate::layers::state::LayerState;

        let mut rng = rand::thread_rng();
        let mut layer = zeros_layer(2, 1, 1);
        layer
            .load_state(LayerState {
                input_dim: 2,
                output_dim: 1,
                num_relations: 1,
                relation_matrices: vec![Matrix::zeros(1, 2)],
                inverse_relation_matrices: vec![Matrix::init(
                    1,
                    2,
                    &InitConfig::Ones,
                    &mut rng,
                )],
                self_matrix: Matrix::zeros(1, 2),
                bias: None,
            })
            .unwrap();

        let mut inputs = HashMap::new();
        inputs.insert("t".to_string(), vec![1.0, 1.0]);
        inputs.insert("s".to_string(), vec![2.0, 3.0]);

        let mut outgoing = DenseGraph::new(["t"]);
        outgoing.add_edge(0, Direction::Outgoing, "t", "s");
        assert_eq!(layer.forward(&inputs, &outgoing, true).unwrap()["t"], vec![0.0]);

        let mut incoming = DenseGraph::new(["t"]);
        incoming.add_edge(0, Direction::Incoming, "t", "s");
        assert_eq!(layer.forward(&inputs, &incoming, true).unwrap()["t"], vec![5.0]);
    }

    #[test]
    fn test_forward_linearity_pre_activation() {
        // Identity activation: scaling every input scales the output.
        let layer = constant_layer(3, 2, 2, 0.5);
        let mut inputs = HashMap::new();
        inputs.insert("t".to_string(), vec![1.0, 2.0, 3.0]);
        inputs.insert("s".to_string(), vec![4.0, 5.0, 6.0]);
        let mut graph = DenseGraph::new(["t"]);
        graph.add_edge(1, Direction::Outgoing, "t", "s");
        graph.add_edge(0, Direction::Incoming, "t", "s");

        let base = layer.forward(&inputs, &graph, true).unwrap();
        let scaled_inputs: HashMap<String, Vec<f32>> = inputs
            .iter()
            .map(|(k, v)| (k.clone(), v.iter().map(|x| x * 2.0).collect()))
            .collect();
        let scaled = layer.forward(&scaled_inputs, &graph, true).unwrap();

        for (node, out) in &base {
            for (x, y) in out.iter().zip(scaled[node].iter()) {
                assert!((y - 2.0 * x).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_train_flag_does_not_change_values() {
        let layer = constant_layer(3, 2, 1, 0.25);
        let mut inputs = HashMap::new();
        inputs.insert("t".to_string(), vec![1.0, -1.0, 2.0]);
        inputs.insert("s".to_string(), vec![0.5, 0.5, 0.5]);
        let mut graph = DenseGraph::new(["t"]);
        graph.add_edge(0, Direction::Outgoing, "t", "s");

        let train = layer.forward(&inputs, &graph, true).unwrap();
        let eval = layer.forward(&inputs, &graph, false).unwrap();
        assert_eq!(train, eval);
    }

    #[test]
    fn test_bias_added_before_activation() {
        // W*x = -2, bias = 1, relu(-2 + 1) = 0. Activation before bias
        // would give 1.
        let layer = RgcnLayer::with_dims(
            1,
            1,
            0,
            RgcnOptions {
                init: InitConfig::Constant(-1.0),
                bias: true,
                bias_init: InitConfig::Ones,
                activation: Activation::Relu,
                ..Default::default()
            },
        )
        .unwrap();
        let mut inputs = HashMap::new();
        inputs.insert("t".to_string(), vec![2.0]);
        let graph = DenseGraph::new(["t"]);

        let outputs = layer.forward(&inputs, &graph, true).unwrap();
        assert_eq!(outputs["t"], vec![0.0]);
    }

    #[test]
    fn test_forward_rejects_bad_feature_length() {
        let layer = zeros_layer(4, 2, 1);
        let mut inputs = HashMap::new();
        inputs.insert("t".to_string(), vec![1.0, 1.0, 1.0]);
        let graph = DenseGraph::new(["t"]);

        assert!(matches!(
            layer.forward(&inputs, &graph, true),
            Err(Error::ShapeMismatch { expected: 4, found: 3, .. })
        ));
    }

    #[test]
    fn test_forward_rejects_out_of_range_relation() {
        let layer = zeros_layer(4, 2, 2);
        let mut inputs = HashMap::new();
        inputs.insert("t".to_string(), vec![0.0; 4]);
        inputs.insert("s".to_string(), vec![0.0; 4]);
        let mut graph = DenseGraph::new(["t"]);
        graph.add_edge(2, Direction::Outgoing, "t", "s");

        assert!(matches!(
            layer.forward(&inputs, &graph, true),
            Err(Error::RelationOutOfRange { relation: 2, num_relations: 2 })
        ));
    }

    #[test]
    fn test_forward_rejects_missing_neighbor_features() {
        let layer = zeros_layer(4, 2, 1);
        let mut inputs = HashMap::new();
        inputs.insert("t".to_string(), vec![0.0; 4]);
        let mut graph = DenseGraph::new(["t"]);
        graph.add_edge(0, Direction::Outgoing, "t", "ghost");

        assert!(matches!(
            layer.forward(&inputs, &graph, true),
            Err(Error::MissingFeatures(node)) if node == "ghost"
        ));
    }

    #[test]
    fn test_reset_deterministic_init_is_stable() {
        let mut layer = zeros_layer(4, 2, 2);
        layer.reset();
        let first: Vec<Vec<f32>> = layer
            .parameters()
            .iter()
            .map(|m| m.as_slice().to_vec())
            .collect();
        layer.reset();
        let second: Vec<Vec<f32>> = layer
            .parameters()
            .iter()
            .map(|m| m.as_slice().to_vec())
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_reset_redraws_random_init() {
        let mut layer = RgcnLayer::with_dims(8, 8, 1, RgcnOptions::default()).unwrap();
        let before = layer.self_matrix().as_slice().to_vec();
        layer.reset();
        let after = layer.self_matrix().as_slice().to_vec();
        assert_eq!(before.len(), after.len());
        assert_ne!(before, after);
    }

    #[test]
    fn test_trait_object_dispatch() {
        let layer: Box<dyn GnnLayer> = Box::new(zeros_layer(4, 2, 1));
        assert_eq!(layer.input_dim(), 4);
        assert_eq!(layer.output_dim(), 2);
        assert_eq!(layer.parameters().len(), 3);
    }
}
