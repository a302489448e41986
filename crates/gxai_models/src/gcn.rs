//! GCN: Graph Convolutional Network (Kipf & Welling, 2017).

use burn::nn::{Linear, LinearConfig, Relu};
use burn::prelude::*;
use burn::tensor::TensorData;
use gxai_core::{EdgeIndex, ForwardArgs, GraphModel};
use serde::{Deserialize, Serialize};

use crate::pool::global_mean_pool;

/// Symmetrically normalized adjacency `D^{-1/2} (A + I) D^{-1/2}`.
///
/// Entry `[t, s]` weights the message from `s` to `t`, so `Â X` aggregates
/// incoming neighbors. Duplicate edges add up. Rows of nodes without
/// incoming edges (and no self loop) are zero.
///
/// The matrix is dense and rebuilt on every forward pass, so memory grows
/// with `num_nodes²`. Meant for the small graphs and k-hop subgraphs this
/// crate explains.
pub fn normalized_adjacency<B: Backend>(
    edge_index: &EdgeIndex,
    num_nodes: usize,
    self_loops: bool,
    device: &B::Device,
) -> Tensor<B, 2> {
    let mut adj = vec![0.0f32; num_nodes * num_nodes];
    for &[s, t] in edge_index {
        adj[t * num_nodes + s] += 1.0;
    }
    if self_loops {
        for i in 0..num_nodes {
            adj[i * num_nodes + i] += 1.0;
        }
    }

    let inv_sqrt_deg: Vec<f32> = (0..num_nodes)
        .map(|t| {
            let deg: f32 = adj[t * num_nodes..(t + 1) * num_nodes].iter().sum();
            if deg > 0.0 {
                deg.sqrt().recip()
            } else {
                0.0
            }
        })
        .collect();

    for t in 0..num_nodes {
        for s in 0..num_nodes {
            adj[t * num_nodes + s] *= inv_sqrt_deg[t] * inv_sqrt_deg[s];
        }
    }

    Tensor::from_data(TensorData::new(adj, [num_nodes, num_nodes]), device)
}

/// Single graph convolution: `Â X W`.
#[derive(Module, Debug)]
pub struct GcnConv<B: Backend> {
    linear: Linear<B>,
    #[module(skip)]
    self_loops: bool,
}

impl<B: Backend> GcnConv<B> {
    /// Create a layer with self loops.
    pub fn new(in_features: usize, out_features: usize, device: &B::Device) -> Self {
        Self {
            linear: LinearConfig::new(in_features, out_features).init(device),
            self_loops: true,
        }
    }

    /// Create a layer without self loops.
    pub fn without_self_loops(in_features: usize, out_features: usize, device: &B::Device) -> Self {
        Self {
            self_loops: false,
            ..Self::new(in_features, out_features, device)
        }
    }

    /// Forward pass.
    ///
    /// # Arguments
    ///
    /// * `x` - Node features (num_nodes, in_features)
    /// * `edge_index` - Directed edges
    ///
    /// # Returns
    ///
    /// Node embeddings (num_nodes, out_features)
    pub fn forward(&self, x: Tensor<B, 2>, edge_index: &EdgeIndex) -> Tensor<B, 2> {
        let [num_nodes, _] = x.dims();
        let adj = normalized_adjacency::<B>(edge_index, num_nodes, self.self_loops, &x.device());
        adj.matmul(self.linear.forward(x))
    }
}

/// Configuration for the GCN model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcnConfig {
    /// Input features per node.
    pub in_features: usize,
    /// Output scores per node (or per graph when pooling).
    pub out_features: usize,
    /// Hidden layer sizes; the number of layers is `hidden_sizes.len() + 1`.
    pub hidden_sizes: Vec<usize>,
    /// Whether to add self loops to the adjacency.
    pub self_loops: bool,
    /// Whether to mean-pool node outputs into graph outputs.
    pub pool: bool,
}

impl Default for GcnConfig {
    fn default() -> Self {
        Self {
            in_features: 1,
            out_features: 2,
            hidden_sizes: vec![16, 16],
            self_loops: true,
            pool: false,
        }
    }
}

impl GcnConfig {
    /// Create a new config.
    pub fn new(in_features: usize, out_features: usize) -> Self {
        Self {
            in_features,
            out_features,
            ..Default::default()
        }
    }

    /// Set hidden layer sizes.
    #[must_use]
    pub fn with_hidden_sizes(mut self, sizes: Vec<usize>) -> Self {
        self.hidden_sizes = sizes;
        self
    }

    /// Enable or disable self loops.
    #[must_use]
    pub fn with_self_loops(mut self, self_loops: bool) -> Self {
        self.self_loops = self_loops;
        self
    }

    /// Enable or disable graph-level mean pooling.
    #[must_use]
    pub fn with_pool(mut self, pool: bool) -> Self {
        self.pool = pool;
        self
    }

    /// Number of message-passing layers.
    pub fn num_layers(&self) -> usize {
        self.hidden_sizes.len() + 1
    }

    /// Initialize the model on `device`.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Gcn<B> {
        Gcn::new(self.clone(), device)
    }
}

/// Stack of GCN layers with ReLU in between.
///
/// # Architecture
///
/// ```text
/// X (N, D)
///   |
///   +---> [GcnConv + ReLU] x hidden
///   |
///   +---> [GcnConv] -> (N, out)
///   |
///   +---> [global_mean_pool]? -> (G, out)
/// ```
#[derive(Module, Debug)]
pub struct Gcn<B: Backend> {
    layers: Vec<GcnConv<B>>,
    #[module(skip)]
    pool: bool,
}

impl<B: Backend> Gcn<B> {
    /// Create a model from its config.
    pub fn new(config: GcnConfig, device: &B::Device) -> Self {
        let mut sizes = Vec::with_capacity(config.hidden_sizes.len() + 2);
        sizes.push(config.in_features);
        sizes.extend(config.hidden_sizes.iter().copied());
        sizes.push(config.out_features);

        let layers = sizes
            .windows(2)
            .map(|w| {
                if config.self_loops {
                    GcnConv::new(w[0], w[1], device)
                } else {
                    GcnConv::without_self_loops(w[0], w[1], device)
                }
            })
            .collect();

        Self {
            layers,
            pool: config.pool,
        }
    }

    /// Forward pass through all layers, with optional pooling by `batch`.
    pub fn forward(&self, x: Tensor<B, 2>, edge_index: &EdgeIndex, batch: Option<&[usize]>) -> Tensor<B, 2> {
        let last = self.layers.len().saturating_sub(1);
        let mut out = x;
        for (i, layer) in self.layers.iter().enumerate() {
            out = layer.forward(out, edge_index);
            if i < last {
                out = Relu::new().forward(out);
            }
        }
        if self.pool {
            global_mean_pool(out, batch)
        } else {
            out
        }
    }
}

impl<B: Backend> GraphModel<B> for Gcn<B> {
    fn forward(&self, x: Tensor<B, 2>, edge_index: &EdgeIndex, args: &ForwardArgs) -> Tensor<B, 2> {
        Gcn::forward(self, x, edge_index, args.batch.as_deref())
    }

    fn num_layers(&self) -> Option<usize> {
        Some(self.layers.len())
    }
}
