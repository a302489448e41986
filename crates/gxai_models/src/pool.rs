//! Graph-level readout.

use burn::prelude::*;
use burn::tensor::TensorData;

/// Average node embeddings per graph.
///
/// # Arguments
///
/// * `x` - Node embeddings (num_nodes, features)
/// * `batch` - Graph id per node; `None` treats all nodes as one graph
///
/// # Returns
///
/// Graph embeddings (num_graphs, features). Graphs without nodes get zeros.
pub fn global_mean_pool<B: Backend>(x: Tensor<B, 2>, batch: Option<&[usize]>) -> Tensor<B, 2> {
    let [num_nodes, _] = x.dims();
    let Some(batch) = batch else {
        return x.mean_dim(0);
    };
    assert_eq!(
        batch.len(),
        num_nodes,
        "batch assignment must have one entry per node"
    );

    let num_graphs = batch.iter().max().map_or(0, |&g| g + 1);
    let mut counts = vec![0usize; num_graphs];
    for &g in batch {
        counts[g] += 1;
    }

    // (num_graphs, num_nodes) averaging matrix keeps the readout differentiable.
    let mut weights = vec![0.0f32; num_graphs * num_nodes];
    for (node, &g) in batch.iter().enumerate() {
        weights[g * num_nodes + node] = 1.0 / counts[g] as f32;
    }
    let pool = Tensor::<B, 2>::from_data(TensorData::new(weights, [num_graphs, num_nodes]), &x.device());
    pool.matmul(x)
}
