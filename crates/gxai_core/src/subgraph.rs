//! k-hop subgraph extraction.
//!
//! A node's prediction in an `L`-layer message-passing model depends only on
//! its `L`-hop neighborhood, so node explanations run on that induced
//! subgraph instead of the full graph.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::edge_index::EdgeIndex;
use crate::error::{CoreError, Result};

/// Direction in which edges are followed while growing the neighborhood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    /// Messages flow from source to target: an edge `(s, t)` with `t` in the
    /// frontier pulls `s` into the neighborhood.
    #[default]
    SourceToTarget,
    /// An edge `(s, t)` with `s` in the frontier pulls `t` into the neighborhood.
    TargetToSource,
}

/// Induced k-hop neighborhood of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubgraphContext {
    /// Original node ids in the neighborhood, ordered and unique.
    pub subset: Vec<usize>,
    /// Retained edges, relabeled to positions in `subset`.
    pub edge_index: EdgeIndex,
    /// Local positions of the centre node(s) inside `subset`.
    pub mapping: Vec<usize>,
    /// Per original edge: whether it was retained. Same length as the original edge list.
    pub edge_mask: Vec<bool>,
}

impl SubgraphContext {
    /// Number of nodes in the neighborhood.
    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.subset.len()
    }

    /// Number of retained edges.
    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.edge_index.len()
    }

    /// Local index of an original node id, if it is part of the neighborhood.
    #[must_use]
    pub fn local_index(&self, node: usize) -> Option<usize> {
        self.subset.iter().position(|&n| n == node)
    }

    /// Original ids of the retained edges' positions in the full edge list.
    #[must_use]
    pub fn retained_edges(&self) -> Vec<usize> {
        self.edge_mask
            .iter()
            .enumerate()
            .filter_map(|(i, &kept)| kept.then_some(i))
            .collect()
    }
}

/// Source of k-hop neighborhoods for node explanations.
///
/// Implementations must include `node_idx` in the returned subset for any
/// valid node and hop count.
pub trait SubgraphExtractor: Send + Sync {
    /// Extract the `num_hops` neighborhood of `node_idx`.
    ///
    /// # Errors
    ///
    /// Returns an error if `node_idx` or an edge endpoint is out of range.
    fn extract(
        &self,
        node_idx: usize,
        num_hops: usize,
        edge_index: &EdgeIndex,
        num_nodes: usize,
    ) -> Result<SubgraphContext>;
}

/// Breadth-first k-hop extractor with node relabeling.
///
/// # Example
///
/// ```rust
/// use gxai_core::{EdgeIndex, KHopExtractor, SubgraphExtractor};
///
/// let edges = EdgeIndex::from_pairs(&[(0, 1), (1, 2), (2, 3)]);
/// let ctx = KHopExtractor::default().extract(2, 1, &edges, 4).unwrap();
///
/// assert_eq!(ctx.subset, vec![1, 2]);
/// assert_eq!(ctx.mapping, vec![1]);
/// assert_eq!(ctx.edge_mask, vec![false, true, false]);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KHopExtractor {
    /// Edge direction to follow.
    pub flow: Flow,
}

impl KHopExtractor {
    /// Create an extractor following the given flow.
    #[must_use]
    pub const fn new(flow: Flow) -> Self {
        Self { flow }
    }
}

impl SubgraphExtractor for KHopExtractor {
    fn extract(
        &self,
        node_idx: usize,
        num_hops: usize,
        edge_index: &EdgeIndex,
        num_nodes: usize,
    ) -> Result<SubgraphContext> {
        k_hop_subgraph(node_idx, num_hops, edge_index, num_nodes, self.flow)
    }
}

/// Compute the induced `num_hops` neighborhood of `node_idx`.
///
/// The subset is sorted by original id, so relabeling preserves relative
/// node order. An edge is retained iff both endpoints are in the subset.
///
/// # Errors
///
/// Returns [`CoreError::NodeOutOfRange`] or [`CoreError::EdgeOutOfRange`]
/// for invalid indices.
pub fn k_hop_subgraph(
    node_idx: usize,
    num_hops: usize,
    edge_index: &EdgeIndex,
    num_nodes: usize,
    flow: Flow,
) -> Result<SubgraphContext> {
    if node_idx >= num_nodes {
        return Err(CoreError::NodeOutOfRange {
            node: node_idx,
            num_nodes,
        });
    }
    edge_index.validate(num_nodes)?;

    let mut in_subset = vec![false; num_nodes];
    in_subset[node_idx] = true;
    let mut frontier = vec![node_idx];

    for _ in 0..num_hops {
        let mut in_frontier = vec![false; num_nodes];
        for &n in &frontier {
            in_frontier[n] = true;
        }

        let mut next = BTreeSet::new();
        for &[s, t] in edge_index {
            let (anchor, reached) = match flow {
                Flow::SourceToTarget => (t, s),
                Flow::TargetToSource => (s, t),
            };
            if in_frontier[anchor] && !in_subset[reached] {
                next.insert(reached);
            }
        }
        if next.is_empty() {
            break;
        }
        for &n in &next {
            in_subset[n] = true;
        }
        frontier = next.into_iter().collect();
    }

    let subset: Vec<usize> = (0..num_nodes).filter(|&n| in_subset[n]).collect();

    let mut local = vec![usize::MAX; num_nodes];
    for (i, &n) in subset.iter().enumerate() {
        local[n] = i;
    }

    let edge_mask: Vec<bool> = edge_index
        .iter()
        .map(|&[s, t]| in_subset[s] && in_subset[t])
        .collect();
    let relabeled = edge_index
        .iter()
        .zip(&edge_mask)
        .filter(|(_, &kept)| kept)
        .map(|(&[s, t], _)| [local[s], local[t]])
        .collect();

    tracing::trace!(
        node_idx,
        num_hops,
        subset_len = subset.len(),
        "extracted k-hop subgraph"
    );

    Ok(SubgraphContext {
        mapping: vec![local[node_idx]],
        subset,
        edge_index: EdgeIndex::new(relabeled),
        edge_mask,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_edges() -> EdgeIndex {
        // 0 -> 1 -> 2 -> 3 -> 4
        EdgeIndex::from_pairs(&[(0, 1), (1, 2), (2, 3), (3, 4)])
    }

    #[test]
    fn test_zero_hops_is_node_only() {
        let ctx = k_hop_subgraph(2, 0, &EdgeIndex::ring(5), 5, Flow::SourceToTarget).unwrap();
        assert_eq!(ctx.subset, vec![2]);
        assert_eq!(ctx.mapping, vec![0]);
        assert!(ctx.edge_index.is_empty());
        assert_eq!(ctx.edge_mask, vec![false; 10]);
    }

    #[test]
    fn test_ring_one_hop() {
        let edges = EdgeIndex::ring(5);
        let ctx = k_hop_subgraph(2, 1, &edges, 5, Flow::SourceToTarget).unwrap();

        assert_eq!(ctx.subset, vec![1, 2, 3]);
        assert_eq!(ctx.mapping, vec![1]);
        assert_eq!(ctx.edge_mask.len(), edges.len());
        // 1<->2 and 2<->3 survive
        assert_eq!(ctx.retained_edges(), vec![2, 3, 4, 5]);
        assert_eq!(
            ctx.edge_index,
            EdgeIndex::from_pairs(&[(0, 1), (1, 0), (1, 2), (2, 1)])
        );
    }

    #[test]
    fn test_ring_two_hops_covers_graph() {
        let ctx = k_hop_subgraph(0, 2, &EdgeIndex::ring(5), 5, Flow::SourceToTarget).unwrap();
        assert_eq!(ctx.subset, vec![0, 1, 2, 3, 4]);
        assert!(ctx.edge_mask.iter().all(|&m| m));
        assert_eq!(ctx.num_edges(), 10);
    }

    #[test]
    fn test_source_to_target_follows_incoming() {
        let ctx = k_hop_subgraph(2, 2, &path_edges(), 5, Flow::SourceToTarget).unwrap();
        assert_eq!(ctx.subset, vec![0, 1, 2]);
        assert_eq!(ctx.mapping, vec![2]);
        assert_eq!(ctx.edge_mask, vec![true, true, false, false]);
        assert_eq!(ctx.edge_index, EdgeIndex::from_pairs(&[(0, 1), (1, 2)]));
    }

    #[test]
    fn test_target_to_source_follows_outgoing() {
        let ctx = k_hop_subgraph(2, 2, &path_edges(), 5, Flow::TargetToSource).unwrap();
        assert_eq!(ctx.subset, vec![2, 3, 4]);
        assert_eq!(ctx.mapping, vec![0]);
        assert_eq!(ctx.edge_mask, vec![false, false, true, true]);
    }

    #[test]
    fn test_induced_edges_between_neighbors() {
        // Star around 0 plus an edge between two leaves.
        let edges = EdgeIndex::from_pairs(&[(1, 0), (2, 0), (3, 0), (1, 2), (4, 3)]);
        let ctx = k_hop_subgraph(0, 1, &edges, 5, Flow::SourceToTarget).unwrap();
        assert_eq!(ctx.subset, vec![0, 1, 2, 3]);
        // 1 -> 2 is induced even though it was not traversed
        assert_eq!(ctx.edge_mask, vec![true, true, true, true, false]);
    }

    #[test]
    fn test_isolated_node() {
        let edges = EdgeIndex::from_pairs(&[(0, 1)]);
        let ctx = k_hop_subgraph(2, 3, &edges, 3, Flow::SourceToTarget).unwrap();
        assert_eq!(ctx.subset, vec![2]);
        assert_eq!(ctx.local_index(2), Some(0));
        assert_eq!(ctx.local_index(0), None);
    }

    #[test]
    fn test_out_of_range() {
        let edges = EdgeIndex::ring(3);
        assert!(matches!(
            k_hop_subgraph(3, 1, &edges, 3, Flow::SourceToTarget),
            Err(CoreError::NodeOutOfRange { node: 3, num_nodes: 3 })
        ));
        assert!(matches!(
            k_hop_subgraph(0, 1, &EdgeIndex::from_pairs(&[(0, 9)]), 3, Flow::SourceToTarget),
            Err(CoreError::EdgeOutOfRange { .. })
        ));
    }

    #[test]
    fn test_extractor_trait() {
        let extractor = KHopExtractor::new(Flow::TargetToSource);
        let ctx = extractor.extract(0, 1, &path_edges(), 5).unwrap();
        assert_eq!(ctx.subset, vec![0, 1]);
    }

    #[test]
    fn test_context_serialization() {
        let ctx = k_hop_subgraph(1, 1, &path_edges(), 5, Flow::SourceToTarget).unwrap();
        let json = serde_json::to_string(&ctx).unwrap();
        let restored: SubgraphContext = serde_json::from_str(&json).unwrap();
        assert_eq!(ctx, restored);
    }
}
