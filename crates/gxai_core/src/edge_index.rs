//! Edge list type.

use burn::prelude::*;
use burn::tensor::TensorData;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// A list of directed `(source, target)` edges.
///
/// Undirected graphs are represented by storing both directions. The order
/// of edges is significant: edge masks and edge importances are aligned to it.
///
/// # Example
///
/// ```rust
/// use gxai_core::EdgeIndex;
///
/// let edges = EdgeIndex::from_pairs(&[(0, 1), (1, 2)]);
/// assert_eq!(edges.len(), 2);
/// assert_eq!(edges.sources(), vec![0, 1]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeIndex {
    edges: Vec<[usize; 2]>,
}

impl EdgeIndex {
    /// Create an edge index from `[source, target]` pairs.
    #[must_use]
    pub fn new(edges: Vec<[usize; 2]>) -> Self {
        Self { edges }
    }

    /// Create an edge index from tuples.
    #[must_use]
    pub fn from_pairs(pairs: &[(usize, usize)]) -> Self {
        Self {
            edges: pairs.iter().map(|&(s, t)| [s, t]).collect(),
        }
    }

    /// Undirected ring over `n` nodes, both directions stored.
    ///
    /// Edge order is `i -> i+1` followed by `i+1 -> i` for each `i`.
    #[must_use]
    pub fn ring(n: usize) -> Self {
        let mut edges = Vec::with_capacity(2 * n);
        if n < 2 {
            return Self { edges };
        }
        for i in 0..n {
            let j = (i + 1) % n;
            edges.push([i, j]);
            edges.push([j, i]);
        }
        Self { edges }
    }

    /// Number of edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Check if there are no edges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Iterate over `[source, target]` pairs.
    pub fn iter(&self) -> impl Iterator<Item = &[usize; 2]> {
        self.edges.iter()
    }

    /// Borrow the raw pairs.
    #[must_use]
    pub fn as_slice(&self) -> &[[usize; 2]] {
        &self.edges
    }

    /// Source node of every edge.
    #[must_use]
    pub fn sources(&self) -> Vec<usize> {
        self.edges.iter().map(|e| e[0]).collect()
    }

    /// Target node of every edge.
    #[must_use]
    pub fn targets(&self) -> Vec<usize> {
        self.edges.iter().map(|e| e[1]).collect()
    }

    /// Check that every endpoint is a valid node index.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EdgeOutOfRange`] for the first offending edge.
    pub fn validate(&self, num_nodes: usize) -> Result<()> {
        for (edge, &[s, t]) in self.edges.iter().enumerate() {
            if s >= num_nodes || t >= num_nodes {
                return Err(CoreError::EdgeOutOfRange {
                    edge,
                    source_node: s,
                    target_node: t,
                    num_nodes,
                });
            }
        }
        Ok(())
    }

    /// Keep only edges whose mask entry is true.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ShapeMismatch`] if the mask length differs from the edge count.
    pub fn filter(&self, mask: &[bool]) -> Result<Self> {
        if mask.len() != self.edges.len() {
            return Err(CoreError::ShapeMismatch(format!(
                "edge mask has {} entries for {} edges",
                mask.len(),
                self.edges.len()
            )));
        }
        Ok(Self {
            edges: self
                .edges
                .iter()
                .zip(mask)
                .filter(|(_, &keep)| keep)
                .map(|(e, _)| *e)
                .collect(),
        })
    }

    /// Convert to a `(2, E)` integer tensor in the PyG layout.
    pub fn to_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 2, Int> {
        let mut flat: Vec<i64> = Vec::with_capacity(2 * self.edges.len());
        flat.extend(self.edges.iter().map(|e| e[0] as i64));
        flat.extend(self.edges.iter().map(|e| e[1] as i64));
        Tensor::from_data(TensorData::new(flat, [2, self.edges.len()]), device)
    }
}

impl From<Vec<[usize; 2]>> for EdgeIndex {
    fn from(edges: Vec<[usize; 2]>) -> Self {
        Self::new(edges)
    }
}

impl<'a> IntoIterator for &'a EdgeIndex {
    type Item = &'a [usize; 2];
    type IntoIter = std::slice::Iter<'a, [usize; 2]>;

    fn into_iter(self) -> Self::IntoIter {
        self.edges.iter()
    }
}
