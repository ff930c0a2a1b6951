use std::collections::{HashMap, VecDeque};

use rayon::prelude::*;
use tracing::instrument;

use crate::tree::arena::{NodeIndex, PlacementTree};

/// All-pairs node path-length matrix (hop counts).
///
/// Rows are computed in parallel; each row is an independent BFS, so the
/// result does not depend on completion order.
#[derive(Debug, Clone)]
pub struct NodePathMatrix {
    index_of: HashMap<NodeIndex, usize>,
    dist: Vec<Vec<usize>>,
}

impl NodePathMatrix {
    #[instrument(level = "debug", skip(tree))]
    pub fn compute(tree: &PlacementTree) -> Self {
        let nodes: Vec<NodeIndex> = tree.nodes().map(|(idx, _)| idx).collect();
        let index_of: HashMap<NodeIndex, usize> = nodes
            .iter()
            .enumerate()
            .map(|(dense, &idx)| (idx, dense))
            .collect();

        let dist: Vec<Vec<usize>> = nodes
            .par_iter()
            .map(|&start| bfs_row(tree, start, &index_of))
            .collect();

        Self { index_of, dist }
    }

    /// Path length in hops between two nodes, None for stale indices.
    pub fn path_length(&self, a: NodeIndex, b: NodeIndex) -> Option<usize> {
        let row = *self.index_of.get(&a)?;
        let col = *self.index_of.get(&b)?;
        self.dist.get(row)?.get(col).copied()
    }

    pub fn node_count(&self) -> usize {
        self.dist.len()
    }
}

fn bfs_row(tree: &PlacementTree, start: NodeIndex, index_of: &HashMap<NodeIndex, usize>) -> Vec<usize> {
    let mut row = vec![usize::MAX; index_of.len()];
    if let Some(&dense) = index_of.get(&start) {
        row[dense] = 0;
    }
    let mut queue = VecDeque::from([(start, 0usize)]);
    while let Some((node_idx, depth)) = queue.pop_front() {
        let Some(node) = tree.node(node_idx) else {
            continue;
        };
        for &edge in &node.edges {
            let Some(far) = tree.other_end(edge, node_idx) else {
                continue;
            };
            let Some(&dense) = index_of.get(&far) else {
                continue;
            };
            if row[dense] == usize::MAX {
                row[dense] = depth + 1;
                queue.push_back((far, depth + 1));
            }
        }
    }
    row
}
