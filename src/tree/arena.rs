use std::collections::HashMap;

use generational_arena::{Arena, Index};
use tracing::instrument;

pub type NodeIndex = Index;
pub type EdgeIndex = Index;

/// Tree node: an optional label plus the incident edges.
///
/// Leaves carry their taxon name; internal nodes are usually unnamed.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Node label, empty when unnamed
    pub name: String,
    /// Indices of incident edges, in discovery order
    pub edges: Vec<EdgeIndex>,
}

impl TreeNode {
    pub fn degree(&self) -> usize {
        self.edges.len()
    }

    pub fn is_leaf(&self) -> bool {
        self.edges.len() == 1
    }
}

/// Tree edge with branch length and the dense jplace edge number.
#[derive(Debug, Clone)]
pub struct TreeEdge {
    /// Branch length, non-negative
    pub branch_length: f64,
    /// Dense post-order edge number, the external placement reference
    pub edge_num: usize,
    /// Endpoint on the traversal-root side
    pub primary: NodeIndex,
    /// Endpoint away from the traversal root
    pub secondary: NodeIndex,
}

/// Arena-based unrooted tree.
///
/// The root is only a traversal anchor: it defines primary/secondary edge
/// orientation and the post-order edge numbering, nothing else.
#[derive(Debug, Clone, Default)]
pub struct PlacementTree {
    nodes: Arena<TreeNode>,
    edges: Arena<TreeEdge>,
    root: Option<NodeIndex>,
}

impl PlacementTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_node(&mut self, name: impl Into<String>) -> NodeIndex {
        self.nodes.insert(TreeNode {
            name: name.into(),
            edges: Vec::new(),
        })
    }

    /// Connects two nodes with a new edge and registers it on both endpoints.
    #[instrument(level = "trace", skip(self))]
    pub fn connect(
        &mut self,
        primary: NodeIndex,
        secondary: NodeIndex,
        branch_length: f64,
        edge_num: usize,
    ) -> EdgeIndex {
        let edge_idx = self.edges.insert(TreeEdge {
            branch_length,
            edge_num,
            primary,
            secondary,
        });
        if let Some(node) = self.nodes.get_mut(primary) {
            node.edges.push(edge_idx);
        }
        if let Some(node) = self.nodes.get_mut(secondary) {
            node.edges.push(edge_idx);
        }
        edge_idx
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&TreeNode> {
        self.nodes.get(idx)
    }

    pub fn node_mut(&mut self, idx: NodeIndex) -> Option<&mut TreeNode> {
        self.nodes.get_mut(idx)
    }

    pub fn edge(&self, idx: EdgeIndex) -> Option<&TreeEdge> {
        self.edges.get(idx)
    }

    pub fn edge_mut(&mut self, idx: EdgeIndex) -> Option<&mut TreeEdge> {
        self.edges.get_mut(idx)
    }

    pub fn root(&self) -> Option<NodeIndex> {
        self.root
    }

    pub fn set_root(&mut self, idx: NodeIndex) {
        self.root = Some(idx);
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of half-edges, two per edge.
    pub fn link_count(&self) -> usize {
        2 * self.edges.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &TreeNode)> {
        self.nodes.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeIndex, &TreeEdge)> {
        self.edges.iter()
    }

    /// The endpoint of `edge` that is not `node`.
    pub fn other_end(&self, edge: EdgeIndex, node: NodeIndex) -> Option<NodeIndex> {
        let edge = self.edges.get(edge)?;
        if edge.primary == node {
            Some(edge.secondary)
        } else if edge.secondary == node {
            Some(edge.primary)
        } else {
            None
        }
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|(_, n)| n.is_leaf()).count()
    }

    /// Looks up a leaf node by its taxon name.
    pub fn find_leaf(&self, name: &str) -> Option<NodeIndex> {
        self.nodes
            .iter()
            .find(|(_, n)| n.is_leaf() && n.name == name)
            .map(|(idx, _)| idx)
    }

    /// Sorted taxon names of all leaves.
    pub fn leaf_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .nodes
            .iter()
            .filter(|(_, n)| n.is_leaf())
            .map(|(_, n)| n.name.clone())
            .collect();
        names.sort();
        names
    }

    /// Finds the edge carrying the given edge number, O(edges).
    pub fn edge_of_num(&self, edge_num: usize) -> Option<EdgeIndex> {
        self.edges
            .iter()
            .find(|(_, e)| e.edge_num == edge_num)
            .map(|(idx, _)| idx)
    }

    /// Edge-number to edge-index lookup table for bulk resolution.
    pub fn edge_num_map(&self) -> HashMap<usize, EdgeIndex> {
        self.edges
            .iter()
            .map(|(idx, e)| (e.edge_num, idx))
            .collect()
    }

    /// Checks that edge numbers form a dense permutation of [0, edge_count).
    pub fn has_dense_edge_nums(&self) -> bool {
        let count = self.edge_count();
        let mut seen = vec![false; count];
        for (_, edge) in self.edges.iter() {
            match seen.get_mut(edge.edge_num) {
                Some(slot) if !*slot => *slot = true,
                _ => return false,
            }
        }
        true
    }

    pub(crate) fn remove_edge(&mut self, idx: EdgeIndex) -> Option<TreeEdge> {
        self.edges.remove(idx)
    }

    pub(crate) fn remove_node(&mut self, idx: NodeIndex) -> Option<TreeNode> {
        self.nodes.remove(idx)
    }
}
