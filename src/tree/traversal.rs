use std::collections::{HashMap, VecDeque};

use tracing::instrument;

use crate::tree::arena::{EdgeIndex, NodeIndex, PlacementTree};

/// View of one side of the tree: everything reachable from `node` without
/// crossing the `via` edge.
#[derive(Debug, Clone, Copy)]
pub struct Subtree {
    pub node: NodeIndex,
    pub via: EdgeIndex,
}

/// Breadth-first edge iterator over a subtree view, bounded by hop depth.
///
/// Yields `(edge, depth)` where depth 0 is an edge incident to the subtree
/// root. Edges deeper than `max_depth` are never entered.
pub struct LevelorderEdges<'a> {
    tree: &'a PlacementTree,
    queue: VecDeque<(EdgeIndex, NodeIndex, usize)>,
    max_depth: usize,
}

impl<'a> LevelorderEdges<'a> {
    pub fn new(tree: &'a PlacementTree, sub: Subtree, max_depth: usize) -> Self {
        let mut queue = VecDeque::new();
        if let Some(node) = tree.node(sub.node) {
            for &edge in &node.edges {
                if edge != sub.via {
                    if let Some(far) = tree.other_end(edge, sub.node) {
                        queue.push_back((edge, far, 0));
                    }
                }
            }
        }
        Self {
            tree,
            queue,
            max_depth,
        }
    }
}

impl Iterator for LevelorderEdges<'_> {
    type Item = (EdgeIndex, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (edge, far, depth) = self.queue.pop_front()?;
        if depth < self.max_depth {
            if let Some(node) = self.tree.node(far) {
                for &next in &node.edges {
                    if next != edge {
                        if let Some(next_far) = self.tree.other_end(next, far) {
                            self.queue.push_back((next, next_far, depth + 1));
                        }
                    }
                }
            }
        }
        Some((edge, depth))
    }
}

/// Edges of the tree in post-order from the root, each paired with its
/// root-side endpoint.
pub fn postorder_edges(tree: &PlacementTree) -> Vec<(EdgeIndex, NodeIndex)> {
    let mut order = Vec::with_capacity(tree.edge_count());
    let Some(root) = tree.root() else {
        return order;
    };

    // (node, edge toward parent, expanded flag)
    let mut stack: Vec<(NodeIndex, Option<EdgeIndex>, bool)> = vec![(root, None, false)];
    while let Some((node_idx, via, expanded)) = stack.pop() {
        let Some(node) = tree.node(node_idx) else {
            continue;
        };
        if expanded {
            if let Some(edge) = via {
                if let Some(parent) = tree.other_end(edge, node_idx) {
                    order.push((edge, parent));
                }
            }
        } else {
            stack.push((node_idx, via, true));
            for &edge in node.edges.iter().rev() {
                if Some(edge) != via {
                    if let Some(child) = tree.other_end(edge, node_idx) {
                        stack.push((child, Some(edge), false));
                    }
                }
            }
        }
    }
    order
}

/// Recomputes the dense post-order edge numbering from scratch.
///
/// Also re-establishes the primary/secondary orientation relative to the
/// current root. Returns the old-number to new-number mapping so callers
/// can migrate external edge references.
#[instrument(level = "debug", skip(tree))]
pub fn reset_edge_nums(tree: &mut PlacementTree) -> HashMap<usize, usize> {
    let order = postorder_edges(tree);
    let mut remap = HashMap::with_capacity(order.len());
    for (new_num, (edge_idx, parent)) in order.into_iter().enumerate() {
        if let Some(edge) = tree.edge_mut(edge_idx) {
            remap.insert(edge.edge_num, new_num);
            edge.edge_num = new_num;
            if edge.secondary == parent {
                std::mem::swap(&mut edge.primary, &mut edge.secondary);
            }
        }
    }
    remap
}
