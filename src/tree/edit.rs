//! Structural edits: leaf deletion and linear-node contraction.
//!
//! Both are O(1) arena operations. Edge numbers are left untouched here;
//! callers renumber once all edits are done (see `traversal::reset_edge_nums`).

use tracing::instrument;

use crate::errors::{PlaceError, PlaceResult};
use crate::tree::arena::{EdgeIndex, NodeIndex, PlacementTree, TreeEdge};

impl PlacementTree {
    /// Removes a leaf node together with its pendant edge.
    ///
    /// Returns the base node the leaf was attached to. If the leaf was the
    /// traversal root, the base node takes over as root.
    #[instrument(level = "debug", skip(self))]
    pub fn delete_leaf(&mut self, leaf: NodeIndex) -> PlaceResult<NodeIndex> {
        let node = self
            .node(leaf)
            .ok_or_else(|| PlaceError::InternalError("stale node index".into()))?;
        if !node.is_leaf() {
            return Err(PlaceError::NotALeaf(node.name.clone()));
        }
        let pendant = node.edges[0];
        let base = self
            .other_end(pendant, leaf)
            .ok_or_else(|| PlaceError::InternalError("pendant edge detached".into()))?;

        if let Some(base_node) = self.node_mut(base) {
            base_node.edges.retain(|&e| e != pendant);
        }
        self.remove_edge(pendant);
        self.remove_node(leaf);
        if self.root() == Some(leaf) {
            self.set_root(base);
        }
        Ok(base)
    }

    /// Contracts a degree-2 node: its two incident edges become one.
    ///
    /// The first incident edge survives; the second is deleted and the
    /// survivor is reconnected to the far endpoint. `merge` receives the
    /// surviving edge and the deleted edge so the caller decides how branch
    /// lengths combine. Returns the surviving edge.
    #[instrument(level = "debug", skip(self, merge))]
    pub fn contract_linear_node<F>(&mut self, node: NodeIndex, merge: F) -> PlaceResult<EdgeIndex>
    where
        F: FnOnce(&mut TreeEdge, &TreeEdge),
    {
        let n = self
            .node(node)
            .ok_or_else(|| PlaceError::InternalError("stale node index".into()))?;
        if n.degree() != 2 {
            return Err(PlaceError::InternalError(format!(
                "cannot contract node of degree {}",
                n.degree()
            )));
        }
        let survivor = n.edges[0];
        let doomed = n.edges[1];
        let far = self
            .other_end(doomed, node)
            .ok_or_else(|| PlaceError::InternalError("edge detached from node".into()))?;

        let deleted = self
            .remove_edge(doomed)
            .ok_or_else(|| PlaceError::InternalError("stale edge index".into()))?;

        // reconnect the survivor to the far endpoint of the deleted edge
        if let Some(far_node) = self.node_mut(far) {
            for e in far_node.edges.iter_mut() {
                if *e == doomed {
                    *e = survivor;
                }
            }
        }
        if let Some(edge) = self.edge_mut(survivor) {
            if edge.primary == node {
                edge.primary = far;
            } else {
                edge.secondary = far;
            }
            merge(edge, &deleted);
        }

        self.remove_node(node);
        if self.root() == Some(node) {
            self.set_root(far);
        }
        Ok(survivor)
    }
}
