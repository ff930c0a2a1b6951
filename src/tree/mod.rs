//! Unrooted, edge-numbered reference tree for placement data.
//!
//! Nodes and edges live in two arenas cross-referenced by stable indices,
//! so structural edits (leaf deletion, linear-node contraction) are index
//! surgery instead of pointer juggling.

pub mod arena;
pub mod distance;
pub mod edit;
pub mod newick;
pub mod traversal;

pub use arena::{EdgeIndex, NodeIndex, PlacementTree, TreeEdge, TreeNode};
pub use distance::NodePathMatrix;
pub use traversal::{reset_edge_nums, LevelorderEdges, Subtree};
