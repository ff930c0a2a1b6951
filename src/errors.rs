use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlaceError {
    #[error("Failed to read file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("Invalid jplace document in {}: {reason}", path.display())]
    InvalidJplace { path: PathBuf, reason: String },

    #[error("Invalid Newick string: {0}")]
    InvalidNewick(String),

    #[error("Edge numbers are not a dense permutation of [0, {expected}): {reason}")]
    InvalidEdgeNumbering { expected: usize, reason: String },

    #[error("Leaf '{0}' was not found in the tree")]
    LeafNotFound(String),

    #[error("Node '{0}' is not a leaf")]
    NotALeaf(String),

    #[error("Placement references unknown edge number {0}")]
    UnknownEdgeNum(usize),

    #[error("Cannot reconcile: neither tree has extra leaves, nothing to prune")]
    NothingToPrune,

    #[error("Cannot reconcile: both trees have leaves missing from the other")]
    AmbiguousPrune,

    #[error("Cannot prune {requested} leaves from a tree with {available} leaves, would result in less than 4 taxa")]
    TooFewLeavesAfterPrune { requested: usize, available: usize },

    #[error("Trees are not compatible after prune: {0}")]
    IncompatibleAfterPrune(String),

    #[error("Query intersection of the two samples is empty")]
    EmptyIntersection,

    #[error("Internal tree operation failed: {0}")]
    InternalError(String),
}

pub type PlaceResult<T> = Result<T, PlaceError>;
