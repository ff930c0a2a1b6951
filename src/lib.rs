//! placeqc: quality control for phylogenetic placement (jplace) data.
//!
//! Core pieces:
//! - a bounded-radius, decay-weighted local branch-length statistic used to
//!   flag placements with anomalous pendant lengths ([`stats`]),
//! - a topology-reconciliation procedure that prunes leaves and contracts
//!   degree-2 nodes so two related reference trees become structurally
//!   comparable, migrating placements through the edit ([`reconcile`]),
//! - a node-path-length distance over matched placement pairs ([`pairdist`]).

pub mod cli;
pub mod errors;
pub mod jplace;
pub mod pairdist;
pub mod reconcile;
pub mod sample;
pub mod stats;
pub mod tree;
pub mod util;

pub use errors::{PlaceError, PlaceResult};
pub use sample::{Pquery, PqueryName, PqueryPlacement, Sample};
pub use tree::PlacementTree;
