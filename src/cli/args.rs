//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Quality control and topology reconciliation for phylogenetic placement data
#[derive(Parser, Debug)]
#[command(name = "placeqc")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d, -dd, -ddd)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report pendant-length outlier statistics across jplace files
    Scrutinize {
        /// jplace input files
        #[arg(required = true, value_hint = ValueHint::FilePath)]
        files: Vec<PathBuf>,

        /// Locality radius in hops; negative means unbounded
        #[arg(short, long, default_value_t = 10, allow_hyphen_values = true)]
        radius: i64,

        /// Threshold multiplier for the local criteria
        #[arg(short, long, default_value_t = 4.0)]
        multiplier: f64,
    },

    /// Remove pqueries whose best hit exceeds the local-maximum threshold
    Filter {
        /// jplace input files; each gets a filtered_ copy next to it
        #[arg(required = true, value_hint = ValueHint::FilePath)]
        files: Vec<PathBuf>,

        /// Locality radius in hops; negative means unbounded
        #[arg(short, long, default_value_t = 10, allow_hyphen_values = true)]
        radius: i64,

        /// Threshold multiplier
        #[arg(short, long, default_value_t = 4.0)]
        multiplier: f64,
    },

    /// Remove placements with NaN fields
    Clean {
        /// jplace input files; each gets a cleaned_ copy next to it
        #[arg(required = true, value_hint = ValueHint::FilePath)]
        files: Vec<PathBuf>,
    },

    /// Reconcile a pruned/unpruned sample pair and print paired node distances
    PrunedDist {
        /// First jplace file
        #[arg(value_hint = ValueHint::FilePath)]
        lhs: PathBuf,

        /// Second jplace file, on a tree with a differing leaf set
        #[arg(value_hint = ValueHint::FilePath)]
        rhs: PathBuf,
    },
}
