use std::path::{Path, PathBuf};

use colored::Colorize;
use tracing::{info, instrument};

use crate::cli::args::{Cli, Commands};
use crate::errors::{PlaceError, PlaceResult};
use crate::pairdist::{paired_distance, suffix_names, COPY_SUFFIX};
use crate::reconcile::{leaves_to_prune, reconcile, PruneSide};
use crate::sample::{
    copy_pqueries, filter_n_max_weight_placements, filter_pqueries_intersecting_names, Sample,
};
use crate::stats::local::radius_from_signed;
use crate::stats::{classify_and_filter, remove_invalid, scrutinize, LocalStats, OutlierCriterion};
use crate::jplace;
use crate::tree::NodePathMatrix;

pub fn execute_command(cli: &Cli) -> PlaceResult<()> {
    match &cli.command {
        Some(Commands::Scrutinize {
            files,
            radius,
            multiplier,
        }) => _scrutinize(files, *radius, *multiplier),
        Some(Commands::Filter {
            files,
            radius,
            multiplier,
        }) => _filter(files, *radius, *multiplier),
        Some(Commands::Clean { files }) => _clean(files),
        Some(Commands::PrunedDist { lhs, rhs }) => _pruned_dist(lhs, rhs),
        None => Ok(()),
    }
}

#[instrument]
fn _scrutinize(files: &[PathBuf], radius: i64, multiplier: f64) -> PlaceResult<()> {
    let mut samples = read_all_or_report(files);
    if samples.is_empty() {
        return Err(PlaceError::InternalError(
            "no valid jplace file could be read".into(),
        ));
    }
    let report = scrutinize(&mut samples, radius_from_signed(radius), multiplier);
    println!("{report}");
    Ok(())
}

#[instrument]
fn _filter(files: &[PathBuf], radius: i64, multiplier: f64) -> PlaceResult<()> {
    let radius = radius_from_signed(radius);
    let mut total_removed = 0usize;

    for (path, result) in files.iter().zip(jplace::read_files(files)) {
        println!("Filtering {}", path.display());
        let sample = match result {
            Ok(sample) => sample,
            Err(e) => {
                eprintln!("{}", format!("Skipping {}: {}", path.display(), e).red());
                continue;
            }
        };

        let stats = LocalStats::compute(&sample.tree, radius);
        let (filtered, removed) =
            classify_and_filter(sample, &stats, multiplier, OutlierCriterion::OverLocalMax);

        let out_path = prefixed_path(path, "filtered_");
        if let Err(e) = jplace::write_file(&filtered, &out_path) {
            eprintln!("{}", format!("Cannot write {}: {}", out_path.display(), e).red());
            continue;
        }
        println!(
            "Done! {} queries removed. Output: {}",
            removed,
            out_path.display()
        );
        total_removed += removed;
    }

    println!("All done! total removed: {total_removed}");
    Ok(())
}

#[instrument]
fn _clean(files: &[PathBuf]) -> PlaceResult<()> {
    let mut total_removed = 0usize;

    for (path, result) in files.iter().zip(jplace::read_files(files)) {
        println!("Cleaning {}", path.display());
        let mut sample = match result {
            Ok(sample) => sample,
            Err(e) => {
                eprintln!("{}", format!("Skipping {}: {}", path.display(), e).red());
                continue;
            }
        };

        let removed = remove_invalid(&mut sample);

        let out_path = prefixed_path(path, "cleaned_");
        if let Err(e) = jplace::write_file(&sample, &out_path) {
            eprintln!("{}", format!("Cannot write {}: {}", out_path.display(), e).red());
            continue;
        }
        println!(
            "Done! {} placements removed. Output: {}",
            removed,
            out_path.display()
        );
        total_removed += removed;
    }

    println!("All done! Total removed placements: {total_removed}");
    Ok(())
}

#[instrument]
fn _pruned_dist(lhs_path: &Path, rhs_path: &Path) -> PlaceResult<()> {
    let mut lhs = jplace::read_file(lhs_path)?;
    let mut rhs = jplace::read_file(rhs_path)?;

    // only pqueries present in both files can be paired up
    filter_pqueries_intersecting_names(&mut lhs, &mut rhs);
    if lhs.is_empty() || rhs.is_empty() {
        return Err(PlaceError::EmptyIntersection);
    }

    filter_n_max_weight_placements(&mut lhs, 1);
    filter_n_max_weight_placements(&mut rhs, 1);

    let (side, to_prune) = leaves_to_prune(&lhs, &rhs)?;
    let (mut big, mut small) = match side {
        PruneSide::Lhs => (lhs, rhs),
        PruneSide::Rhs => (rhs, lhs),
    };

    reconcile(&mut big, &small, &to_prune)?;

    suffix_names(&mut big, COPY_SUFFIX);
    copy_pqueries(&big, &mut small);

    print_paired_distances(&small)
}

fn print_paired_distances(sample: &Sample) -> PlaceResult<()> {
    let matrix = NodePathMatrix::compute(&sample.tree);
    let pairs = paired_distance(sample, &matrix, COPY_SUFFIX)?;
    info!(pairs = pairs.len(), "matched placement pairs");
    for pair in &pairs {
        println!(
            "{} <-> {}{}: path distance: {}",
            pair.name, pair.name, COPY_SUFFIX, pair.path_length
        );
    }
    Ok(())
}

fn read_all_or_report(files: &[PathBuf]) -> Vec<Sample> {
    jplace::read_files(files)
        .into_iter()
        .zip(files)
        .filter_map(|(result, path)| match result {
            Ok(sample) => Some(sample),
            Err(e) => {
                eprintln!("{}", format!("Skipping {}: {}", path.display(), e).red());
                None
            }
        })
        .collect()
}

fn prefixed_path(path: &Path, prefix: &str) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{prefix}{file_name}"))
}
