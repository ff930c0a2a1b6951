//! Tests for paired-placement node-path distances

use placeqc::pairdist::{paired_distance, suffix_names, COPY_SUFFIX};
use placeqc::tree::{newick, NodePathMatrix};
use placeqc::{Pquery, PqueryName, PqueryPlacement, Sample};

#[ctor::ctor]
fn init() {
    placeqc::util::testing::init_test_setup();
}

const TREE: &str = "((A:1{0},B:1{1}):1{2},C:1{3},D:1{4});";

fn placement(edge_num: usize) -> PqueryPlacement {
    PqueryPlacement {
        edge_num,
        likelihood: -50.0,
        like_weight_ratio: 1.0,
        proximal_length: 0.2,
        pendant_length: 0.01,
    }
}

fn pquery(name: &str, edge_num: usize) -> Pquery {
    Pquery {
        names: vec![PqueryName::new(name)],
        placements: vec![placement(edge_num)],
    }
}

#[test]
fn given_pqueries_when_suffixing_then_primary_names_change() {
    let tree = newick::parse(TREE).unwrap();
    let mut sample = Sample::new(tree);
    sample.add(pquery("alpha", 0));
    sample.add(pquery("beta", 3));

    suffix_names(&mut sample, COPY_SUFFIX);

    assert!(sample.find_pquery("alpha_cpy").is_some());
    assert!(sample.find_pquery("beta_cpy").is_some());
    assert!(sample.find_pquery("alpha").is_none());
}

#[test]
fn given_matched_pair_on_distant_edges_when_measuring_then_hop_count_is_reported() {
    // edge 0 attaches at the inner node, edge 3 at the root: one hop apart
    let tree = newick::parse(TREE).unwrap();
    let mut sample = Sample::new(tree);
    sample.add(pquery("alpha", 0));
    sample.add(pquery("alpha_cpy", 3));
    let matrix = NodePathMatrix::compute(&sample.tree);

    let pairs = paired_distance(&sample, &matrix, COPY_SUFFIX).unwrap();

    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].name, "alpha");
    assert_eq!(pairs[0].path_length, 1);
}

#[test]
fn given_matched_pair_on_sibling_edges_when_measuring_then_distance_is_zero() {
    // edges 0 and 1 share their attachment node
    let tree = newick::parse(TREE).unwrap();
    let mut sample = Sample::new(tree);
    sample.add(pquery("alpha", 0));
    sample.add(pquery("alpha_cpy", 1));
    let matrix = NodePathMatrix::compute(&sample.tree);

    let pairs = paired_distance(&sample, &matrix, COPY_SUFFIX).unwrap();

    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].path_length, 0);
}

#[test]
fn given_unmatched_pquery_when_measuring_then_it_is_skipped() {
    let tree = newick::parse(TREE).unwrap();
    let mut sample = Sample::new(tree);
    sample.add(pquery("alpha", 0));
    sample.add(pquery("alpha_cpy", 3));
    sample.add(pquery("orphan", 4));
    let matrix = NodePathMatrix::compute(&sample.tree);

    let pairs = paired_distance(&sample, &matrix, COPY_SUFFIX).unwrap();

    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].name, "alpha");
}

#[test]
fn given_several_pairs_when_measuring_then_each_is_reported_once() {
    let tree = newick::parse(TREE).unwrap();
    let mut sample = Sample::new(tree);
    sample.add(pquery("alpha", 0));
    sample.add(pquery("beta", 3));
    sample.add(pquery("alpha_cpy", 4));
    sample.add(pquery("beta_cpy", 3));
    let matrix = NodePathMatrix::compute(&sample.tree);

    let pairs = paired_distance(&sample, &matrix, COPY_SUFFIX).unwrap();

    assert_eq!(pairs.len(), 2);
    let names: Vec<&str> = pairs.iter().map(|p| p.name.as_str()).collect();
    assert!(names.contains(&"alpha"));
    assert!(names.contains(&"beta"));
}

#[test]
fn given_best_hits_on_different_ranks_when_measuring_then_rank_zero_decides() {
    // the counterpart's heaviest placement sits on edge 3, next to edge 0
    let tree = newick::parse(TREE).unwrap();
    let mut sample = Sample::new(tree);
    sample.add(pquery("alpha", 0));
    let mut counterpart = Pquery {
        names: vec![PqueryName::new("alpha_cpy")],
        placements: vec![
            PqueryPlacement {
                like_weight_ratio: 0.9,
                ..placement(3)
            },
            PqueryPlacement {
                like_weight_ratio: 0.1,
                ..placement(0)
            },
        ],
    };
    counterpart.sort_placements_by_weight();
    sample.add(counterpart);
    let matrix = NodePathMatrix::compute(&sample.tree);

    let pairs = paired_distance(&sample, &matrix, COPY_SUFFIX).unwrap();

    assert_eq!(pairs[0].path_length, 1);
}

#[test]
fn given_path_matrix_when_computed_then_it_is_symmetric() {
    let tree = newick::parse(TREE).unwrap();
    let matrix = NodePathMatrix::compute(&tree);

    assert_eq!(matrix.node_count(), tree.node_count());
    for (a, _) in tree.nodes() {
        for (b, _) in tree.nodes() {
            assert_eq!(matrix.path_length(a, b), matrix.path_length(b, a));
        }
    }
}
