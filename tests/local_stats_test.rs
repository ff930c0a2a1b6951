//! Tests for the local branch-length statistics engine

use rstest::rstest;

use placeqc::stats::{local_branch_average, local_branch_max, WeightDecay, UNBOUNDED_RADIUS};
use placeqc::tree::newick;

#[ctor::ctor]
fn init() {
    placeqc::util::testing::init_test_setup();
}

const STAR: &str = "(A:1{0},B:2{1},C:3{2});";
const SIX_LEAF: &str =
    "((A:1{0},B:1{1}):1{2},(C:1{3},D:1{4}):1{5},(E:1{6},F:1{7}):1{8});";

#[test]
fn given_radius_zero_when_averaging_then_each_edge_keeps_own_length() {
    let tree = newick::parse(SIX_LEAF).unwrap();

    let avg = local_branch_average(&tree, 0, WeightDecay::Identity);
    let max = local_branch_max(&tree, 0);

    for (_, edge) in tree.edges() {
        assert!((avg[edge.edge_num] - edge.branch_length).abs() < 1e-12);
        assert!((max[edge.edge_num] - edge.branch_length).abs() < 1e-12);
    }
}

#[rstest]
#[case(1)]
#[case(3)]
#[case(UNBOUNDED_RADIUS)]
fn given_any_radius_when_computing_max_then_own_length_is_lower_bound(#[case] radius: usize) {
    let tree = newick::parse(SIX_LEAF).unwrap();

    let max = local_branch_max(&tree, radius);

    for (_, edge) in tree.edges() {
        assert!(
            max[edge.edge_num] >= edge.branch_length,
            "edge {} has max {} below its own length {}",
            edge.edge_num,
            max[edge.edge_num],
            edge.branch_length
        );
    }
}

#[test]
fn given_star_tree_when_averaging_with_identity_then_matches_hand_computation() {
    // edge A sees B and C at one hop: (1 + 2 + 3) / 3
    let tree = newick::parse(STAR).unwrap();

    let avg = local_branch_average(&tree, 1, WeightDecay::Identity);

    assert!((avg[0] - 2.0).abs() < 1e-12);
}

#[test]
fn given_star_tree_when_averaging_with_inverse_distance_then_neighbors_weigh_half() {
    // edge A: own length at weight 1, B and C at weight 1/2
    // (1*1 + 0.5*2 + 0.5*3) / (1 + 0.5 + 0.5) = 3.5 / 2
    let tree = newick::parse(STAR).unwrap();

    let avg = local_branch_average(&tree, 1, WeightDecay::InverseDistance);

    assert!((avg[0] - 1.75).abs() < 1e-12);
}

#[test]
fn given_star_tree_when_taking_local_max_then_longest_neighbor_wins() {
    let tree = newick::parse(STAR).unwrap();

    let max = local_branch_max(&tree, 1);

    assert!((max[0] - 3.0).abs() < 1e-12);
    assert!((max[2] - 3.0).abs() < 1e-12);
}

#[test]
fn given_unbounded_radius_when_averaging_then_whole_tree_is_covered() {
    let tree = newick::parse(SIX_LEAF).unwrap();

    let bounded = local_branch_average(&tree, 100, WeightDecay::Identity);
    let unbounded = local_branch_average(&tree, UNBOUNDED_RADIUS, WeightDecay::Identity);

    for (_, edge) in tree.edges() {
        assert!((bounded[edge.edge_num] - unbounded[edge.edge_num]).abs() < 1e-12);
    }
}

#[test]
fn given_small_radius_when_averaging_then_distant_edges_are_excluded() {
    // edge A at radius 1 sees only B-edge and the inner edge of its clade
    let tree = newick::parse(SIX_LEAF).unwrap();

    let avg = local_branch_average(&tree, 1, WeightDecay::Identity);

    // all branch lengths are 1, so any bounded average is exactly 1
    assert!((avg[0] - 1.0).abs() < 1e-12);
}

#[rstest]
#[case(WeightDecay::Identity, 3, 1.0)]
#[case(WeightDecay::InverseDistance, 1, 0.5)]
#[case(WeightDecay::InverseSquare, 1, 0.25)]
#[case(WeightDecay::Logistic, 4, 0.5)]
fn given_decay_shapes_when_weighting_then_known_values_hold(
    #[case] decay: WeightDecay,
    #[case] distance: usize,
    #[case] expected: f64,
) {
    assert!((decay.weight(distance) - expected).abs() < 1e-12);
}

#[test]
fn given_exponential_decay_when_weighting_then_monotonically_non_increasing() {
    for d in 0..20usize {
        assert!(WeightDecay::Exponential.weight(d + 1) <= WeightDecay::Exponential.weight(d));
    }
}
