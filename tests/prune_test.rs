//! Integration tests for scope-based pruning through the public API.

use std::collections::HashSet;

use rstest::rstest;

use numeralbank::application::services::prune_text;
use numeralbank::domain::{newick, prune, ScopeSet, TreeArena};
use numeralbank::util::testing;

#[ctor::ctor]
fn init() {
    testing::init_test_setup();
}

fn scope(names: &[&str]) -> ScopeSet {
    ScopeSet::from_names(names.iter().copied())
}

/// Every unnamed or non-target node must branch, otherwise it is redundant.
fn assert_minimal(tree: &TreeArena, targets: &[&str]) {
    for (_, node) in tree.iter() {
        if targets.contains(&node.data.name.as_str()) {
            continue;
        }
        assert!(
            node.children.len() >= 2,
            "non-target node '{}' has {} children",
            node.data.name,
            node.children.len()
        );
    }
}

// ============================================================
// Scenarios
// ============================================================

#[rstest]
#[case("(A:1,(B:1,C:1)X:1)R:1;", &["A", "C"], "(A:1,C:1)R:1;")]
#[case("((A,B)X,(C,(D,E)Y)Z)R;", &["A", "D", "E"], "(A,(D,E)Y)R;")]
#[case("((A,B)X,(C,D)Y)R;", &["C", "D"], "(C,D)Y;")]
#[case("((A,B)X,C)R;", &["X"], "X;")]
#[case("((A,B)X,(C,D)Y)R;", &["A", "X", "D"], "((A)X,D)R;")]
#[case("(A,(A,B)X)R;", &["A", "B"], "(A,B)R;")]
fn given_tree_and_scope_when_pruning_then_keeps_closure(
    #[case] text: &str,
    #[case] names: &[&str],
    #[case] expected: &str,
) {
    assert_eq!(prune_text(text, &scope(names)), expected);
}

#[test]
fn given_all_leaves_in_scope_when_pruning_then_tree_is_unchanged() {
    let text = "((A:1,B:2)X:0.5,(C:1,D:1)Y:0.5)R;";
    let tree = newick::parse(text).unwrap();
    let leaves = tree.leaf_names();

    let pruned = prune_text(text, &ScopeSet::from_names(leaves));

    assert_eq!(pruned, text);
}

#[test]
fn given_pruned_tree_when_pruning_again_then_result_is_stable() {
    let names = ["A", "D", "E"];
    let once = prune_text("((A,B)X,(C,(D,E)Y)Z)R;", &scope(&names));
    let twice = prune_text(&once, &scope(&names));
    assert_eq!(once, twice);
}

#[test]
fn given_wide_tree_when_pruning_then_result_is_closed_and_minimal() {
    let text = "(((a,b)n1,(c,d)n2)n3,((e,f)n4,(g,(h,i)n5)n6)n7,j)root;";
    let names = ["a", "d", "g", "i"];

    let pruned = prune_text(text, &scope(&names));
    let tree = newick::parse(&pruned).unwrap();

    let present: HashSet<String> = tree.names().into_iter().collect();
    for name in names {
        assert!(present.contains(name), "{name} missing from {pruned}");
    }
    assert_eq!(tree.root().map(|r| tree.name(r)), Some("root"));
    assert_minimal(&tree, &names);
    assert_eq!(pruned, "((a,d)n3,(g,i)n6)root;");
}

#[test]
fn given_pruned_tree_when_comparing_leaves_then_relative_order_is_preserved() {
    let text = "(E,(D,(C,B)X)Y,A)R;";
    let pruned = prune_text(text, &scope(&["A", "B", "D", "E"]));
    let tree = newick::parse(&pruned).unwrap();
    assert_eq!(tree.leaf_names(), vec!["E", "D", "B", "A"]);
}

#[test]
fn given_closure_when_pruning_then_reports_lca_and_branch_points() {
    let mut tree = newick::parse("((A,B)X,(C,(D,E)Y)Z)R;").unwrap();
    let targets = scope(&["A", "D", "E"]).targets(&tree);
    let y = tree.find_by_name("Y").unwrap();
    let r = tree.find_by_name("R").unwrap();

    let closure = prune(&mut tree, &targets).unwrap();

    assert_eq!(closure.lca, r);
    assert!(closure.branch_points.contains(&y));
    assert_eq!(closure.kept.len(), 5);
    assert_eq!(tree.len(), 5);
}

// ============================================================
// Unavailable trees
// ============================================================

#[rstest]
#[case("((A,B)X", &["A"])]
#[case("(A,B));", &["A"])]
#[case("", &["A"])]
#[case("(A,(B,C;", &["A"])]
fn given_malformed_tree_when_pruning_then_returns_empty(
    #[case] text: &str,
    #[case] names: &[&str],
) {
    assert_eq!(prune_text(text, &scope(names)), "");
}

#[test]
fn given_empty_scope_when_pruning_then_returns_empty() {
    assert_eq!(prune_text("(A,B)R;", &ScopeSet::default()), "");
}

#[test]
fn given_scope_without_tree_names_when_pruning_then_returns_empty() {
    assert_eq!(prune_text("(A,B)R;", &scope(&["Z", "Q"])), "");
}

#[test]
fn given_scope_with_some_unknown_names_when_pruning_then_ignores_them() {
    assert_eq!(prune_text("((A,B)X,C)R;", &scope(&["A", "C", "nope"])), "(A,C)R;");
}
