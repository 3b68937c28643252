//! Scope-based pruning of a phylogeny.
//!
//! Reduces a tree to the nodes needed to connect a set of targets: the
//! targets themselves, their lowest common ancestor, and one node for every
//! topologically distinct branching among them. Everything else is removed
//! with non-dichotomizing deletion, so surviving nodes keep their order.

use std::collections::{BTreeSet, HashMap, HashSet};

use generational_arena::Index;
use tracing::{debug, instrument, trace};

use crate::domain::arena::TreeArena;
use crate::domain::error::DomainError;

/// Outcome of a pruning pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Closure {
    /// Lowest common ancestor of all targets, root of the pruned tree
    pub lca: Index,
    /// Every node retained, targets included
    pub kept: BTreeSet<Index>,
    /// Non-target nodes retained for their branching structure
    pub branch_points: BTreeSet<Index>,
}

/// Lowest common ancestor of `targets` and each target's path up to it.
///
/// Paths start at the target and end at the LCA, both inclusive.
#[instrument(level = "debug", skip(tree))]
pub fn common_ancestor(
    tree: &TreeArena,
    targets: &[Index],
) -> Result<(Index, HashMap<Index, Vec<Index>>), DomainError> {
    let (first, rest) = targets.split_first().ok_or(DomainError::EmptyTargetSet)?;

    let reference = tree.ancestors(*first);
    let paths: HashMap<Index, Vec<Index>> = targets
        .iter()
        .map(|&t| (t, tree.ancestors(t)))
        .collect();
    let ancestor_sets: Vec<HashSet<Index>> = rest
        .iter()
        .map(|t| paths[t].iter().copied().collect())
        .collect();

    let lca = reference
        .iter()
        .copied()
        .find(|candidate| ancestor_sets.iter().all(|set| set.contains(candidate)))
        .ok_or(DomainError::DisconnectedTargets)?;

    let node2path = paths
        .into_iter()
        .map(|(target, path)| {
            let cut = path.iter().position(|&n| n == lca).map_or(path.len(), |p| p + 1);
            (target, path[..cut].to_vec())
        })
        .collect();

    Ok((lca, node2path))
}

/// Computes which nodes survive pruning for the given targets.
#[instrument(level = "debug", skip(tree))]
pub fn closure(tree: &TreeArena, targets: &[Index]) -> Result<Closure, DomainError> {
    let (lca, node2path) = common_ancestor(tree, targets)?;

    let mut kept: BTreeSet<Index> = targets.iter().copied().collect();
    kept.insert(lca);

    // Targets whose path passes through each node, excluding the node itself
    let mut visitors: HashMap<Index, BTreeSet<Index>> = HashMap::new();
    for (&target, path) in &node2path {
        for &node in path.iter().filter(|&&n| n != target) {
            visitors.entry(node).or_default().insert(target);
        }
    }

    // Group branch points by their exact visitor set, in tree order so the
    // grouping is deterministic.
    let on_path: HashSet<Index> = node2path.values().flatten().copied().collect();
    let mut groups: Vec<(BTreeSet<Index>, Vec<Index>)> = Vec::new();
    for (idx, _) in tree.iter() {
        let Some(seen_by) = visitors.get(&idx) else {
            continue;
        };
        if seen_by.len() < 2 {
            continue;
        }
        match groups.iter_mut().find(|(key, _)| key == seen_by) {
            Some((_, nodes)) => nodes.push(idx),
            None => groups.push((seen_by.clone(), vec![idx])),
        }
    }

    let mut branch_points = BTreeSet::new();
    for (seen_by, nodes) in &groups {
        if nodes.iter().any(|n| kept.contains(n)) {
            continue;
        }
        // Nodes sharing a visitor set form a chain; only its deepest member
        // can split the visitors between two children.
        let Some(&deepest) = nodes.iter().max_by_key(|&&n| tree.level(n)) else {
            continue;
        };
        let branching = tree
            .get_node(deepest)
            .map(|node| node.children.iter().filter(|&&c| on_path.contains(&c)).count())
            .unwrap_or(0);
        if branching >= 2 {
            trace!("branch point for {} targets: {:?}", seen_by.len(), deepest);
            branch_points.insert(deepest);
        }
    }
    kept.extend(branch_points.iter().copied());

    debug!(
        "closure: {} targets, {} kept, {} branch points",
        targets.len(),
        kept.len(),
        branch_points.len()
    );
    Ok(Closure {
        lca,
        kept,
        branch_points,
    })
}

/// Prunes `tree` in place down to the closure of `targets`.
///
/// The result is rooted at the targets' lowest common ancestor. With a
/// single target the result is that node alone.
#[instrument(level = "debug", skip(tree))]
pub fn prune(tree: &mut TreeArena, targets: &[Index]) -> Result<Closure, DomainError> {
    let closure = closure(tree, targets)?;

    for idx in tree.descendants_postorder(closure.lca) {
        if !closure.kept.contains(&idx) {
            tree.delete_node(idx)?;
        }
    }
    tree.reroot_at(closure.lca)?;

    Ok(closure)
}
