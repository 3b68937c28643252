use generational_arena::{Arena, Index};
use std::collections::HashMap;
use std::fmt;
use tracing::{instrument, warn};

use crate::domain::error::DomainError;

/// Length of the branch leading to a node.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct BranchLength(pub f64);

impl fmt::Display for BranchLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // f64's Display is already the shortest round-tripping form: 1.0 -> "1"
        write!(f, "{}", self.0)
    }
}

/// Data payload for phylogeny nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    /// Label of the node, empty for unnamed internal nodes
    pub name: String,
    /// Optional length of the branch to the parent
    pub branch_length: Option<BranchLength>,
}

impl NodeData {
    pub fn new(name: impl Into<String>, branch_length: Option<f64>) -> Self {
        Self {
            name: name.into(),
            branch_length: branch_length.map(BranchLength),
        }
    }
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.branch_length {
            Some(length) => write!(f, "{}:{}", self.name, length),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct TreeNode {
    /// Label and branch length of this node
    pub data: NodeData,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena, in tree order
    pub children: Vec<Index>,
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Arena-based phylogenetic tree.
///
/// Uses generational arena for memory-safe node references and O(1) lookups.
/// Indices double as stable hashable node identities, which the pruning
/// code relies on for grouping.
#[derive(Debug)]
pub struct TreeArena {
    /// Arena storage for all tree nodes
    arena: Arena<TreeNode>,
    /// Index of the root node, None for empty trees
    root: Option<Index>,
}

impl Default for TreeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeArena {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    #[instrument(level = "trace", skip(self))]
    pub fn insert_node(&mut self, data: NodeData, parent: Option<Index>) -> Index {
        let node = TreeNode {
            data,
            parent,
            children: Vec::new(),
        };
        let node_idx = self.arena.insert(node);

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
            }
        } else {
            self.root = Some(node_idx);
        }

        node_idx
    }

    #[instrument(level = "trace", skip(self))]
    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn get_node_mut(&mut self, idx: Index) -> Option<&mut TreeNode> {
        self.arena.get_mut(idx)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn root(&self) -> Option<Index> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Name of a node, empty when the index is stale.
    pub fn name(&self, idx: Index) -> &str {
        self.get_node(idx).map(|n| n.data.name.as_str()).unwrap_or("")
    }

    #[instrument(level = "trace", skip(self))]
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self, self.root)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self, self.root)
    }

    /// Strict descendants of `idx`, children before their parent.
    pub fn descendants_postorder(&self, idx: Index) -> Vec<Index> {
        PostOrderIterator::new(self, Some(idx))
            .map(|(i, _)| i)
            .filter(|&i| i != idx)
            .collect()
    }

    /// The node itself followed by each ancestor up to the root.
    #[instrument(level = "trace", skip(self))]
    pub fn ancestors(&self, idx: Index) -> Vec<Index> {
        let mut path = Vec::new();
        let mut current = Some(idx);
        while let Some(i) = current {
            match self.get_node(i) {
                Some(node) => {
                    path.push(i);
                    current = node.parent;
                }
                None => break,
            }
        }
        path
    }

    /// Number of edges between `idx` and the root.
    pub fn level(&self, idx: Index) -> usize {
        self.ancestors(idx).len().saturating_sub(1)
    }

    /// Number of nodes on the longest root-to-leaf path.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack: Vec<(Index, usize)> = self.root.map(|r| (r, 1)).into_iter().collect();
        while let Some((idx, depth)) = stack.pop() {
            if let Some(node) = self.get_node(idx) {
                max_depth = max_depth.max(depth);
                stack.extend(node.children.iter().map(|&c| (c, depth + 1)));
            }
        }
        max_depth
    }

    /// Collects the names of all leaf nodes in tree order.
    ///
    /// Empty trees return an empty vector.
    #[instrument(level = "debug", skip(self))]
    pub fn leaf_names(&self) -> Vec<String> {
        self.iter()
            .filter(|(_, node)| node.is_leaf())
            .map(|(_, node)| node.data.name.clone())
            .collect()
    }

    /// All non-empty node names in preorder.
    pub fn names(&self) -> Vec<String> {
        self.iter()
            .map(|(_, node)| node.data.name.clone())
            .filter(|name| !name.is_empty())
            .collect()
    }

    /// Builds the name lookup used to resolve labels to nodes.
    ///
    /// The first node in preorder wins for duplicated names; each
    /// duplicate is reported once. Unnamed nodes are not indexed.
    #[instrument(level = "debug", skip(self))]
    pub fn name_index(&self) -> HashMap<String, Index> {
        let mut index: HashMap<String, Index> = HashMap::new();
        let mut reported = Vec::new();
        for (idx, node) in self.iter() {
            let name = &node.data.name;
            if name.is_empty() {
                continue;
            }
            if index.contains_key(name) {
                if !reported.contains(name) {
                    warn!("duplicate node name in tree, using first match: {}", name);
                    reported.push(name.clone());
                }
                continue;
            }
            index.insert(name.clone(), idx);
        }
        index
    }

    /// First node in preorder carrying `name`.
    pub fn find_by_name(&self, name: &str) -> Option<Index> {
        if name.is_empty() {
            return None;
        }
        self.iter()
            .find(|(_, node)| node.data.name == name)
            .map(|(idx, _)| idx)
    }

    /// Removes a node, splicing its children into its position in the parent.
    ///
    /// Children keep their own branch lengths and their relative order.
    #[instrument(level = "trace", skip(self))]
    pub fn delete_node(&mut self, idx: Index) -> Result<(), DomainError> {
        let (parent_idx, children) = match self.get_node(idx) {
            Some(node) => (node.parent, node.children.clone()),
            None => return Err(DomainError::NodeNotFound(format!("{:?}", idx))),
        };
        let parent_idx = parent_idx.ok_or(DomainError::CannotDeleteRoot)?;

        for &child in &children {
            if let Some(child_node) = self.arena.get_mut(child) {
                child_node.parent = Some(parent_idx);
            }
        }
        if let Some(parent) = self.arena.get_mut(parent_idx) {
            if let Some(pos) = parent.children.iter().position(|&c| c == idx) {
                parent.children.splice(pos..=pos, children);
            }
        }
        self.arena.remove(idx);
        Ok(())
    }

    /// Makes `idx` the root, dropping every node outside its subtree.
    #[instrument(level = "trace", skip(self))]
    pub fn reroot_at(&mut self, idx: Index) -> Result<(), DomainError> {
        if self.get_node(idx).is_none() {
            return Err(DomainError::NodeNotFound(format!("{:?}", idx)));
        }
        if self.root == Some(idx) {
            return Ok(());
        }

        let keep: std::collections::HashSet<Index> =
            TreeIterator::new(self, Some(idx)).map(|(i, _)| i).collect();
        self.arena.retain(|i, _| keep.contains(&i));
        if let Some(node) = self.arena.get_mut(idx) {
            node.parent = None;
        }
        self.root = Some(idx);
        Ok(())
    }
}

pub struct TreeIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a TreeArena, start: Option<Index>) -> Self {
        Self {
            arena,
            stack: start.into_iter().collect(),
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(arena: &'a TreeArena, start: Option<Index>) -> Self {
        Self {
            arena,
            stack: start.map(|s| (s, false)).into_iter().collect(),
        }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    //      R
    //     / \
    //    A   X
    //       / \
    //      B   C
    fn sample() -> (TreeArena, [Index; 5]) {
        let mut tree = TreeArena::new();
        let r = tree.insert_node(NodeData::new("R", Some(1.0)), None);
        let a = tree.insert_node(NodeData::new("A", Some(1.0)), Some(r));
        let x = tree.insert_node(NodeData::new("X", Some(1.0)), Some(r));
        let b = tree.insert_node(NodeData::new("B", Some(1.0)), Some(x));
        let c = tree.insert_node(NodeData::new("C", Some(1.0)), Some(x));
        (tree, [r, a, x, b, c])
    }

    #[test]
    fn test_traversal_orders() {
        let (tree, [r, a, x, b, c]) = sample();
        let pre: Vec<_> = tree.iter().map(|(i, _)| i).collect();
        assert_eq!(pre, vec![r, a, x, b, c]);
        let post: Vec<_> = tree.iter_postorder().map(|(i, _)| i).collect();
        assert_eq!(post, vec![a, b, c, x, r]);
        assert_eq!(tree.descendants_postorder(x), vec![b, c]);
    }

    #[test]
    fn test_ancestors_and_depth() {
        let (tree, [r, _, x, b, _]) = sample();
        assert_eq!(tree.ancestors(b), vec![b, x, r]);
        assert_eq!(tree.level(b), 2);
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.leaf_names(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_delete_node_splices_children_in_place() {
        let (mut tree, [r, a, x, b, c]) = sample();
        tree.delete_node(x).unwrap();
        assert_eq!(tree.get_node(r).unwrap().children, vec![a, b, c]);
        assert_eq!(tree.get_node(b).unwrap().parent, Some(r));
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_delete_root_is_refused() {
        let (mut tree, [r, ..]) = sample();
        assert_eq!(tree.delete_node(r), Err(DomainError::CannotDeleteRoot));
    }

    #[test]
    fn test_reroot_drops_outside_nodes() {
        let (mut tree, [_, a, x, ..]) = sample();
        tree.reroot_at(x).unwrap();
        assert_eq!(tree.root(), Some(x));
        assert!(tree.get_node(a).is_none());
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.get_node(x).unwrap().parent, None);
    }

    #[test]
    fn test_name_index_prefers_first_duplicate() {
        let mut tree = TreeArena::new();
        let r = tree.insert_node(NodeData::new("", None), None);
        let first = tree.insert_node(NodeData::new("dup", None), Some(r));
        tree.insert_node(NodeData::new("dup", None), Some(r));
        let index = tree.name_index();
        assert_eq!(index.get("dup"), Some(&first));
        assert!(!index.contains_key(""));
        assert_eq!(tree.find_by_name("dup"), Some(first));
        assert_eq!(tree.find_by_name(""), None);
    }

    #[test]
    fn test_branch_length_display_is_shortest() {
        assert_eq!(BranchLength(1.0).to_string(), "1");
        assert_eq!(BranchLength(0.25).to_string(), "0.25");
    }
}
