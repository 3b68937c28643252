//! Diagram rendering of trees for the terminal

use std::collections::HashMap;

use generational_arena::Index;
use termtree::Tree;
use tracing::instrument;

use crate::domain::TreeArena;

/// Conversion into a printable `termtree` diagram.
pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

fn node_label(arena: &TreeArena, idx: Index) -> String {
    match arena.get_node(idx) {
        Some(node) if node.data.name.is_empty() && node.data.branch_length.is_none() => {
            "*".to_string()
        }
        Some(node) => node.data.to_string(),
        None => String::new(),
    }
}

impl TreeNodeConvert for TreeArena {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        let Some(root_idx) = self.root() else {
            return Tree::new("Empty tree".to_string());
        };

        // Children come before parents in postorder, so each subtree is
        // complete when its parent collects it.
        let mut built: HashMap<Index, Tree<String>> = HashMap::new();
        for (idx, node) in self.iter_postorder() {
            let leaves: Vec<Tree<String>> = node
                .children
                .iter()
                .filter_map(|child| built.remove(child))
                .collect();
            built.insert(idx, Tree::new(node_label(self, idx)).with_leaves(leaves));
        }
        built
            .remove(&root_idx)
            .unwrap_or_else(|| Tree::new("Empty tree".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::newick;

    #[test]
    fn given_tree_when_rendering_then_children_are_indented_under_parent() {
        let tree = newick::parse("(A:1,(B,C)X)R;").unwrap();
        let rendered = tree.to_tree_string().to_string();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines[0], "R");
        assert!(lines[1].ends_with("A:1"));
        assert!(lines[2].ends_with("X"));
        assert!(lines[3].ends_with("B"));
        assert!(lines[4].ends_with("C"));
    }

    #[test]
    fn given_unnamed_node_when_rendering_then_uses_placeholder() {
        let tree = newick::parse("(A,B);").unwrap();
        let rendered = tree.to_tree_string().to_string();
        assert!(rendered.starts_with('*'));
    }

    #[test]
    fn given_deeply_nested_tree_when_rendering_then_every_node_has_a_line() {
        let levels = 500;
        let text = format!("{}A,B){};", "(".repeat(levels), ",C)".repeat(levels - 1));
        let tree = newick::parse(&text).unwrap();

        let rendered = tree.to_tree_string().to_string();

        assert_eq!(rendered.lines().count(), tree.len());
        assert!(rendered.lines().last().unwrap().ends_with('C'));
    }

    #[test]
    fn given_empty_tree_when_rendering_then_says_so() {
        let tree = TreeArena::new();
        assert_eq!(tree.to_tree_string().to_string().trim(), "Empty tree");
    }
}
