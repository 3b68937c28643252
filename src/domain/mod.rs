//! Domain layer: entities and tree algorithms
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod entities;
pub mod error;
pub mod labels;
pub mod newick;
pub mod prune;

pub use arena::{BranchLength, NodeData, TreeArena, TreeNode};
pub use entities::*;
pub use error::{DomainError, NewickError};
pub use labels::{LabelIndex, ScopeSet};
pub use prune::{prune, Closure};
