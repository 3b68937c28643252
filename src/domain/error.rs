//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Syntax errors in Newick text.
///
/// Positions are byte offsets into the input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NewickError {
    #[error("empty tree text")]
    Empty,

    #[error("unbalanced parentheses at {position}")]
    UnbalancedParentheses { position: usize },

    #[error("unexpected {found} at {position}")]
    UnexpectedToken { position: usize, found: String },

    #[error("unterminated quoted label starting at {position}")]
    UnterminatedQuote { position: usize },

    #[error("unterminated comment starting at {position}")]
    UnterminatedComment { position: usize },

    #[error("invalid branch length '{value}' at {position}")]
    InvalidBranchLength { position: usize, value: String },

    #[error("trailing input after ';' at {position}")]
    TrailingInput { position: usize },
}

/// Domain errors represent tree and pruning violations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("malformed tree: {0}")]
    Newick(#[from] NewickError),

    #[error("no pruning targets given")]
    EmptyTargetSet,

    #[error("node not found in tree: {0}")]
    NodeNotFound(String),

    #[error("target nodes do not share a common ancestor")]
    DisconnectedTargets,

    #[error("cannot delete the root node")]
    CannotDeleteRoot,
}
