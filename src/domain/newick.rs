//! Newick (New Hampshire) bracket notation.
//!
//! `(child1,child2,...)name:branch_length;` with optional names and lengths.
//! Single-quoted labels and `[...]` comments are understood; output quotes
//! any label that would not survive unquoted.

use std::fmt::{self, Write};
use std::iter::Peekable;

use generational_arena::Index;
use tracing::{instrument, trace};

use crate::domain::arena::{BranchLength, NodeData, TreeArena, TreeNode};
use crate::domain::error::NewickError;

const METACHARACTERS: &[char] = &['(', ')', '[', ']', '\'', ':', ';', ','];

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Open,
    Close,
    Comma,
    Colon,
    Semicolon,
    Label(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Open => write!(f, "'('"),
            Token::Close => write!(f, "')'"),
            Token::Comma => write!(f, "','"),
            Token::Colon => write!(f, "':'"),
            Token::Semicolon => write!(f, "';'"),
            Token::Label(s) => write!(f, "label '{}'", s),
        }
    }
}

/// Splits Newick text into positioned tokens.
fn tokenize(text: &str) -> Result<Vec<(usize, Token)>, NewickError> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(pos, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' | ')' | ',' | ':' | ';' => {
                chars.next();
                let token = match c {
                    '(' => Token::Open,
                    ')' => Token::Close,
                    ',' => Token::Comma,
                    ':' => Token::Colon,
                    _ => Token::Semicolon,
                };
                tokens.push((pos, token));
            }
            '[' => {
                chars.next();
                if !chars.by_ref().any(|(_, c)| c == ']') {
                    return Err(NewickError::UnterminatedComment { position: pos });
                }
            }
            ']' => {
                return Err(NewickError::UnexpectedToken {
                    position: pos,
                    found: "']'".to_string(),
                })
            }
            '\'' => {
                chars.next();
                let mut label = String::new();
                let mut closed = false;
                while let Some((_, c)) = chars.next() {
                    if c == '\'' {
                        // '' inside quotes is an escaped quote
                        if matches!(chars.peek(), Some(&(_, '\''))) {
                            chars.next();
                            label.push('\'');
                        } else {
                            closed = true;
                            break;
                        }
                    } else {
                        label.push(c);
                    }
                }
                if !closed {
                    return Err(NewickError::UnterminatedQuote { position: pos });
                }
                tokens.push((pos, Token::Label(label)));
            }
            _ => {
                let mut label = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_whitespace() || METACHARACTERS.contains(&c) {
                        break;
                    }
                    label.push(c);
                    chars.next();
                }
                tokens.push((pos, Token::Label(label)));
            }
        }
    }
    Ok(tokens)
}

type Tokens = Peekable<std::vec::IntoIter<(usize, Token)>>;

/// Reads the optional `name` and `:length` trailing a subtree.
fn read_label_and_length(tokens: &mut Tokens, end: usize) -> Result<NodeData, NewickError> {
    let mut data = NodeData::new("", None);
    if let Some((_, Token::Label(name))) = tokens.next_if(|(_, t)| matches!(t, Token::Label(_))) {
        data.name = name;
    }
    if tokens.next_if(|(_, t)| *t == Token::Colon).is_some() {
        match tokens.next() {
            Some((pos, Token::Label(value))) => {
                let length = value
                    .parse::<f64>()
                    .map_err(|_| NewickError::InvalidBranchLength { position: pos, value })?;
                data.branch_length = Some(BranchLength(length));
            }
            Some((pos, token)) => {
                return Err(NewickError::InvalidBranchLength {
                    position: pos,
                    value: token.to_string(),
                })
            }
            None => {
                return Err(NewickError::UnexpectedToken {
                    position: end,
                    found: "end of input".to_string(),
                })
            }
        }
    }
    Ok(data)
}

fn set_data(tree: &mut TreeArena, idx: Index, data: NodeData) {
    if let Some(node) = tree.get_node_mut(idx) {
        node.data = data;
    }
}

/// Parses Newick text into a fresh tree.
///
/// The trailing `;` is optional. Parsing is iterative, so nesting depth is
/// bounded by memory rather than by the call stack.
#[instrument(level = "debug", skip(text), fields(len = text.len()))]
pub fn parse(text: &str) -> Result<TreeArena, NewickError> {
    let end = text.len();
    let mut tokens = tokenize(text)?.into_iter().peekable();
    if tokens.peek().is_none() {
        return Err(NewickError::Empty);
    }

    let mut tree = TreeArena::new();
    // Open internal nodes, innermost last
    let mut stack: Vec<Index> = Vec::new();
    let mut expect_subtree = true;

    loop {
        if expect_subtree {
            if let Some((_, Token::Open)) = tokens.peek() {
                tokens.next();
                let idx = tree.insert_node(NodeData::new("", None), stack.last().copied());
                stack.push(idx);
                continue;
            }
            // A leaf, possibly unnamed as in "(,)"
            let data = read_label_and_length(&mut tokens, end)?;
            trace!("leaf: {}", data);
            tree.insert_node(data, stack.last().copied());
            expect_subtree = false;
            continue;
        }

        match tokens.next() {
            Some((pos, Token::Comma)) => {
                if stack.is_empty() {
                    return Err(NewickError::UnexpectedToken {
                        position: pos,
                        found: Token::Comma.to_string(),
                    });
                }
                expect_subtree = true;
            }
            Some((pos, Token::Close)) => {
                let idx = stack
                    .pop()
                    .ok_or(NewickError::UnbalancedParentheses { position: pos })?;
                let data = read_label_and_length(&mut tokens, end)?;
                set_data(&mut tree, idx, data);
            }
            Some((pos, Token::Semicolon)) => {
                if !stack.is_empty() {
                    return Err(NewickError::UnbalancedParentheses { position: pos });
                }
                if let Some((pos, _)) = tokens.next() {
                    return Err(NewickError::TrailingInput { position: pos });
                }
                break;
            }
            Some((pos, token)) => {
                return Err(NewickError::UnexpectedToken {
                    position: pos,
                    found: token.to_string(),
                })
            }
            None => {
                if !stack.is_empty() {
                    return Err(NewickError::UnbalancedParentheses { position: end });
                }
                break;
            }
        }
    }

    Ok(tree)
}

/// Quotes a label when it contains Newick metacharacters or whitespace.
fn format_label(name: &str) -> String {
    if name.chars().any(|c| c.is_whitespace() || METACHARACTERS.contains(&c)) {
        format!("'{}'", name.replace('\'', "''"))
    } else {
        name.to_string()
    }
}

fn write_label(node: &TreeNode, out: &mut String) -> fmt::Result {
    out.push_str(&format_label(&node.data.name));
    if let Some(length) = node.data.branch_length {
        write!(out, ":{}", length)?;
    }
    Ok(())
}

enum Step {
    Enter(Index),
    Comma,
    Close(Index),
}

fn write_subtree(tree: &TreeArena, idx: Index, out: &mut String) -> fmt::Result {
    let mut steps = vec![Step::Enter(idx)];
    while let Some(step) = steps.pop() {
        match step {
            Step::Enter(idx) => {
                let Some(node) = tree.get_node(idx) else {
                    continue;
                };
                if node.children.is_empty() {
                    write_label(node, out)?;
                    continue;
                }
                out.push('(');
                steps.push(Step::Close(idx));
                // Reversed so the first child is popped first
                for (i, &child) in node.children.iter().enumerate().rev() {
                    steps.push(Step::Enter(child));
                    if i > 0 {
                        steps.push(Step::Comma);
                    }
                }
            }
            Step::Comma => out.push(','),
            Step::Close(idx) => {
                out.push(')');
                if let Some(node) = tree.get_node(idx) {
                    write_label(node, out)?;
                }
            }
        }
    }
    Ok(())
}

/// Serializes a tree to Newick text terminated by `;`.
///
/// An empty tree yields the empty string.
#[instrument(level = "debug", skip(tree))]
pub fn write(tree: &TreeArena) -> String {
    let mut out = String::new();
    if let Some(root) = tree.root() {
        if write_subtree(tree, root, &mut out).is_ok() {
            out.push(';');
        }
    }
    out
}

impl fmt::Display for TreeArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&write(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("(A:1,(B:1,C:1)X:1)R:1;")]
    #[case("((A,B),C);")]
    #[case("(,);")]
    #[case("A;")]
    #[case("('Abkhaz [abkh1244]':0.5,'O''Brien')root;")]
    #[case("(A:0.125,B:2.5e-3)R;")]
    fn test_round_trip(#[case] text: &str) {
        let tree = parse(text).unwrap();
        let written = write(&tree);
        let reparsed = parse(&written).unwrap();
        assert_eq!(write(&reparsed), written);
    }

    #[test]
    fn test_parse_structure() {
        let tree = parse("(A:1,(B:1,C:1)X:1)R:1;").unwrap();
        let root = tree.root().unwrap();
        let root_node = tree.get_node(root).unwrap();
        assert_eq!(root_node.data.name, "R");
        assert_eq!(root_node.data.branch_length.map(|b| b.0), Some(1.0));
        assert_eq!(root_node.children.len(), 2);
        assert_eq!(tree.leaf_names(), vec!["A", "B", "C"]);
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn test_whitespace_comments_and_missing_semicolon_are_normalized() {
        let tree = parse(" ( A : 1 , B[&note] ) R \n").unwrap();
        assert_eq!(write(&tree), "(A:1,B)R;");
    }

    #[test]
    fn test_quoted_labels_keep_metacharacters() {
        let tree = parse("('a b','c,d');").unwrap();
        assert_eq!(tree.leaf_names(), vec!["a b", "c,d"]);
        assert_eq!(write(&tree), "('a b','c,d');");
    }

    #[rstest]
    #[case("", NewickError::Empty)]
    #[case("(A,(B,C;", NewickError::UnbalancedParentheses { position: 7 })]
    #[case("(A,B));", NewickError::UnbalancedParentheses { position: 5 })]
    #[case("(A,B", NewickError::UnbalancedParentheses { position: 4 })]
    #[case("A,B;", NewickError::UnexpectedToken { position: 1, found: "','".to_string() })]
    #[case("(A:x,B);", NewickError::InvalidBranchLength { position: 3, value: "x".to_string() })]
    #[case("('A,B);", NewickError::UnterminatedQuote { position: 1 })]
    #[case("(A[,B);", NewickError::UnterminatedComment { position: 2 })]
    #[case("(A,B);C", NewickError::TrailingInput { position: 6 })]
    fn test_malformed_input(#[case] text: &str, #[case] expected: NewickError) {
        assert_eq!(parse(text).unwrap_err(), expected);
    }

    #[test]
    fn test_empty_tree_writes_nothing() {
        assert_eq!(write(&TreeArena::new()), "");
    }
}
