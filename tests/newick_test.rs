//! Integration tests for the Newick codec.

use rstest::rstest;

use numeralbank::domain::{newick, DomainError, NewickError};

#[rstest]
#[case("(A:1,(B:1,C:1)X:1)R:1;")]
#[case("((abkh1242:0.3,adyg1241:0.2)abkh1243:1.5,kart1248)root;")]
#[case("('Indo-European [indo1319]',(B,C));")]
#[case("(((a,b),c),((d,e),f));")]
#[case("A:0.001;")]
fn given_valid_newick_when_round_tripping_then_text_is_reproduced(#[case] text: &str) {
    let tree = newick::parse(text).unwrap();
    assert_eq!(newick::write(&tree), text);
    assert_eq!(tree.to_string(), text);
}

#[test]
fn given_tree_without_semicolon_when_parsing_then_writer_adds_it() {
    let tree = newick::parse("(A,B)R").unwrap();
    assert_eq!(newick::write(&tree), "(A,B)R;");
}

#[test]
fn given_label_with_quote_when_writing_then_quote_is_doubled() {
    let tree = newick::parse("('O''Brien',B);").unwrap();
    assert_eq!(tree.leaf_names(), vec!["O'Brien", "B"]);
    assert_eq!(newick::write(&tree), "('O''Brien',B);");
}

#[test]
fn given_multiline_tree_when_parsing_then_structure_is_kept() {
    let text = "(\n  A:1,\n  (B:1, C:1)X:1\n)R;\n";
    let tree = newick::parse(text).unwrap();
    assert_eq!(tree.leaf_names(), vec!["A", "B", "C"]);
    assert_eq!(tree.depth(), 3);
}

#[rstest]
#[case("")]
#[case("   ")]
#[case("(A,B")]
#[case("A,B;")]
#[case("(A:,B);")]
#[case("(A,B)R; extra")]
#[case("(A[unclosed,B);")]
fn given_malformed_newick_when_parsing_then_returns_error(#[case] text: &str) {
    assert!(newick::parse(text).is_err(), "accepted: {text:?}");
}

#[test]
fn given_newick_error_when_wrapped_then_message_names_position() {
    let err = newick::parse("(A,(B,C;").unwrap_err();
    assert_eq!(err, NewickError::UnbalancedParentheses { position: 7 });

    let wrapped = DomainError::from(err);
    assert_eq!(
        wrapped.to_string(),
        "malformed tree: unbalanced parentheses at 7"
    );
}

fn left_nested(levels: usize) -> String {
    format!("{}A,B){};", "(".repeat(levels), ",C)".repeat(levels - 1))
}

#[test]
fn given_deeply_nested_tree_when_round_tripping_then_stack_holds() {
    let levels = 200_000;
    let text = left_nested(levels);

    let tree = newick::parse(&text).unwrap();

    assert_eq!(tree.depth(), levels + 1);
    assert_eq!(tree.leaf_names().len(), levels + 1);
    assert_eq!(newick::write(&tree), text);
}
