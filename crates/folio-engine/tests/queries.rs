//! Path and descendant lookups, plus the structural calls that work on
//! explicit blots instead of document offsets.

use folio_engine::{
    Schema, Scroll,
    snapshot::{invariants, outline},
};
use insta::assert_snapshot;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

fn scroll(text: &str) -> Scroll {
    let mut scroll = Scroll::new(Schema::standard()).unwrap();
    scroll.insert_text(0, text).unwrap();
    scroll
}

/// Two lines: `a` + bold `b`, then bold `c` + `d`.
fn two_lines() -> Scroll {
    let mut scroll = scroll("ab");
    let root = scroll.root().id();
    let line = scroll.create("block", json!(null)).unwrap();
    scroll.insert_before(root, line, None).unwrap();
    scroll.insert_text(2, "cd").unwrap();
    scroll.format_at(1, 2, "bold", json!(true)).unwrap();
    scroll
}

fn kinds_and_offsets(scroll: &Scroll, index: usize, inclusive: bool) -> Vec<(String, usize)> {
    scroll
        .path(index, inclusive)
        .into_iter()
        .map(|(blot, offset)| (blot.kind().to_string(), offset))
        .collect()
}

#[rstest]
#[case::exclusive(false, vec![("scroll", 2), ("block", 2), ("bold", 0), ("text", 0)])]
#[case::inclusive(true, vec![("scroll", 2), ("block", 2), ("text", 2)])]
fn path_at_a_boundary(#[case] inclusive: bool, #[case] expected: Vec<(&str, usize)>) {
    let mut scroll = scroll("abcd");
    scroll.format_at(2, 2, "bold", json!(true)).unwrap();

    let expected: Vec<(String, usize)> = expected
        .into_iter()
        .map(|(kind, offset)| (kind.to_string(), offset))
        .collect();
    assert_eq!(kinds_and_offsets(&scroll, 2, inclusive), expected);
}

#[test]
fn inclusive_path_skips_to_a_zero_length_neighbour() {
    let mut scroll = scroll("ab");
    let line = scroll.root().children().next().unwrap().id();
    let marker = scroll.create("break", json!(null)).unwrap();
    scroll.insert_before(line, marker, None).unwrap();

    let path = scroll.path(2, true);
    let (leaf, offset) = path.last().unwrap();
    assert_eq!(leaf.id(), marker);
    assert_eq!(*offset, 0);

    assert_eq!(kinds_and_offsets(&scroll, 2, false), vec![("scroll".to_string(), 2)]);
}

#[test]
fn descendants_cross_lines() {
    let scroll = two_lines();
    assert_snapshot!(outline(&scroll), @r#"
    scroll
      block
        text "a"
        bold=true
          text "b"
      block
        bold=true
          text "c"
        text "d"
    "#);

    let bold = scroll.descendants(|blot| blot.formats().contains_key("bold"), 0, 4);
    assert_eq!(bold.len(), 2);
    assert!(bold.iter().all(|blot| blot.kind() == "bold"));

    let leaves: Vec<_> = scroll
        .descendants(|blot| blot.is_leaf(), 1, 2)
        .into_iter()
        .filter_map(|blot| blot.text())
        .collect();
    assert_eq!(leaves, vec!["b", "c"]);

    assert!(scroll.descendants(|blot| blot.is_a("bold"), 0, 1).is_empty());
}

#[test]
fn descendant_follows_the_path() {
    let scroll = two_lines();

    let (bold, offset) = scroll
        .descendant(|blot| blot.is_branch() && blot.kind() == "bold", 2)
        .unwrap();
    assert_eq!(bold.text(), None);
    assert_eq!(bold.length(), 1);
    assert_eq!(offset, 0);

    assert!(scroll.descendant(|blot| blot.kind() == "bold", 3).is_none());
}

#[test]
fn isolate_splits_a_leaf_in_the_middle() {
    let mut scroll = scroll("abcdef");
    let (text, _) = scroll.descendant_of_kind("text", 0).unwrap();
    let text = text.id();

    let middle = scroll.isolate(text, 2, 2).unwrap();
    invariants(&scroll);
    assert_eq!(scroll.blot(middle).unwrap().text(), Some("cd"));
    assert_eq!(scroll.blot(middle).unwrap().offset(), 2);
    assert_snapshot!(outline(&scroll), @r#"
    scroll
      block
        text "ab"
        text "cd"
        text "ef"
    "#);

    scroll.optimize();
    assert_snapshot!(outline(&scroll), @r#"
    scroll
      block
        text "abcdef"
    "#);
}

#[test]
fn insert_at_with_a_value_creates_that_kind() {
    let mut scroll = scroll("abcd");
    scroll.insert_at(2, "image", Some(json!("x.png"))).unwrap();
    scroll.insert_at(0, ">", None).unwrap();

    invariants(&scroll);
    assert_eq!(scroll.length(), 6);
    assert_snapshot!(outline(&scroll), @r#"
    scroll
      block
        text ">ab"
        image "x.png"
        text "cd"
    "#);
}

#[test]
fn move_children_joins_lines() {
    let mut scroll = two_lines();
    let (first, second) = {
        let mut lines = scroll.root().children().map(|line| line.id());
        (lines.next().unwrap(), lines.next().unwrap())
    };

    scroll.move_children(second, first, None).unwrap();
    scroll.optimize();
    invariants(&scroll);
    assert_snapshot!(outline(&scroll), @r#"
    scroll
      block
        text "a"
        bold=true
          text "bc"
        text "d"
      block
        break
    "#);
}
