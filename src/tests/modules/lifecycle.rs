use pretty_assertions::assert_eq;

use crate::{RawBuilder, ScopeKind, encoder::EncoderOptions, raw::RawBsonRef};

#[test]
fn extract_leaves_an_empty_reusable_root() {
    let mut builder = RawBuilder::new_document();
    builder.key_view("a").unwrap();
    builder.append(1).unwrap();
    let first = builder.extract_document().unwrap();
    assert_eq!(
        first.as_bytes(),
        &b"\x0c\x00\x00\x00\x10a\x00\x01\x00\x00\x00\x00"[..]
    );

    assert!(builder.view_document().unwrap().is_empty());

    builder.key_view("b").unwrap();
    builder.append(2).unwrap();
    let second = builder.extract_document().unwrap();
    assert_eq!(
        second.as_bytes(),
        &b"\x0c\x00\x00\x00\x10b\x00\x02\x00\x00\x00\x00"[..]
    );
    // the first result is independent of later use
    assert_eq!(first.get("a").unwrap().unwrap().value().unwrap(), RawBsonRef::Int32(1));
}

#[test]
fn extract_restarts_array_indexes() {
    let mut builder = RawBuilder::new_array();
    for i in 0..3 {
        builder.append(i).unwrap();
    }
    assert_eq!(builder.extract_array().unwrap().len().unwrap(), 3);

    builder.append("again").unwrap();
    let arr = builder.extract_array().unwrap();
    let keys: Vec<&str> = arr
        .as_doc()
        .iter()
        .map(|elem| elem.unwrap().key())
        .collect();
    assert_eq!(keys, vec!["0"]);
}

#[test]
fn extract_in_a_loop() {
    let mut builder = RawBuilder::new_document();
    let mut batches = Vec::new();
    for n in 0..4i64 {
        builder.key_view("n").unwrap();
        builder.append(n).unwrap();
        batches.push(builder.extract_document().unwrap());
    }

    let values: Vec<i64> = batches
        .iter()
        .map(|doc| doc.get("n").unwrap().unwrap().value().unwrap().as_i64().unwrap())
        .collect();
    assert_eq!(values, vec![0, 1, 2, 3]);
}

#[test]
fn clear_discards_open_scopes_and_pending_key() {
    let mut builder = RawBuilder::new_document();
    builder.key_view("outer").unwrap();
    builder.open_document().unwrap();
    builder.key_view("inner").unwrap();
    builder.open_array().unwrap();
    builder.append(1).unwrap();
    builder.key_view("dangling").unwrap_err();
    assert_eq!(builder.depth(), 2);

    builder.clear();
    assert_eq!(builder.depth(), 0);
    assert!(builder.is_viewable());
    assert!(!builder.current_is_array());
    assert!(builder.view_document().unwrap().is_empty());

    builder.key_view("fresh").unwrap();
    builder.append(true).unwrap();
    assert_eq!(builder.view_document().unwrap().as_bytes().len(), 13);
}

#[test]
fn clear_keeps_root_kind_and_options() {
    let options = EncoderOptions::default().max_size(16);
    let mut builder = RawBuilder::with_options(ScopeKind::Array, options);
    builder.append(1).unwrap();
    builder.clear();

    assert_eq!(builder.root_kind(), ScopeKind::Array);
    assert!(builder.current_is_array());
    // 5 + 1 + 2 + 8 = 16 still fits, one more byte does not
    builder.append(1i64).unwrap();
    builder.append_null().unwrap_err();
}

#[test]
fn view_is_stable_between_appends() {
    let mut builder = RawBuilder::new_array();
    builder.append(1).unwrap();
    let snapshot = builder.view_array().unwrap().as_bytes().to_vec();
    builder.append(2).unwrap();
    assert_eq!(builder.view_array().unwrap().get(0).unwrap(), Some(RawBsonRef::Int32(1)));
    assert_eq!(&builder.view_array().unwrap().as_bytes()[4..11], &snapshot[4..11]);
}
