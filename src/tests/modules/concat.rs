use assert_matches::assert_matches;
use pretty_assertions::assert_eq;

use crate::{
    RawBuilder,
    ScopeKind,
    encoder::EncoderOptions,
    error::ErrorKind,
    raw::{RawBsonRef, RawDocument, RawDocumentBuf},
    spec::ElementType,
};

fn source() -> RawDocumentBuf {
    let mut builder = RawBuilder::new_document();
    builder.key_view("x").unwrap();
    builder.append(2).unwrap();
    builder.key_view("s").unwrap();
    builder.append("two").unwrap();
    builder.extract_document().unwrap()
}

#[test]
fn document_scope_keeps_duplicate_keys() {
    let mut builder = RawBuilder::new_document();
    builder.key_view("x").unwrap();
    builder.append(1).unwrap();
    builder.concatenate(&source()).unwrap();

    let doc = builder.view_document().unwrap();
    let pairs: Vec<(&str, RawBsonRef<'_>)> = doc
        .iter()
        .map(|elem| {
            let elem = elem.unwrap();
            (elem.key(), elem.value().unwrap())
        })
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("x", RawBsonRef::Int32(1)),
            ("x", RawBsonRef::Int32(2)),
            ("s", RawBsonRef::String("two")),
        ]
    );
    // the first occurrence wins on lookup
    assert_eq!(
        doc.get("x").unwrap().unwrap().value().unwrap().as_i32(),
        Some(1)
    );
}

#[test]
fn array_scope_reindexes_elements() {
    let mut builder = RawBuilder::new_array();
    builder.append(true).unwrap();
    builder.concatenate(&source()).unwrap();
    builder.append_null().unwrap();

    let arr = builder.view_array().unwrap();
    let elems: Vec<(&str, ElementType)> = arr
        .as_doc()
        .iter()
        .map(|elem| {
            let elem = elem.unwrap();
            (elem.key(), elem.element_type())
        })
        .collect();
    assert_eq!(
        elems,
        vec![
            ("0", ElementType::Boolean),
            ("1", ElementType::Int32),
            ("2", ElementType::String),
            ("3", ElementType::Null),
        ]
    );
    assert_eq!(arr.get(2).unwrap().and_then(RawBsonRef::as_str), Some("two"));
}

#[test]
fn nested_array_scope_uses_its_own_counter() {
    let mut builder = RawBuilder::new_document();
    builder.key_view("list").unwrap();
    builder.open_array().unwrap();
    builder.concatenate(&source()).unwrap();
    builder.concatenate(&source()).unwrap();
    builder.close_array().unwrap();

    let doc = builder.view_document().unwrap();
    let list = doc
        .get("list")
        .unwrap()
        .unwrap()
        .value()
        .unwrap()
        .as_array()
        .unwrap();
    let keys: Vec<&str> = list
        .as_doc()
        .iter()
        .map(|elem| elem.unwrap().key())
        .collect();
    assert_eq!(keys, vec!["0", "1", "2", "3"]);
}

#[test]
fn empty_source_is_a_no_op() {
    let mut builder = RawBuilder::new_document();
    builder.concatenate(&RawDocumentBuf::new()).unwrap();
    assert!(builder.view_document().unwrap().is_empty());

    let mut builder = RawBuilder::new_array();
    builder.concatenate(&RawDocumentBuf::new()).unwrap();
    builder.append(1).unwrap();
    assert_eq!(
        builder.view_array().unwrap().get(0).unwrap(),
        Some(RawBsonRef::Int32(1))
    );
}

#[test]
fn pending_key_survives_document_concatenation() {
    let mut builder = RawBuilder::new_document();
    builder.key_view("later").unwrap();
    builder.concatenate(&source()).unwrap();
    assert!(!builder.is_viewable());
    builder.append(3).unwrap();

    let keys: Vec<&str> = builder
        .view_document()
        .unwrap()
        .iter()
        .map(|elem| elem.unwrap().key())
        .collect();
    assert_eq!(keys, vec!["x", "s", "later"]);
}

#[test]
fn malformed_source_writes_nothing() {
    // a string element whose declared length runs past the document
    let bad = RawDocument::from_bytes(b"\x0f\x00\x00\x00\x02s\x00\x09\x00\x00\x00ab\x00\x00").unwrap();

    for root in [ScopeKind::Document, ScopeKind::Array] {
        let mut builder = RawBuilder::new(root);
        let err = builder.concatenate(bad).unwrap_err();
        assert_matches!(err.kind, ErrorKind::CannotAppendDocument { .. });
        assert_eq!(err.depth, Some(0));
        assert_eq!(err.scope, Some(root));

        let bytes = match root {
            ScopeKind::Document => builder.view_document().unwrap().as_bytes(),
            ScopeKind::Array => builder.view_array().unwrap().as_bytes(),
        };
        assert_eq!(bytes, &b"\x05\x00\x00\x00\x00"[..]);
    }
}

#[test]
fn oversized_source_writes_nothing() {
    let src = source();
    let limit = src.as_bytes().len();

    for root in [ScopeKind::Document, ScopeKind::Array] {
        let options = EncoderOptions::default().max_size(limit);
        let mut builder = RawBuilder::with_options(root, options);
        if root == ScopeKind::Document {
            builder.key_view("b").unwrap();
        }
        builder.append_bool(true).unwrap();
        let before = match root {
            ScopeKind::Document => builder.view_document().unwrap().as_bytes().to_vec(),
            ScopeKind::Array => builder.view_array().unwrap().as_bytes().to_vec(),
        };

        assert_matches!(
            builder.concatenate(&src).unwrap_err().kind,
            ErrorKind::CannotAppendDocument { .. }
        );
        let after = match root {
            ScopeKind::Document => builder.view_document().unwrap().as_bytes().to_vec(),
            ScopeKind::Array => builder.view_array().unwrap().as_bytes().to_vec(),
        };
        assert_eq!(before, after);
    }
}
