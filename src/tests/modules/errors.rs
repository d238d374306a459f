use assert_matches::assert_matches;
use pretty_assertions::assert_eq;

use crate::{
    RawBuilder,
    ScopeKind,
    encoder::{self, EncoderOptions},
    error::ErrorKind,
    spec::ElementType,
};

#[test]
fn value_without_key() {
    let mut builder = RawBuilder::new_document();
    let err = builder.append(1).unwrap_err();
    assert_matches!(err.kind, ErrorKind::NeedKey);
    assert_eq!(err.depth, Some(0));
    assert_eq!(err.scope, Some(ScopeKind::Document));
    assert!(err.is_structural());

    assert_matches!(builder.open_array().unwrap_err().kind, ErrorKind::NeedKey);
    assert_eq!(builder.depth(), 0);
    assert!(builder.view_document().unwrap().is_empty());
}

#[test]
fn key_twice() {
    let mut builder = RawBuilder::new_document();
    builder.key_view("first").unwrap();
    let err = builder.key_view("second").unwrap_err();
    assert_matches!(err.kind, ErrorKind::UnmatchedKeyInBuilder);
    assert_eq!(err.key.as_deref(), Some("first"));

    // the first key is still waiting for its value
    builder.append(1).unwrap();
    let doc = builder.view_document().unwrap();
    assert!(doc.get("first").unwrap().is_some());
    assert!(doc.get("second").unwrap().is_none());
}

#[test]
fn key_in_array_scope() {
    let mut builder = RawBuilder::new_array();
    let err = builder.key_owned("k").unwrap_err();
    assert_matches!(err.kind, ErrorKind::CannotSetKeyInArrayScope);
    assert_eq!(err.key.as_deref(), Some("k"));

    let mut builder = RawBuilder::new_document();
    builder.key_view("arr").unwrap();
    builder.open_array().unwrap();
    let err = builder.key_view("k").unwrap_err();
    assert_matches!(err.kind, ErrorKind::CannotSetKeyInArrayScope);
    assert_eq!(err.depth, Some(1));
    assert_eq!(err.scope, Some(ScopeKind::Array));
}

#[test]
fn close_without_open_scope() {
    let mut builder = RawBuilder::new_document();
    assert_matches!(
        builder.close_document().unwrap_err().kind,
        ErrorKind::NoScopeToClose {
            kind: ScopeKind::Document
        }
    );
    assert_matches!(
        builder.close_array().unwrap_err().kind,
        ErrorKind::NoScopeToClose {
            kind: ScopeKind::Array
        }
    );
}

#[test]
fn close_wrong_kind_keeps_depth() {
    let mut builder = RawBuilder::new_document();
    builder.key_view("a").unwrap();
    builder.open_array().unwrap();

    let err = builder.close_document().unwrap_err();
    assert_matches!(
        err.kind,
        ErrorKind::ScopeKindMismatch {
            expected: ScopeKind::Document,
            actual: ScopeKind::Array,
        }
    );
    assert_eq!(builder.depth(), 1);

    builder.close_array().unwrap();
    assert_eq!(builder.depth(), 0);
}

#[test]
fn close_with_pending_key() {
    let mut builder = RawBuilder::new_document();
    builder.key_view("d").unwrap();
    builder.open_document().unwrap();
    builder.key_view("dangling").unwrap();

    let err = builder.close_document().unwrap_err();
    assert_matches!(err.kind, ErrorKind::UnmatchedKeyInBuilder);
    assert_eq!(err.key.as_deref(), Some("dangling"));
    assert_eq!(builder.depth(), 1);

    builder.append_null().unwrap();
    builder.close_document().unwrap();
}

#[test]
fn view_requires_finished_root() {
    let mut builder = RawBuilder::new_document();
    builder.key_view("k").unwrap();
    assert!(!builder.is_viewable());
    assert_matches!(
        builder.view_document().unwrap_err().kind,
        ErrorKind::UnmatchedKeyInBuilder
    );

    builder.open_document().unwrap();
    assert!(!builder.is_viewable());
    assert_matches!(
        builder.extract_document().unwrap_err().kind,
        ErrorKind::UnmatchedKeyInBuilder
    );
    assert_eq!(builder.depth(), 1);

    builder.close_document().unwrap();
    assert!(builder.is_viewable());
}

#[test]
fn wrong_root_kind() {
    let mut doc = RawBuilder::new_document();
    assert_matches!(
        doc.view_array().unwrap_err().kind,
        ErrorKind::WrongRootKind {
            requested: ScopeKind::Array,
            actual: ScopeKind::Document,
        }
    );
    assert_matches!(
        doc.extract_array().unwrap_err().kind,
        ErrorKind::WrongRootKind { .. }
    );

    let arr = RawBuilder::new_array();
    assert_matches!(
        arr.view_document().unwrap_err().kind,
        ErrorKind::WrongRootKind {
            requested: ScopeKind::Document,
            actual: ScopeKind::Array,
        }
    );
}

#[test]
fn rejected_value_keeps_pending_key() {
    let options = EncoderOptions::default().max_size(32);
    let mut builder = RawBuilder::with_options(ScopeKind::Document, options);
    builder.key_view("s").unwrap();

    let err = builder.append("x".repeat(64).as_str()).unwrap_err();
    assert_matches!(
        err.kind,
        ErrorKind::CannotAppend {
            element_type: ElementType::String,
            source: encoder::Error::TooLarge { .. },
        }
    );
    assert_eq!(err.key.as_deref(), Some("s"));
    assert!(!err.is_structural());

    builder.append("short").unwrap();
    let doc = builder.view_document().unwrap();
    assert_eq!(
        doc.get("s").unwrap().unwrap().value().unwrap().as_str(),
        Some("short")
    );
}

#[test]
fn rejected_value_keeps_array_index() {
    // [1, 2] is exactly 19 bytes
    let options = EncoderOptions::default().max_size(19);
    let mut builder = RawBuilder::with_options(ScopeKind::Array, options);
    builder.append(1).unwrap();
    let err = builder.append(i64::MAX).unwrap_err();
    assert_matches!(
        err.kind,
        ErrorKind::CannotAppend {
            element_type: ElementType::Int64,
            source: encoder::Error::TooLarge { size: 23, max: 19 },
        }
    );
    assert_eq!(err.key.as_deref(), Some("1"));
    builder.append(2).unwrap();

    let arr = builder.view_array().unwrap();
    let keys: Vec<&str> = arr
        .as_doc()
        .iter()
        .map(|elem| elem.unwrap().key())
        .collect();
    assert_eq!(keys, vec!["0", "1"]);
}

#[test]
fn rejected_scope_keeps_state() {
    // {"k": 1} is 12 bytes; opening {"k": 1, "d": {}} would need 20
    let options = EncoderOptions::default().max_size(16);
    let mut builder = RawBuilder::with_options(ScopeKind::Document, options);
    builder.key_view("k").unwrap();
    builder.append(1).unwrap();
    let before = builder.view_document().unwrap().as_bytes().to_vec();

    builder.key_view("d").unwrap();
    let err = builder.open_document().unwrap_err();
    assert_matches!(
        err.kind,
        ErrorKind::CannotBeginScope {
            kind: ScopeKind::Document,
            source: encoder::Error::TooLarge { size: 20, max: 16 },
        }
    );
    assert_eq!(builder.depth(), 0);

    builder.append_null().unwrap();
    assert_eq!(builder.view_document().unwrap().as_bytes().len(), before.len() + 3);
}

#[test]
fn interior_nul_in_key() {
    let mut builder = RawBuilder::new_document();
    builder.key_view("a\0b").unwrap();
    let err = builder.append(true).unwrap_err();
    assert_matches!(
        err.kind,
        ErrorKind::CannotAppend {
            source: encoder::Error::InteriorNul { what: "key", .. },
            ..
        }
    );
}

#[test]
fn error_display_includes_context() {
    let mut builder = RawBuilder::new_document();
    builder.key_view("a").unwrap();
    builder.open_array().unwrap();
    let err = builder.key_view("b").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Error at key \"b\" (depth 1, in array): keys cannot be set in an array scope"
    );
}
