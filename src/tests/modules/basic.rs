use assert_matches::assert_matches;
use pretty_assertions::assert_eq;

use crate::{
    RawBuilder,
    builder::basic::{ArrayBuilder, DocumentBuilder},
    encoder::EncoderOptions,
    error::{Error, ErrorKind},
    raw::{RawBsonRef, RawDocumentBuf},
};

#[test]
fn closures_match_explicit_scopes() {
    let mut doc = DocumentBuilder::new();
    doc.append("a", 1)
        .unwrap()
        .append_array("list", |arr| {
            arr.append("x")?.append_document(|sub| {
                sub.append("y", true)?;
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();
    let from_closures = doc.extract().unwrap();

    let mut builder = RawBuilder::new_document();
    builder.key_view("a").unwrap();
    builder.append(1).unwrap();
    builder.key_view("list").unwrap();
    builder.open_array().unwrap();
    builder.append("x").unwrap();
    builder.open_document().unwrap();
    builder.key_view("y").unwrap();
    builder.append(true).unwrap();
    builder.close_document().unwrap();
    builder.close_array().unwrap();

    assert_eq!(from_closures.as_bytes(), builder.view_document().unwrap().as_bytes());
}

#[test]
fn owned_keys_can_be_computed() {
    let mut doc = DocumentBuilder::new();
    for i in 0..3 {
        doc.append(format!("field{i}"), i).unwrap();
    }
    let doc = doc.extract().unwrap();
    assert_eq!(
        doc.get("field2").unwrap().unwrap().value().unwrap(),
        RawBsonRef::Int32(2)
    );
}

#[test]
fn failed_closure_leaves_no_trace() {
    let mut doc = DocumentBuilder::new();
    doc.append("keep", 1).unwrap();
    let before = doc.view().unwrap().as_bytes().to_vec();

    let err = doc
        .append_document("broken", |sub| {
            sub.append("half", "written")?
                .append_array("deeper", |arr| {
                    arr.append(1)?;
                    Err(Error::from(ErrorKind::NeedKey))
                })?;
            Ok(())
        })
        .unwrap_err();
    assert_matches!(err.kind, ErrorKind::NeedKey);
    assert_eq!(doc.view().unwrap().as_bytes(), &before[..]);

    // the builder is still usable afterwards
    doc.append("after", 2).unwrap();
    let keys: Vec<&str> = doc
        .view()
        .unwrap()
        .iter()
        .map(|elem| elem.unwrap().key())
        .collect();
    assert_eq!(keys, vec!["keep", "after"]);
}

#[test]
fn failed_closure_in_array_keeps_indexes_dense() {
    let mut arr = ArrayBuilder::new();
    arr.append(0).unwrap();
    arr.append_array(|_| Err(Error::from(ErrorKind::NeedKey)))
        .unwrap_err();
    arr.append(1).unwrap();

    let arr = arr.extract().unwrap();
    let keys: Vec<&str> = arr
        .as_doc()
        .iter()
        .map(|elem| elem.unwrap().key())
        .collect();
    assert_eq!(keys, vec!["0", "1"]);
}

#[test]
fn rejected_value_does_not_poison_the_next_pair() {
    let mut doc = DocumentBuilder::new();
    let err = doc.append("b\0ad", "x").err();
    assert_matches!(err.map(|e| e.kind), Some(ErrorKind::CannotAppend { .. }));

    doc.append("good", "ab").unwrap();
    let doc = doc.extract().unwrap();
    assert_eq!(doc.iter().count(), 1);
    assert!(doc.get("b").unwrap().is_none());
    assert_eq!(
        doc.get("good").unwrap().unwrap().value().unwrap().as_str(),
        Some("ab")
    );
}

#[test]
fn size_limit_applies_to_nested_closures() {
    let mut arr = ArrayBuilder::with_options(EncoderOptions::default().max_size(24));
    let err = arr
        .append_document(|sub| {
            sub.append("payload", "0123456789")?;
            Ok(())
        })
        .unwrap_err();
    assert_matches!(err.kind, ErrorKind::CannotAppend { .. });
    assert!(arr.view().unwrap().is_empty());
}

#[test]
fn concatenate_through_closures() {
    let mut src = DocumentBuilder::new();
    src.append("p", 1).unwrap().append("q", 2).unwrap();
    let src: RawDocumentBuf = src.extract().unwrap();

    let mut arr = ArrayBuilder::new();
    arr.append_document(|sub| {
        sub.concatenate(&src)?;
        Ok(())
    })
    .unwrap()
    .concatenate(&src)
    .unwrap();

    let arr = arr.extract().unwrap();
    assert_eq!(arr.len().unwrap(), 3);
    assert_eq!(
        arr.get(0).unwrap().and_then(RawBsonRef::as_document).map(|d| d.as_bytes()),
        Some(src.as_bytes())
    );
    assert_eq!(arr.get(2).unwrap(), Some(RawBsonRef::Int32(2)));
}

#[test]
fn clear_empties_basic_builders() {
    let mut arr = ArrayBuilder::new();
    arr.append(1).unwrap();
    arr.clear();
    arr.append(2).unwrap();
    assert_eq!(arr.view().unwrap().get(0).unwrap(), Some(RawBsonRef::Int32(2)));

    let mut doc = DocumentBuilder::default();
    doc.append("x", 1).unwrap();
    doc.clear();
    assert!(doc.view().unwrap().is_empty());
}
