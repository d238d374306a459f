use assert_matches::assert_matches;
use bson_builder::{
    RawBuilder,
    ScopeKind,
    error::ErrorKind,
    oid::ObjectId,
    raw::{RawBsonRef, RawDocument, RawDocumentBuf},
    spec::{BinarySubtype, ElementType},
};
use pretty_assertions::assert_eq;

#[test]
fn nested_scenario_bytes() {
    let mut builder = RawBuilder::new_document();
    builder.key_view("a").unwrap();
    builder.open_array().unwrap();
    builder.append(1).unwrap();
    builder.append(2).unwrap();
    builder.open_document().unwrap();
    builder.key_view("b").unwrap();
    builder.append(3).unwrap();
    builder.close_document().unwrap();
    builder.close_array().unwrap();
    assert_eq!(builder.depth(), 0);

    let dst: [u8; 42] = [
        42, 0, 0, 0, 4, 97, 0, 34, 0, 0, 0, 16, 48, 0, 1, 0, 0, 0, 16, 49, 0, 2, 0, 0, 0, 3, 50,
        0, 12, 0, 0, 0, 16, 98, 0, 3, 0, 0, 0, 0, 0, 0,
    ];
    let doc = builder.extract_document().unwrap();
    assert_eq!(doc.as_bytes(), &dst[..]);

    // the extracted bytes stand on their own
    let reparsed = RawDocumentBuf::from_bytes(doc.into_bytes()).unwrap();
    let a = reparsed.get("a").unwrap().unwrap();
    assert_eq!(a.element_type(), ElementType::Array);
    let inner = a.value().unwrap().as_array().unwrap().get(2).unwrap().unwrap();
    assert_eq!(
        inner.as_document().unwrap().get("b").unwrap().unwrap().value().unwrap(),
        RawBsonRef::Int32(3)
    );
}

#[test]
fn record_with_mixed_values() {
    let id = ObjectId::parse_str("541b1a00e8a23afa832b218e").unwrap();
    let mut tags = RawBuilder::new_array();
    tags.append("red").unwrap();
    tags.append("blue").unwrap();
    let tags = tags.extract_array().unwrap();

    let mut builder = RawBuilder::new_document();
    builder.key_view("_id").unwrap();
    builder.append(id).unwrap();
    builder.key_view("tags").unwrap();
    builder.append(&tags).unwrap();
    builder.key_owned(String::from("blob")).unwrap();
    builder.append_binary(BinarySubtype::Md5, b"thingies").unwrap();
    builder.key_view("pattern").unwrap();
    builder.append_regex("s[ao]d", "i").unwrap();
    builder.key_view("count").unwrap();
    builder.append(-55i64).unwrap();
    let doc = builder.view_document().unwrap();

    let types: Vec<(&str, ElementType)> = doc
        .iter()
        .map(|elem| {
            let elem = elem.unwrap();
            (elem.key(), elem.element_type())
        })
        .collect();
    assert_eq!(
        types,
        vec![
            ("_id", ElementType::ObjectId),
            ("tags", ElementType::Array),
            ("blob", ElementType::Binary),
            ("pattern", ElementType::RegularExpression),
            ("count", ElementType::Int64),
        ]
    );

    let blob = doc.get("blob").unwrap().unwrap().value().unwrap().as_binary().unwrap();
    assert_eq!(blob.subtype, BinarySubtype::Md5);
    assert_eq!(blob.bytes, b"thingies");
    assert_eq!(
        doc.get("tags").unwrap().unwrap().value().unwrap().as_array().unwrap().as_bytes(),
        tags.as_bytes()
    );
    assert_eq!(
        doc.get("_id").unwrap().unwrap().value().unwrap().as_object_id(),
        Some(id)
    );
}

#[test]
fn aborted_build_recovers_with_clear() {
    let mut builder = RawBuilder::new(ScopeKind::Document);
    builder.key_view("outer").unwrap();
    builder.open_document().unwrap();
    builder.key_view("inner").unwrap();

    let err = builder.close_array().unwrap_err();
    assert!(err.is_structural());
    assert_matches!(
        err.kind,
        ErrorKind::ScopeKindMismatch {
            expected: ScopeKind::Array,
            actual: ScopeKind::Document,
            ..
        }
    );
    assert_matches!(
        builder.view_document().unwrap_err().kind,
        ErrorKind::UnmatchedKeyInBuilder
    );

    builder.clear();
    builder.key_view("fresh").unwrap();
    builder.append_null().unwrap();
    let doc = builder.extract_document().unwrap();
    assert_eq!(doc.as_bytes(), b"\x0c\x00\x00\x00\x0afresh\x00\x00");
}

#[test]
fn concatenation_scenarios() {
    let src = RawDocument::from_bytes(b"\x0c\x00\x00\x00\x10x\x00\x02\x00\x00\x00\x00").unwrap();

    let mut doc = RawBuilder::new_document();
    doc.key_view("x").unwrap();
    doc.append(1).unwrap();
    doc.concatenate(src).unwrap();
    assert_eq!(
        doc.view_document().unwrap().as_bytes(),
        b"\x13\x00\x00\x00\x10x\x00\x01\x00\x00\x00\x10x\x00\x02\x00\x00\x00\x00"
    );

    let mut arr = RawBuilder::new_array();
    arr.append(1).unwrap();
    arr.concatenate(src).unwrap();
    assert_eq!(
        arr.view_array().unwrap().as_bytes(),
        b"\x13\x00\x00\x00\x100\x00\x01\x00\x00\x00\x101\x00\x02\x00\x00\x00\x00"
    );
}

#[test]
fn uninit_binary_is_filled_in_place() {
    let mut builder = RawBuilder::new_array();
    let slot = builder.append_binary_uninit(BinarySubtype::Uuid, 16).unwrap();
    assert_eq!(slot, &[0u8; 16][..]);
    for (i, byte) in slot.iter_mut().enumerate() {
        *byte = i as u8;
    }

    let arr = builder.extract_array().unwrap();
    let bin = arr.get(0).unwrap().unwrap().as_binary().unwrap();
    assert_eq!(bin.subtype, BinarySubtype::Uuid);
    assert_eq!(bin.bytes, &(0..16).collect::<Vec<u8>>()[..]);
}
