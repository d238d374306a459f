use proptest::prelude::*;

use crate::{
    RawBuilder,
    error::Result,
    raw::{RawBsonRef, RawDocument},
};

#[derive(Clone, Debug)]
enum Node {
    Int(i32),
    Long(i64),
    Str(String),
    Bool(bool),
    Null,
    Doc(Vec<(String, Node)>),
    Arr(Vec<Node>),
}

fn arbitrary_node() -> impl Strategy<Value = Node> {
    let leaf = prop_oneof![
        any::<i32>().prop_map(Node::Int),
        any::<i64>().prop_map(Node::Long),
        "[^\0]*".prop_map(Node::Str),
        any::<bool>().prop_map(Node::Bool),
        Just(Node::Null),
    ];

    leaf.prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(("[^\0]{0,8}", inner.clone()), 0..8).prop_map(Node::Doc),
            prop::collection::vec(inner, 0..8).prop_map(Node::Arr),
        ]
    })
}

/// Writes `node` at the current position, tracking that depth goes up by one on every open and
/// back down on every close.
fn write(builder: &mut RawBuilder<'_>, node: &Node) -> Result<()> {
    match node {
        Node::Int(i) => builder.append(*i),
        Node::Long(i) => builder.append(*i),
        Node::Str(s) => builder.append(s.as_str()),
        Node::Bool(b) => builder.append(*b),
        Node::Null => builder.append_null(),
        Node::Doc(fields) => {
            let depth = builder.depth();
            builder.open_document()?;
            assert_eq!(builder.depth(), depth + 1);
            for (key, value) in fields {
                builder.key_owned(key.clone())?;
                write(builder, value)?;
            }
            builder.close_document()?;
            assert_eq!(builder.depth(), depth);
            Ok(())
        }
        Node::Arr(items) => {
            let depth = builder.depth();
            builder.open_array()?;
            assert_eq!(builder.depth(), depth + 1);
            for item in items {
                write(builder, item)?;
            }
            builder.close_array()?;
            assert_eq!(builder.depth(), depth);
            Ok(())
        }
    }
}

fn value_matches(value: RawBsonRef<'_>, node: &Node) -> bool {
    match (value, node) {
        (RawBsonRef::Int32(a), Node::Int(b)) => a == *b,
        (RawBsonRef::Int64(a), Node::Long(b)) => a == *b,
        (RawBsonRef::String(a), Node::Str(b)) => a == b.as_str(),
        (RawBsonRef::Boolean(a), Node::Bool(b)) => a == *b,
        (RawBsonRef::Null, Node::Null) => true,
        (RawBsonRef::Document(doc), Node::Doc(fields)) => doc_matches(doc, fields),
        (RawBsonRef::Array(arr), Node::Arr(items)) => {
            let elems: Vec<_> = arr.as_doc().iter().collect();
            elems.len() == items.len()
                && elems.into_iter().zip(items).enumerate().all(|(i, (elem, item))| {
                    elem.is_ok_and(|elem| {
                        elem.key() == i.to_string()
                            && elem.value().is_ok_and(|value| value_matches(value, item))
                    })
                })
        }
        _ => false,
    }
}

fn doc_matches(doc: &RawDocument, fields: &[(String, Node)]) -> bool {
    let elems: Vec<_> = doc.iter().collect();
    elems.len() == fields.len()
        && elems.into_iter().zip(fields).all(|(elem, (key, node))| {
            elem.is_ok_and(|elem| {
                elem.key() == key.as_str()
                    && elem.value().is_ok_and(|value| value_matches(value, node))
            })
        })
}

proptest! {
    #[test]
    fn nested_writes_read_back(fields in prop::collection::vec(("[^\0]{0,8}", arbitrary_node()), 0..8)) {
        let mut builder = RawBuilder::new_document();
        for (key, value) in &fields {
            builder.key_owned(key.clone()).unwrap();
            write(&mut builder, value).unwrap();
        }
        prop_assert_eq!(builder.depth(), 0);
        prop_assert!(builder.is_viewable());

        let doc = builder.view_document().unwrap();
        prop_assert!(RawDocument::from_bytes(doc.as_bytes()).is_ok());
        prop_assert!(doc_matches(doc, &fields));
    }

    #[test]
    fn array_root_is_densely_indexed(items in prop::collection::vec(arbitrary_node(), 0..16)) {
        let mut builder = RawBuilder::new_array();
        for item in &items {
            write(&mut builder, item).unwrap();
        }
        let arr = builder.extract_array().unwrap();
        prop_assert!(value_matches(RawBsonRef::Array(&arr), &Node::Arr(items)));
    }

    #[test]
    fn no_crashes_on_arbitrary_bytes(bytes: Vec<u8>) {
        if let Ok(doc) = RawDocument::from_bytes(&bytes) {
            for elem in doc.iter().flatten() {
                let _ = elem.value();
            }
        }
    }

    #[test]
    fn concatenated_array_is_densely_indexed(
        prefix in 0usize..4,
        fields in prop::collection::vec(("[^\0]{0,8}", any::<i32>()), 0..8),
    ) {
        let mut src = RawBuilder::new_document();
        for (key, value) in &fields {
            src.key_view(key).unwrap();
            src.append(*value).unwrap();
        }
        let src = src.extract_document().unwrap();

        let mut builder = RawBuilder::new_array();
        for _ in 0..prefix {
            builder.append_null().unwrap();
        }
        builder.concatenate(&src).unwrap();

        let arr = builder.view_array().unwrap();
        let keys: Vec<String> = arr.as_doc().iter().map(|e| e.unwrap().key().to_string()).collect();
        let expected: Vec<String> = (0..prefix + fields.len()).map(|i| i.to_string()).collect();
        prop_assert_eq!(keys, expected);
    }
}
