#![no_main]
#[macro_use]
extern crate libfuzzer_sys;
extern crate bson_builder;
use arbitrary::Arbitrary;
use bson_builder::{
    RawBuilder,
    ScopeKind,
    encoder::EncoderOptions,
    raw::RawDocumentBuf,
    spec::BinarySubtype,
};

#[derive(Arbitrary, Debug)]
enum Op {
    Key(String),
    Int(i32),
    Long(i64),
    Str(String),
    Binary(u8, Vec<u8>),
    Regex(String, String),
    Null,
    OpenDocument,
    OpenArray,
    CloseDocument,
    CloseArray,
    Concatenate,
    Extract,
    Clear,
}

#[derive(Arbitrary, Debug)]
struct Input {
    array_root: bool,
    max_size: u16,
    ops: Vec<Op>,
}

fuzz_target!(|input: Input| {
    let root = if input.array_root {
        ScopeKind::Array
    } else {
        ScopeKind::Document
    };
    let options = EncoderOptions::default().max_size(input.max_size as usize);
    let mut builder = RawBuilder::with_options(root, options);
    let mut last = RawDocumentBuf::new();

    for op in input.ops {
        let depth = builder.depth();
        let result = match op {
            Op::Key(key) => builder.key_owned(key),
            Op::Int(i) => builder.append(i),
            Op::Long(i) => builder.append(i),
            Op::Str(s) => builder.append(s.as_str()),
            Op::Binary(subtype, bytes) => {
                builder.append_binary(BinarySubtype::from(subtype), &bytes)
            }
            Op::Regex(pattern, options) => builder.append_regex(&pattern, &options),
            Op::Null => builder.append_null(),
            Op::OpenDocument => builder.open_document(),
            Op::OpenArray => builder.open_array(),
            Op::CloseDocument => builder.close_document(),
            Op::CloseArray => builder.close_array(),
            Op::Concatenate => builder.concatenate(&last),
            Op::Extract => {
                let extracted = match root {
                    ScopeKind::Document => builder.extract_document(),
                    ScopeKind::Array => builder.extract_array().map(|arr| {
                        RawDocumentBuf::from_bytes(arr.into_bytes()).unwrap()
                    }),
                };
                extracted.map(|doc| {
                    for elem in doc.iter() {
                        elem.unwrap().value().unwrap();
                    }
                    last = doc;
                })
            }
            Op::Clear => {
                builder.clear();
                Ok(())
            }
        };

        if result.is_err() {
            assert_eq!(builder.depth(), depth);
        }
    }
});
