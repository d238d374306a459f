#![no_main]
#[macro_use]
extern crate libfuzzer_sys;
extern crate bson_builder;
use bson_builder::{RawBuilder, raw::RawDocument};

fuzz_target!(|buf: &[u8]| {
    if let Ok(doc) = RawDocument::from_bytes(buf) {
        for elem in doc.iter().flatten() {
            let _ = elem.value();
        }

        // whatever parses must splice cleanly into an array, or be rejected whole
        let mut builder = RawBuilder::new_array();
        if builder.concatenate(doc).is_err() {
            assert!(builder.view_array().unwrap().is_empty());
        }
    }
});
