// The MIT License (MIT)

// Copyright (c) 2015 Y. T. Chung <zonyitoo@gmail.com>

// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:

// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.

// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! BSON is a binary format in which zero or more key/value pairs are stored as a single entity.
//! We call this entity a document.
//!
//! This library builds BSON documents and arrays incrementally, straight into their encoded
//! form. It supports version 1.1 of the [BSON standard](http://bsonspec.org/spec.html).
//!
//! ## Basic usage
//!
//! A [`RawBuilder`] accepts one operation at a time: set a key, append a value, open or close a
//! nested scope, or splice in another document. Once every scope is closed, the root can be
//! borrowed as a [`RawDocument`] or taken as a [`RawDocumentBuf`].
//!
//! ```rust
//! use bson_builder::{RawBuilder, raw::RawDocument};
//!
//! let mut builder = RawBuilder::new_document();
//! builder.key_view("hi")?;
//! builder.append("y'all")?;
//!
//! let doc: &RawDocument = builder.view_document()?;
//! assert_eq!(
//!     doc.as_bytes(),
//!     b"\x13\x00\x00\x00\x02hi\x00\x06\x00\x00\x00y'all\x00\x00"
//! );
//! # Ok::<(), bson_builder::error::Error>(())
//! ```
//!
//! Builders are reusable. Extracting the root hands its bytes over and leaves an empty root of
//! the same kind behind:
//!
//! ```rust
//! use bson_builder::RawBuilder;
//!
//! let mut builder = RawBuilder::new_document();
//! for i in 0..3 {
//!     builder.key_owned(format!("n{i}"))?;
//!     builder.append(i)?;
//!     let doc = builder.extract_document()?;
//!     assert_eq!(doc.iter().count(), 1);
//! }
//! # Ok::<(), bson_builder::error::Error>(())
//! ```
//!
//! For closure-based construction see [`builder::basic`].
//!
//! ## Logging
//!
//! Scope changes, extraction and clearing are reported through [`tracing`] at `trace` level;
//! writes the encoder refuses are reported at `debug` level. No subscriber is installed.
//!
//! ## Features
//!
//! | Feature | Description |
//! |:--------|:------------|
//! | `serde` | `Serialize`/`Deserialize` for [`oid::ObjectId`], [`RawDocumentBuf`] and [`RawArrayBuf`] |

#![cfg_attr(docsrs, feature(doc_cfg))]

pub use self::{
    builder::{KeyRef, RawBuilder, ScopeKind},
    datetime::DateTime,
    decimal128::Decimal128,
    encoder::EncoderOptions,
    raw::{
        RawArray,
        RawArrayBuf,
        RawBinaryRef,
        RawBsonRef,
        RawDbPointerRef,
        RawDocument,
        RawDocumentBuf,
        RawJavaScriptCodeWithScopeRef,
        RawRegexRef,
    },
    timestamp::Timestamp,
};

pub mod builder;
mod datetime;
mod decimal128;
pub mod encoder;
pub mod error;
pub mod oid;
pub mod raw;
pub mod spec;
mod timestamp;
