//! Incremental construction of raw BSON documents and arrays.
//!
//! [`RawBuilder`] is a stack-based state machine: a caller sets keys, appends values, opens and
//! closes nested scopes and splices in other documents, one call at a time, then borrows a view
//! of the finished root or takes ownership of it. Each call either succeeds completely or fails
//! without changing anything.
//!
//! ```
//! use bson_builder::RawBuilder;
//!
//! // {"a": [1, 2, {"b": 3}]}
//! let mut builder = RawBuilder::new_document();
//! builder.key_view("a")?;
//! builder.open_array()?;
//! builder.append(1)?;
//! builder.append(2)?;
//! builder.open_document()?;
//! builder.key_view("b")?;
//! builder.append(3)?;
//! builder.close_document()?;
//! builder.close_array()?;
//!
//! let doc = builder.extract_document()?;
//! let a = doc.get("a")?.unwrap().value()?.as_array().unwrap();
//! assert_eq!(a.get(1)?.and_then(|v| v.as_i32()), Some(2));
//! # Ok::<(), bson_builder::error::Error>(())
//! ```
//!
//! The [`basic`] module wraps the same machinery in closure-based document and array builders.

pub mod basic;
mod raw_builder;

pub use self::raw_builder::{KeyRef, RawBuilder};
pub use crate::encoder::ScopeKind;
