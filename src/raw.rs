//! Raw BSON containers produced by the builder.
//!
//! This module provides two document types, [`RawDocumentBuf`] and [`&RawDocument`](RawDocument)
//! (an owned buffer and a reference respectively, akin to [`String`] and [`&str`](str)), and the
//! matching array types [`RawArrayBuf`] and [`&RawArray`](RawArray). Their storage is the encoded
//! BSON bytes themselves; a [`RawBuilder`](crate::RawBuilder) hands out the reference types as
//! views and the owned types on extraction.
//!
//! ```rust
//! use bson_builder::raw::RawDocument;
//!
//! // See http://bsonspec.org/spec.html for details on the binary encoding of BSON.
//! let doc = RawDocument::from_bytes(b"\x13\x00\x00\x00\x02hi\x00\x06\x00\x00\x00y'all\x00\x00")?;
//! let elem = doc.get("hi")?.unwrap();
//!
//! assert_eq!(elem.value()?.as_str(), Some("y'all"));
//! # Ok::<(), bson_builder::error::Error>(())
//! ```
//!
//! ### Iteration
//!
//! Iterating a [`RawDocument`] yields [`RawElement`]s, which borrow the key and the encoded
//! value bytes without parsing the value. [`RawElement::value`] parses the value into a
//! [`RawBsonRef`] on demand.

mod array;
mod array_buf;
mod bson_ref;
mod document;
mod document_buf;
mod iter;

use crate::error::{Error, ErrorKind, Result};

pub use self::{
    array::{RawArray, RawArrayIter},
    array_buf::RawArrayBuf,
    bson_ref::{
        RawBinaryRef,
        RawBsonRef,
        RawDbPointerRef,
        RawJavaScriptCodeWithScopeRef,
        RawRegexRef,
    },
    document::RawDocument,
    document_buf::RawDocumentBuf,
    iter::{RawElement, RawIter},
};

pub(crate) const MIN_BSON_STRING_SIZE: i32 = 4 + 1; // 4 bytes for length, one byte for null terminator
pub(crate) const MIN_BSON_DOCUMENT_SIZE: i32 = 4 + 1; // 4 bytes for length, one byte for null terminator
pub(crate) const MIN_CODE_WITH_SCOPE_SIZE: i32 = 4 + MIN_BSON_STRING_SIZE + MIN_BSON_DOCUMENT_SIZE;

/// The bytes of an empty document (and of an empty array).
pub(crate) const EMPTY_DOCUMENT: [u8; 5] = [5, 0, 0, 0, 0];

/// Given a u8 slice, return an i32 calculated from the first four bytes in
/// little endian order.
fn i32_from_slice(val: &[u8]) -> Result<i32> {
    let arr: [u8; 4] = val
        .get(0..4)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| {
            Error::malformed_bytes(format!(
                "expected 4 bytes to read i32, instead got {}",
                val.len()
            ))
        })?;
    Ok(i32::from_le_bytes(arr))
}

/// Given an u8 slice, return an i64 calculated from the first 8 bytes in
/// little endian order.
fn i64_from_slice(val: &[u8]) -> Result<i64> {
    let arr = val
        .get(0..8)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| {
            Error::malformed_bytes(format!(
                "expected 8 bytes to read i64, instead got {}",
                val.len()
            ))
        })?;
    Ok(i64::from_le_bytes(arr))
}

fn f64_from_slice(val: &[u8]) -> Result<f64> {
    let arr = val
        .get(0..8)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| {
            Error::malformed_bytes(format!(
                "expected 8 bytes to read double, instead got {}",
                val.len()
            ))
        })?;
    Ok(f64::from_le_bytes(arr))
}

fn bool_from_slice(val: &[u8]) -> Result<bool> {
    match val.first() {
        Some(0) => Ok(false),
        Some(1) => Ok(true),
        Some(other) => Err(Error::malformed_bytes(format!(
            "boolean must be stored as 0 or 1, got {}",
            other
        ))),
        None => Err(Error::malformed_bytes("expected 1 byte to read bool")),
    }
}

/// Read the total byte length (prefix included) of a length-prefixed, null-terminated string.
fn read_len(buf: &[u8]) -> Result<usize> {
    let length = i32_from_slice(buf)?;
    if length < 1 {
        return Err(Error::malformed_bytes(format!(
            "BSON length encoded string needs to be at least {} bytes, instead got {}",
            MIN_BSON_STRING_SIZE,
            length + 4
        )));
    }
    let end = checked_add(length as usize, 4)?;

    if buf.len() < end {
        return Err(Error::malformed_bytes(format!(
            "expected buffer to contain at least {} bytes, but it only has {}",
            end,
            buf.len()
        )));
    }

    if buf[end - 1] != 0 {
        return Err(Error::malformed_bytes(
            "expected string to be null-terminated",
        ));
    }

    Ok(end)
}

fn read_lenencoded(buf: &[u8]) -> Result<&str> {
    let end = read_len(buf)?;
    // exclude length-prefix and null byte suffix
    try_to_str(&buf[4..(end - 1)])
}

fn read_nullterminated(buf: &[u8]) -> Result<&str> {
    let end = buf
        .iter()
        .position(|b| *b == 0)
        .ok_or_else(|| Error::malformed_bytes("expected null terminator"))?;
    try_to_str(&buf[..end])
}

fn try_to_str(data: &[u8]) -> Result<&str> {
    simdutf8::basic::from_utf8(data).map_err(|_| ErrorKind::Utf8Encoding.into())
}

fn checked_add(lhs: usize, rhs: usize) -> Result<usize> {
    lhs.checked_add(rhs)
        .ok_or_else(|| Error::malformed_bytes("attempted to add with overflow"))
}
