use crate::{
    DateTime,
    Decimal128,
    Timestamp,
    error::{Error, Result},
    oid::ObjectId,
    spec::{BinarySubtype, ElementType},
};

use super::{
    MIN_BSON_DOCUMENT_SIZE,
    MIN_CODE_WITH_SCOPE_SIZE,
    RawArray,
    RawBinaryRef,
    RawBsonRef,
    RawDbPointerRef,
    RawDocument,
    RawJavaScriptCodeWithScopeRef,
    RawRegexRef,
    bool_from_slice,
    checked_add,
    f64_from_slice,
    i32_from_slice,
    i64_from_slice,
    read_len,
    read_lenencoded,
    read_nullterminated,
};

/// An iterator over the document's elements.
///
/// Each element borrows its key and its encoded value bytes from the document; values are only
/// parsed when [`RawElement::value`] is called.
pub struct RawIter<'a> {
    doc: &'a RawDocument,
    offset: usize,

    /// Whether the underlying doc is assumed to be valid or if an error has been encountered.
    /// After an error, all subsequent iterations will return None.
    valid: bool,
}

impl<'a> RawIter<'a> {
    pub(crate) fn new(doc: &'a RawDocument) -> Self {
        Self {
            doc,
            offset: 4,
            valid: true,
        }
    }

    fn verify_enough_bytes(&self, start: usize, num_bytes: usize) -> Result<()> {
        let end = checked_add(start, num_bytes)?;
        if self.doc.as_bytes().get(start..end).is_none() {
            return Err(Error::malformed_bytes(format!(
                "length exceeds remaining length of buffer: {} vs {}",
                num_bytes,
                self.doc.as_bytes().len().saturating_sub(start)
            )));
        }
        Ok(())
    }

    fn next_document_len(&self, starting_at: usize) -> Result<usize> {
        self.verify_enough_bytes(starting_at, MIN_BSON_DOCUMENT_SIZE as usize)?;
        let size = i32_from_slice(&self.doc.as_bytes()[starting_at..])?;

        if size < MIN_BSON_DOCUMENT_SIZE {
            return Err(Error::malformed_bytes(format!(
                "document too small: {} bytes",
                size
            )));
        }

        Ok(size as usize)
    }

    /// Computes the length in bytes of the value of the given type starting at `valueoffset`.
    fn value_len(&self, element_type: ElementType, valueoffset: usize) -> Result<usize> {
        let bytes = &self.doc.as_bytes()[valueoffset..];
        Ok(match element_type {
            ElementType::Int32 => 4,
            ElementType::Int64 | ElementType::Double | ElementType::DateTime => 8,
            ElementType::Timestamp => 8,
            ElementType::ObjectId => 12,
            ElementType::Decimal128 => 16,
            ElementType::Boolean => 1,
            ElementType::Null
            | ElementType::Undefined
            | ElementType::MinKey
            | ElementType::MaxKey => 0,
            ElementType::String | ElementType::JavaScriptCode | ElementType::Symbol => {
                read_len(bytes)?
            }
            ElementType::EmbeddedDocument | ElementType::Array => {
                self.next_document_len(valueoffset)?
            }
            ElementType::Binary => {
                let len = i32_from_slice(bytes)?;
                if len < 0 {
                    return Err(Error::malformed_bytes(format!(
                        "binary length must be non-negative: {}",
                        len
                    )));
                }
                checked_add(4 + 1, len as usize)?
            }
            ElementType::RegularExpression => {
                let pattern = read_nullterminated(bytes)?;
                let options = read_nullterminated(&bytes[pattern.len() + 1..])?;
                pattern.len() + 1 + options.len() + 1
            }
            ElementType::DbPointer => read_len(bytes)? + 12,
            ElementType::JavaScriptCodeWithScope => {
                let length = i32_from_slice(bytes)?;
                if length < MIN_CODE_WITH_SCOPE_SIZE {
                    return Err(Error::malformed_bytes("code with scope length too small"));
                }
                length as usize
            }
        })
    }
}

impl<'a> Iterator for RawIter<'a> {
    type Item = Result<RawElement<'a>>;

    fn next(&mut self) -> Option<Result<RawElement<'a>>> {
        if !self.valid {
            return None;
        } else if self.offset == self.doc.as_bytes().len() - 1 {
            if self.doc.as_bytes()[self.offset] == 0 {
                // end of document marker
                return None;
            } else {
                self.valid = false;
                return Some(Err(Error::malformed_bytes("document not null terminated")));
            }
        } else if self.offset >= self.doc.as_bytes().len() {
            self.valid = false;
            return Some(Err(Error::malformed_bytes("iteration overflowed document")));
        }

        let key = match read_nullterminated(&self.doc.as_bytes()[self.offset + 1..]) {
            Ok(k) => k,
            Err(e) => {
                self.valid = false;
                return Some(Err(e));
            }
        };

        let kvp_result = (|| {
            let tag = self.doc.as_bytes()[self.offset];
            let element_type = ElementType::from(tag)
                .ok_or_else(|| Error::malformed_bytes(format!("invalid tag: {}", tag)))?;

            let valueoffset = self.offset + 1 + key.len() + 1; // type specifier + key + \0
            let len = self.value_len(element_type, valueoffset)?;
            self.verify_enough_bytes(valueoffset, len)?;

            self.offset = valueoffset + len;
            Ok(RawElement {
                key,
                kind: element_type,
                data: &self.doc.as_bytes()[valueoffset..valueoffset + len],
            })
        })()
        .map_err(|e: Error| e.with_key(key));

        if kvp_result.is_err() {
            self.valid = false;
        }

        Some(kvp_result)
    }
}

/// A single element of a raw document: its key, type, and the encoded bytes of its value.
#[derive(Clone, Copy)]
pub struct RawElement<'a> {
    key: &'a str,
    kind: ElementType,
    data: &'a [u8],
}

impl<'a> RawElement<'a> {
    /// The element's key.
    pub fn key(&self) -> &'a str {
        self.key
    }

    /// The type of the element's value.
    pub fn element_type(&self) -> ElementType {
        self.kind
    }

    /// The encoded bytes of the element's value, excluding the type byte and the key.
    pub fn value_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Parses the element's value.
    pub fn value(&self) -> Result<RawBsonRef<'a>> {
        let data = self.data;
        Ok(match self.kind {
            ElementType::Null => RawBsonRef::Null,
            ElementType::Undefined => RawBsonRef::Undefined,
            ElementType::MinKey => RawBsonRef::MinKey,
            ElementType::MaxKey => RawBsonRef::MaxKey,
            ElementType::Int32 => RawBsonRef::Int32(i32_from_slice(data)?),
            ElementType::Int64 => RawBsonRef::Int64(i64_from_slice(data)?),
            ElementType::Double => RawBsonRef::Double(f64_from_slice(data)?),
            ElementType::Boolean => RawBsonRef::Boolean(bool_from_slice(data)?),
            ElementType::DateTime => RawBsonRef::DateTime(DateTime::from_millis(i64_from_slice(data)?)),
            ElementType::String => RawBsonRef::String(read_lenencoded(data)?),
            ElementType::JavaScriptCode => RawBsonRef::JavaScriptCode(read_lenencoded(data)?),
            ElementType::Symbol => RawBsonRef::Symbol(read_lenencoded(data)?),
            ElementType::EmbeddedDocument => RawBsonRef::Document(RawDocument::from_bytes(data)?),
            ElementType::Array => RawBsonRef::Array(RawArray::from_doc(RawDocument::from_bytes(data)?)),
            ElementType::ObjectId => RawBsonRef::ObjectId(ObjectId::from_bytes(self.fixed(data)?)),
            ElementType::Decimal128 => RawBsonRef::Decimal128(Decimal128::from_bytes(self.fixed(data)?)),
            ElementType::Timestamp => RawBsonRef::Timestamp(Timestamp::from_le_bytes(self.fixed(data)?)),
            ElementType::Binary => {
                let len = i32_from_slice(data)? as usize;
                let subtype = BinarySubtype::from(data[4]);
                let bytes = match subtype {
                    BinarySubtype::BinaryOld => {
                        if len < 4 {
                            return Err(Error::malformed_bytes(
                                "old binary subtype has no inner declared length",
                            ));
                        }
                        let oldlength = i32_from_slice(&data[5..])? as usize;
                        if checked_add(oldlength, 4)? != len {
                            return Err(Error::malformed_bytes(
                                "old binary subtype has wrong inner declared length",
                            ));
                        }
                        &data[9..]
                    }
                    _ => &data[5..],
                };
                RawBsonRef::Binary(RawBinaryRef { subtype, bytes })
            }
            ElementType::RegularExpression => {
                let pattern = read_nullterminated(data)?;
                let options = read_nullterminated(&data[pattern.len() + 1..])?;
                RawBsonRef::RegularExpression(RawRegexRef { pattern, options })
            }
            ElementType::DbPointer => {
                let namespace = read_lenencoded(data)?;
                let id = ObjectId::from_bytes(self.fixed(&data[4 + namespace.len() + 1..])?);
                RawBsonRef::DbPointer(RawDbPointerRef { namespace, id })
            }
            ElementType::JavaScriptCodeWithScope => {
                let code = read_lenencoded(&data[4..])?;
                let scope_start = 4 + 4 + code.len() + 1;
                let scope = RawDocument::from_bytes(&data[scope_start..])?;
                RawBsonRef::JavaScriptCodeWithScope(RawJavaScriptCodeWithScopeRef { code, scope })
            }
        })
    }

    fn fixed<const N: usize>(&self, data: &[u8]) -> Result<[u8; N]> {
        data.get(..N)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| {
                Error::malformed_bytes(format!(
                    "expected {} bytes to read {}, instead got {}",
                    N,
                    self.kind,
                    data.len()
                ))
            })
    }
}

impl std::fmt::Debug for RawElement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawElement")
            .field("key", &self.key)
            .field("element_type", &self.kind)
            .field("data", &hex::encode(self.data))
            .finish()
    }
}
