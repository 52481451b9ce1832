//! The minimal result-row typecast contract (§6 "Result decoding"):
//! decoding is out of scope beyond what's needed for round-trip tests, so
//! this is a bare oid-keyed registry, not a full type-cast system.

use std::collections::HashMap;

use crate::error::Error;
use crate::oid::Oid;
use crate::type_info::PgValueFormat;

pub type TextTypecast = fn(&[u8]) -> Result<String, Error>;
pub type BinaryTypecast = fn(&[u8]) -> Result<Vec<u8>, Error>;

pub enum DecodedValue {
    Text(String),
    Binary(Vec<u8>),
}

/// Per-oid decode functions, keyed separately for text and binary format
/// since a column can arrive in either (§6).
#[derive(Default)]
pub struct TypecastRegistry {
    text: HashMap<Oid, TextTypecast>,
    binary: HashMap<Oid, BinaryTypecast>,
}

impl TypecastRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_text(&mut self, oid: Oid, f: TextTypecast) {
        self.text.insert(oid, f);
    }

    pub fn register_binary(&mut self, oid: Oid, f: BinaryTypecast) {
        self.binary.insert(oid, f);
    }

    /// Decode one result column. Text-format columns fall back to the raw
    /// textual representation when no typecast is registered; binary-format
    /// columns have no safe fallback, so an unregistered oid is a decode
    /// error (§6).
    pub fn decode(&self, oid: Oid, format: PgValueFormat, raw: &[u8]) -> Result<DecodedValue, Error> {
        match format {
            PgValueFormat::Binary => {
                let f = self.binary.get(&oid).ok_or_else(|| {
                    Error::ty(format!("no binary typecast registered for oid={}", oid.as_u32()))
                })?;
                Ok(DecodedValue::Binary(f(raw)?))
            }
            PgValueFormat::Text => match self.text.get(&oid) {
                Some(f) => Ok(DecodedValue::Text(f(raw)?)),
                None => Ok(DecodedValue::Text(default_textual(raw)?)),
            },
        }
    }
}

fn default_textual(raw: &[u8]) -> Result<String, Error> {
    Ok(std::str::from_utf8(raw)?.to_owned())
}
