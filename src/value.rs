//! The dynamic runtime value passed in as a bind parameter.
//!
//! A query template's `vars` carries values of heterogeneous runtime type —
//! the caller builds a positional sequence or a named mapping of them. The
//! built-in kinds are represented as a closed enum (dispatched by a single
//! `match`, rather than a `TypeId`-keyed table) exactly as described for the
//! fast path in §4.1's "additional detail"; anything else is boxed behind
//! the [`crate::adapter::ToSql`] microprotocol.

use bytes::Bytes;

use crate::adapter::Adapted;

/// A single parameter value of arbitrary runtime type.
#[derive(Clone)]
pub enum Value {
    /// SQL `NULL`.
    Null,
    Bool(bool),
    Int4(i32),
    Int8(i64),
    Float8(f64),
    /// Any textual value; re-encoded into the connection's client codec
    /// before it is sent (§4.1 "Encoded text").
    Text(String),
    Bytes(Bytes),
    /// A homogeneous one-dimensional array (§4.1.1). Element-type
    /// homogeneity is enforced by the array encoder, not by this type.
    Array(Vec<Value>),
    /// A tuple; the array encoder never accepts these, and encoding a
    /// tuple always refuses per §4.1's built-in encoder table.
    Tuple(Vec<Value>),
    /// A value whose type is not one of the built-ins; dispatched through
    /// the adapter it carries.
    Other(Adapted),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int4(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int8(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float8(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(Bytes::from(v))
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl<T> From<Vec<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}
