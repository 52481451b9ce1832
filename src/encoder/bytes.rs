//! Built-in encoder for byte buffers (§4.1: `BYTEA`, binary, borrowed).

use crate::oid::Oid;
use crate::param_buffer::{ParameterBuffer, ParameterSlot};
use crate::type_info::PgValueFormat;

/// `bytes::Bytes` is reference-counted, so encoding never copies the
/// buffer; the slot holds a cheap clone of the same backing storage, which
/// is the Rust rendition of "borrowed" ownership (§3 data model).
pub fn encode(value: bytes::Bytes, params: &mut ParameterBuffer) {
    params.append_slot(ParameterSlot::borrowed(Oid::BYTEA, PgValueFormat::Binary, value));
}
