//! Built-in encoder for IEEE-754 doubles (§4.1: `FLOAT8`, binary,
//! big-endian).
//!
//! §9's design notes call out that one historical variant of this encoder
//! byte-swapped each 32-bit half of the double independently, which is
//! wrong for IEEE-754: the swap must be a single 64-bit operation. `f64`'s
//! own `to_be_bytes`/`from_be_bytes` already do this correctly, so there is
//! no hand-rolled byte-swapping here to get wrong.

use byteorder::{BigEndian, ByteOrder};

use crate::oid::Oid;
use crate::param_buffer::{ParameterBuffer, ParameterSlot};
use crate::type_info::PgValueFormat;

pub fn encode(value: f64, params: &mut ParameterBuffer) {
    let mut bytes = [0u8; 8];
    BigEndian::write_f64(&mut bytes, value);
    params.append_slot(ParameterSlot::owned(Oid::FLOAT8, PgValueFormat::Binary, bytes.to_vec()));
}
