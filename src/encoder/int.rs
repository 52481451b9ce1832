//! Built-in encoders for 32- and 64-bit integers (§4.1 built-in encoder
//! table: `INT4`/`INT8`, binary, big-endian, owned).

use byteorder::{BigEndian, ByteOrder};

use crate::oid::Oid;
use crate::param_buffer::{ParameterBuffer, ParameterSlot};
use crate::type_info::PgValueFormat;

pub fn encode_i32(value: i32, params: &mut ParameterBuffer) {
    let mut bytes = [0u8; 4];
    BigEndian::write_i32(&mut bytes, value);
    params.append_slot(ParameterSlot::owned(Oid::INT4, PgValueFormat::Binary, bytes.to_vec()));
}

pub fn encode_i64(value: i64, params: &mut ParameterBuffer) {
    let mut bytes = [0u8; 8];
    BigEndian::write_i64(&mut bytes, value);
    params.append_slot(ParameterSlot::owned(Oid::INT8, PgValueFormat::Binary, bytes.to_vec()));
}
