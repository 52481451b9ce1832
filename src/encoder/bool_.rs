//! Built-in encoder for booleans (§4.1: `BOOL`, binary, single byte).

use crate::oid::Oid;
use crate::param_buffer::{ParameterBuffer, ParameterSlot};
use crate::type_info::PgValueFormat;

pub fn encode(value: bool, params: &mut ParameterBuffer) {
    params.append_slot(ParameterSlot::owned(
        Oid::BOOL,
        PgValueFormat::Binary,
        vec![value as u8],
    ));
}
