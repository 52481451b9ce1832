//! Built-in encoders for textual values (§4.1: "Text string" and "Encoded
//! text").
//!
//! The distilled table lists these as two distinct built-ins: a plain
//! passthrough for values that are already in the connection's codec, and
//! a re-encoding path for values that need transcoding into a non-UTF-8
//! client encoding. Both produce `VARCHAR`; only the re-encoding path pays
//! for a conversion.

use bytes::Bytes;

use crate::conn_context::ConnContext;
use crate::error::Error;
use crate::oid::Oid;
use crate::param_buffer::{ParameterBuffer, ParameterSlot};
use crate::type_info::PgValueFormat;

pub fn encode(value: &str, ctx: &ConnContext, params: &mut ParameterBuffer) -> Result<(), Error> {
    if ctx.client_encoding == encoding_rs::UTF_8 {
        // "Text string": the connection's codec already matches Rust's
        // native string encoding, so this is a plain passthrough.
        params.append_slot(ParameterSlot::borrowed(
            Oid::VARCHAR,
            PgValueFormat::Text,
            Bytes::copy_from_slice(value.as_bytes()),
        ));
        return Ok(());
    }

    // "Encoded text": re-encode into the connection's declared codec.
    let (encoded, _, had_unmappable) = ctx.client_encoding.encode(value);
    if had_unmappable {
        return Err(Error::interface(format!(
            "value contains characters that cannot be represented in {}",
            ctx.client_encoding.name()
        )));
    }

    params.append_slot(ParameterSlot::owned(
        Oid::VARCHAR,
        PgValueFormat::Binary,
        encoded.into_owned(),
    ));

    Ok(())
}
