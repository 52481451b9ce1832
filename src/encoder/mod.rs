//! The Value Encoder Registry (§4.1): maps a runtime [`Value`] to one or
//! more [`ParameterSlot`]s, preferring the fast built-in path over the
//! user-extensible adapter path.

mod array;
mod bool_;
mod bytes;
mod float;
mod int;
mod text;

use crate::adapter::{Adapted, GetRaw, OidHint};
use crate::conn_context::ConnContext;
use crate::error::Error;
use crate::oid::Oid;
use crate::param_buffer::ParameterBuffer;
use crate::type_info::PgValueFormat;
use crate::value::Value;

/// What `encode` did with a placeholder (§4.1 contract).
pub enum EncodeOutcome {
    /// A single slot was appended; the rewriter emits one `$N`.
    Bound,
    /// `len` slots were appended (this call's slot plus `len - 1` more);
    /// the rewriter splices `snippet` in place of the placeholder instead
    /// of a single `$N`.
    InlineExpansion { len: usize, snippet: String },
    /// This template cannot be safely bound; switch to textual fallback.
    Refused,
}

/// Encode `value` into zero or more slots appended to `params`.
///
/// Resolution order (§4.1):
/// 1. exact-type match against the closed [`Value`] variants (the fast
///    path);
/// 2. (reserved for predicate-keyed fast-path entries — none of the
///    built-ins need one, so this core has none registered);
/// 3. the [`crate::adapter::AdapterMap`] ancestry-walk fallback, against
///    the "raw typed form" protocol, for [`Value::Other`].
pub fn encode(
    value: &Value,
    ctx: &ConnContext,
    params: &mut ParameterBuffer,
) -> Result<EncodeOutcome, Error> {
    match value {
        Value::Null => {
            params.append_slot(crate::param_buffer::ParameterSlot::null());
            Ok(EncodeOutcome::Bound)
        }
        Value::Bool(v) => {
            bool_::encode(*v, params);
            Ok(EncodeOutcome::Bound)
        }
        Value::Int4(v) => {
            int::encode_i32(*v, params);
            Ok(EncodeOutcome::Bound)
        }
        Value::Int8(v) => {
            int::encode_i64(*v, params);
            Ok(EncodeOutcome::Bound)
        }
        Value::Float8(v) => {
            float::encode(*v, params);
            Ok(EncodeOutcome::Bound)
        }
        Value::Bytes(v) => {
            bytes::encode(v.clone(), params);
            Ok(EncodeOutcome::Bound)
        }
        Value::Text(v) => {
            text::encode(v, ctx, params)?;
            Ok(EncodeOutcome::Bound)
        }
        Value::Array(items) => array::encode_array(items, ctx, params),
        Value::Tuple(_) => {
            // §4.1 built-in encoder table: tuples are always refused.
            Ok(EncodeOutcome::Refused)
        }
        Value::Other(adapted) => encode_adapted(adapted, ctx, params),
    }
}

/// Resolution step 3: recurse through the adapter microprotocol for a
/// value that is not one of the closed built-in kinds.
fn encode_adapted(
    adapted: &Adapted,
    ctx: &ConnContext,
    params: &mut ParameterBuffer,
) -> Result<EncodeOutcome, Error> {
    adapted.adapter.prepare(ctx);

    let produced = match adapted.adapter.get_raw(ctx) {
        GetRaw::Unimplemented => return Ok(EncodeOutcome::Refused),
        GetRaw::Value(v) => v,
    };

    if let Value::Other(inner) = &produced {
        if adapted.same_underlying_value(inner) {
            return Err(Error::ty(
                "adapter's get_raw() returned the same value unchanged; cannot make progress",
            ));
        }
    }

    let before = params.len();
    let outcome = encode(&produced, ctx, params)?;

    if let EncodeOutcome::Bound = outcome {
        apply_oid_hint(adapted, ctx, params, before);
    }

    Ok(outcome)
}

fn apply_oid_hint(adapted: &Adapted, ctx: &ConnContext, params: &mut ParameterBuffer, slot_index: usize) {
    match adapted.adapter.get_raw_oid(ctx) {
        OidHint::Infer => {
            // Only legal in combination with a text-format slot (§4.1
            // resolution step 3); binary slots keep their produced OID.
            let is_text = params
                .iter()
                .nth(slot_index)
                .map_or(false, |slot| slot.format == PgValueFormat::Text);
            if is_text {
                force_oid(params, slot_index, Oid::UNSPECIFIED);
            }
        }
        OidHint::AsProduced => {}
        OidHint::Use(oid) => force_oid(params, slot_index, oid),
    }
}

fn force_oid(params: &mut ParameterBuffer, slot_index: usize, oid: Oid) {
    // `ParameterBuffer` doesn't expose direct mutable slot access by
    // design (slots are meant to be appended once); this helper is the one
    // place that reaches past that to patch an OID after the fact.
    if let Some(slot) = params.slot_mut(slot_index) {
        slot.type_oid = oid;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid::Oid;

    #[test]
    fn null_binds_a_single_empty_slot() {
        let mut params = ParameterBuffer::new();
        let ctx = ConnContext::default();
        let outcome = encode(&Value::Null, &ctx, &mut params).unwrap();
        assert!(matches!(outcome, EncodeOutcome::Bound));
        assert_eq!(params.len(), 1);
        assert_eq!(params.iter().next().unwrap().length(), 0);
    }

    #[test]
    fn tuple_is_always_refused() {
        let mut params = ParameterBuffer::new();
        let ctx = ConnContext::default();
        let outcome = encode(&Value::Tuple(vec![Value::Int4(1)]), &ctx, &mut params).unwrap();
        assert!(matches!(outcome, EncodeOutcome::Refused));
        assert_eq!(params.len(), 0);
    }

    #[test]
    fn int4_binds_big_endian_bytes() {
        let mut params = ParameterBuffer::new();
        let ctx = ConnContext::default();
        encode(&Value::Int4(7), &ctx, &mut params).unwrap();
        let slot = params.iter().next().unwrap();
        assert_eq!(slot.type_oid, Oid::INT4);
        assert_eq!(slot.as_bytes().unwrap(), &[0, 0, 0, 7]);
    }
}
