//! Built-in encoder for one-dimensional arrays (§4.1.1).
//!
//! Every element is encoded independently through the same registry
//! (`encoder::encode`), then assembled into a single binary slot using
//! PostgreSQL's array wire format. Elements must agree on one non-null
//! `type_oid` and must all land in binary format; anything else is a type
//! error rather than a silent fallback, since the array shape itself is
//! already committed to the binary path by the time this runs.

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

use crate::conn_context::ConnContext;
use crate::error::Error;
use crate::oid::Oid;
use crate::param_buffer::{ParameterBuffer, ParameterSlot};
use crate::type_info::PgValueFormat;
use crate::value::Value;

use super::{encode, EncodeOutcome};

pub fn encode_array(
    items: &[Value],
    ctx: &ConnContext,
    params: &mut ParameterBuffer,
) -> Result<EncodeOutcome, Error> {
    let mut element_oid = Oid::UNSPECIFIED;
    let mut has_nulls = false;
    let mut elements: Vec<Option<Vec<u8>>> = Vec::with_capacity(items.len());

    for item in items {
        if matches!(item, Value::Array(_) | Value::Tuple(_) | Value::Other(_)) {
            // Nested arrays, tuples, and adapted values are out of scope
            // for this core's array encoder (§4.1.1 non-goals).
            return Ok(EncodeOutcome::Refused);
        }

        let mut scratch = ParameterBuffer::new();
        match encode(item, ctx, &mut scratch)? {
            EncodeOutcome::Bound => {}
            EncodeOutcome::InlineExpansion { .. } | EncodeOutcome::Refused => {
                return Ok(EncodeOutcome::Refused)
            }
        }

        let slot = scratch.iter().next().expect("encode() appended exactly one slot");

        if slot.is_null() {
            has_nulls = true;
            elements.push(None);
            continue;
        }

        // Character-string types have no separate binary wire encoding in
        // PostgreSQL: the bytes are the same whether the slot is tagged
        // text or binary, so a `VARCHAR`/`TEXT` element is reused as-is
        // rather than rejected as "not binary".
        let is_text_type = slot.type_oid == Oid::VARCHAR || slot.type_oid == Oid::TEXT;
        if slot.format != PgValueFormat::Binary && !is_text_type {
            return Err(Error::ty(
                "array elements must encode to binary format; a text-only element was produced",
            ));
        }

        if element_oid == Oid::UNSPECIFIED {
            element_oid = slot.type_oid;
        } else if slot.type_oid != element_oid {
            return Err(Error::ty(format!(
                "array elements must share one type; found both oid={} and oid={}",
                element_oid.as_u32(),
                slot.type_oid.as_u32()
            )));
        }

        elements.push(Some(slot.as_bytes().expect("non-null slot has bytes").to_vec()));
    }

    if element_oid == Oid::UNSPECIFIED {
        // Every element was null (or the array was empty); nothing pins
        // down an element type, so this cannot be bound as a typed array.
        return Ok(EncodeOutcome::Refused);
    }

    let array_oid = Oid::array_oid_for_element(element_oid).ok_or_else(|| {
        Error::ty(format!(
            "no array type is known for element oid={}",
            element_oid.as_u32()
        ))
    })?;

    let mut wire = Vec::new();
    wire.write_i32::<BigEndian>(1).expect("writing to a Vec never fails"); // ndims
    wire.write_i32::<BigEndian>(has_nulls as i32).expect("writing to a Vec never fails");
    wire.write_u32::<BigEndian>(element_oid.as_u32()).expect("writing to a Vec never fails");
    wire.write_i32::<BigEndian>(elements.len() as i32).expect("writing to a Vec never fails");
    wire.write_i32::<BigEndian>(0).expect("writing to a Vec never fails"); // lbound

    for element in &elements {
        match element {
            None => wire.write_i32::<BigEndian>(-1).expect("writing to a Vec never fails"),
            Some(bytes) => {
                wire.write_i32::<BigEndian>(bytes.len() as i32)
                    .expect("writing to a Vec never fails");
                wire.extend_from_slice(bytes);
            }
        }
    }

    params.append_slot(ParameterSlot::owned(array_oid, PgValueFormat::Binary, wire));
    Ok(EncodeOutcome::Bound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int4_array_round_trips_through_the_wire_layout() {
        let ctx = ConnContext::default();
        let mut params = ParameterBuffer::new();
        let outcome = encode_array(
            &[Value::Int4(1), Value::Int4(2), Value::Int4(3)],
            &ctx,
            &mut params,
        )
        .unwrap();
        assert!(matches!(outcome, EncodeOutcome::Bound));

        let slot = params.iter().next().unwrap();
        assert_eq!(slot.type_oid, Oid::INT4_ARRAY);
        let bytes = slot.as_bytes().unwrap();
        assert_eq!(BigEndian::read_i32(&bytes[0..4]), 1); // ndims
        assert_eq!(BigEndian::read_i32(&bytes[4..8]), 0); // has_nulls
        assert_eq!(BigEndian::read_u32(&bytes[8..12]), Oid::INT4.as_u32());
        assert_eq!(BigEndian::read_i32(&bytes[12..16]), 3); // dim
        assert_eq!(BigEndian::read_i32(&bytes[16..20]), 0); // lbound
        assert_eq!(BigEndian::read_i32(&bytes[20..24]), 4); // first element length
        assert_eq!(BigEndian::read_i32(&bytes[24..28]), 1); // first element value
    }

    #[test]
    fn null_elements_set_the_has_nulls_flag_and_use_length_minus_one() {
        let ctx = ConnContext::default();
        let mut params = ParameterBuffer::new();
        encode_array(&[Value::Int4(1), Value::Null], &ctx, &mut params).unwrap();
        let slot = params.iter().next().unwrap();
        let bytes = slot.as_bytes().unwrap();
        assert_eq!(BigEndian::read_i32(&bytes[4..8]), 1); // has_nulls
        assert_eq!(BigEndian::read_i32(&bytes[24..28]), -1); // second element is NULL
    }

    #[test]
    fn mixed_element_types_are_a_type_error() {
        let ctx = ConnContext::default();
        let mut params = ParameterBuffer::new();
        let err = encode_array(&[Value::Int4(1), Value::Bool(true)], &ctx, &mut params).unwrap_err();
        assert!(matches!(err, Error::Type(_)));
    }

    #[test]
    fn text_array_reuses_the_text_format_bytes() {
        let ctx = ConnContext::default();
        let mut params = ParameterBuffer::new();
        let outcome =
            encode_array(&[Value::Text("a".into()), Value::Text("b".into())], &ctx, &mut params).unwrap();
        assert!(matches!(outcome, EncodeOutcome::Bound));
        let slot = params.iter().next().unwrap();
        assert_eq!(slot.type_oid, Oid::VARCHAR_ARRAY);
        let bytes = slot.as_bytes().unwrap();
        assert_eq!(BigEndian::read_u32(&bytes[8..12]), Oid::VARCHAR.as_u32());
        assert_eq!(BigEndian::read_i32(&bytes[20..24]), 1); // "a" has length 1
    }

    #[test]
    fn all_null_array_is_refused() {
        let ctx = ConnContext::default();
        let mut params = ParameterBuffer::new();
        let outcome = encode_array(&[Value::Null, Value::Null], &ctx, &mut params).unwrap();
        assert!(matches!(outcome, EncodeOutcome::Refused));
    }
}
