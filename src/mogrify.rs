//! The Textual Fallback Mogrifier (§4.5): single-pass substitution that
//! produces one fully self-contained, quoted SQL string, used whenever the
//! Query Rewriter refuses the typed-parameter path.

use crate::adapter::Adapted;
use crate::conn_context::ConnContext;
use crate::error::Error;
use crate::value::Value;
use crate::vars::Vars;

pub fn mogrify(template: &str, vars: &Vars, ctx: &ConnContext) -> Result<String, Error> {
    if template.is_empty() {
        return Err(Error::programming("empty query template"));
    }

    let mut out = String::with_capacity(template.len());
    let bytes = template.as_bytes();
    let mut i = 0usize;
    let mut next_positional = 0usize;

    while i < bytes.len() {
        match bytes[i] {
            b'%' if bytes.get(i + 1) == Some(&b'%') => {
                out.push('%');
                i += 2;
            }
            b'%' if bytes.get(i + 1) == Some(&b'(') => {
                let close = bytes[i + 2..]
                    .iter()
                    .position(|&b| b == b')')
                    .map(|p| i + 2 + p)
                    .ok_or_else(|| Error::programming("unterminated named placeholder"))?;
                let key = &template[i + 2..close];
                let j = skip_type_letter(bytes, close + 1)
                    .ok_or_else(|| Error::programming("named placeholder missing type letter"))?;
                let value = vars
                    .get_named(key)
                    .ok_or_else(|| Error::programming(format!("key not found: {}", key)))?;
                out.push_str(&quote_value(value, ctx)?);
                i = j;
            }
            b'%' => {
                let j = skip_type_letter(bytes, i + 1)
                    .ok_or_else(|| Error::programming("placeholder missing type letter"))?;
                let value = vars.get_positional(next_positional).ok_or_else(|| {
                    Error::programming("not enough arguments for format string")
                })?;
                next_positional += 1;
                out.push_str(&quote_value(value, ctx)?);
                i = j;
            }
            _ => {
                let ch = template[i..].chars().next().expect("i is a char boundary");
                out.push(ch);
                i += ch.len_utf8();
            }
        }
    }

    if let Vars::Positional(values) = vars {
        if next_positional < values.len() {
            return Err(Error::programming(
                "not all arguments converted during string formatting",
            ));
        }
    }

    Ok(out)
}

fn skip_type_letter(bytes: &[u8], from: usize) -> Option<usize> {
    let mut j = from;
    while j < bytes.len() && !bytes[j].is_ascii_alphabetic() {
        j += 1;
    }
    if j >= bytes.len() {
        None
    } else {
        Some(j + 1)
    }
}

/// Produce a self-contained SQL literal for `value`. Built-in kinds quote
/// themselves directly; `Value::Other` delegates to the adapter's
/// `get_quoted` capability (§4.5 "reuses the adapter registry").
fn quote_value(value: &Value, ctx: &ConnContext) -> Result<String, Error> {
    match value {
        Value::Null => Ok("NULL".to_string()),
        Value::Bool(b) => Ok(if *b { "TRUE".to_string() } else { "FALSE".to_string() }),
        Value::Int4(v) => Ok(v.to_string()),
        Value::Int8(v) => Ok(v.to_string()),
        Value::Float8(v) => Ok(quote_float(*v)),
        Value::Text(s) => Ok(quote_literal(s)),
        Value::Bytes(b) => Ok(quote_bytea(b)),
        Value::Array(items) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                parts.push(quote_value(item, ctx)?);
            }
            Ok(format!("ARRAY[{}]", parts.join(",")))
        }
        Value::Tuple(items) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                parts.push(quote_value(item, ctx)?);
            }
            Ok(format!("({})", parts.join(",")))
        }
        Value::Other(adapted) => quote_adapted(adapted, ctx),
    }
}

fn quote_adapted(adapted: &Adapted, ctx: &ConnContext) -> Result<String, Error> {
    adapted.adapter.prepare(ctx);
    adapted.adapter.get_quoted(ctx)
}

fn quote_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        if ch == '\'' {
            out.push('\'');
        }
        out.push(ch);
    }
    out.push('\'');
    out
}

fn quote_float(v: f64) -> String {
    if v.is_nan() {
        "'NaN'".to_string()
    } else if v.is_infinite() {
        if v > 0.0 {
            "'Infinity'".to_string()
        } else {
            "'-Infinity'".to_string()
        }
    } else {
        v.to_string()
    }
}

fn quote_bytea(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2 + 5);
    out.push_str("'\\x");
    for byte in bytes {
        out.push_str(&format!("{:02x}", byte));
    }
    out.push('\'');
    out
}
