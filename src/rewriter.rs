//! The two-pass Query Rewriter (§4.3): turns a placeholder-bearing template
//! into a numbered-parameter query plus a parallel [`ParameterBuffer`].
//!
//! Pass 1 ([`scan`]) validates placeholder-style uniformity, rejects
//! multi-statement input, and estimates the rewritten query's length. Pass
//! 2 ([`rewrite`]'s main loop) re-walks the template, calling the Value
//! Encoder Registry for each placeholder and emitting either a numbered
//! `$N` reference or an inline snippet.
//!
//! The buffer-growth strategy called out in the design notes (grow by
//! `needed + 16`, rebase a running pointer on move) is a non-issue here:
//! `String` already grows by offset, not by pointer, so there is nothing to
//! rebase. `String::with_capacity` on the pass-1 estimate still avoids
//! repeated reallocation for the common case.

use std::fmt::Write as _;

use crate::conn_context::ConnContext;
use crate::encoder::{self, EncodeOutcome};
use crate::error::Error;
use crate::param_buffer::ParameterBuffer;
use crate::value::Value;
use crate::vars::Vars;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Unknown,
    Named,
    Positional,
    NativeNumbered,
}

/// What [`rewrite`] produced.
pub enum RewriteOutcome {
    Bound { sql: String, params: ParameterBuffer },
    /// This template cannot be safely bound via the typed-parameter path;
    /// the caller should fall back to [`crate::mogrify::mogrify`].
    Refused,
}

pub fn rewrite(template: &str, vars: &Vars, ctx: &ConnContext) -> Result<RewriteOutcome, Error> {
    if template.is_empty() {
        return Err(Error::programming("empty query template"));
    }

    if !ctx.binary_path_policy.permits(first_keyword(template)) {
        return Ok(RewriteOutcome::Refused);
    }

    let estimated_length = match scan(template, vars)? {
        None => return Ok(RewriteOutcome::Refused),
        Some(estimated_length) => estimated_length,
    };

    emit(template, vars, ctx, estimated_length)
}

/// Pass 1: validate and size the template. Returns `Ok(None)` for a
/// multi-statement template (refused, not an error).
fn scan(template: &str, vars: &Vars) -> Result<Option<usize>, Error> {
    let bytes = template.as_bytes();
    let mut style = Style::Unknown;
    let mut param_count = 0usize;
    let mut estimated_length = 0usize;
    let mut saw_semicolon = false;
    let mut i = 0usize;

    while i < bytes.len() {
        if saw_semicolon && !bytes[i].is_ascii_whitespace() {
            return Ok(None);
        }

        match bytes[i] {
            b'%' if bytes.get(i + 1) == Some(&b'%') => {
                estimated_length += 1;
                i += 2;
            }
            b'$' if bytes.get(i + 1) == Some(&b'$') => {
                estimated_length += 2;
                i += 2;
            }
            b'%' if bytes.get(i + 1) == Some(&b'(') => {
                set_style(&mut style, Style::Named)?;
                let j = skip_named_placeholder(bytes, i)?;
                param_count += 1;
                estimated_length += decimal_length(param_count) + 1;
                i = j;
            }
            b'%' => {
                set_style(&mut style, Style::Positional)?;
                let j = skip_type_letter(bytes, i + 1)
                    .ok_or_else(|| Error::programming("placeholder missing type letter"))?;
                param_count += 1;
                estimated_length += decimal_length(param_count) + 1;
                i = j;
            }
            b'$' if bytes[i + 1..].first().map_or(false, u8::is_ascii_digit) => {
                if !vars.is_none() {
                    return Err(Error::programming(
                        "native $N placeholders are not allowed when vars are supplied",
                    ));
                }
                set_style(&mut style, Style::NativeNumbered)?;
                let mut j = i + 1;
                while j < bytes.len() && bytes[j].is_ascii_digit() {
                    j += 1;
                }
                estimated_length += 2;
                i = j;
            }
            b';' => {
                saw_semicolon = true;
                estimated_length += 1;
                i += 1;
            }
            _ if saw_semicolon => {
                estimated_length += 1;
                i += 1;
            }
            _ => {
                // Fast-forward through a run of plain literal bytes to the
                // next byte this scanner cares about.
                let rest = &bytes[i..];
                let skip = memchr::memchr3(b'%', b'$', b';', rest).unwrap_or(rest.len()).max(1);
                estimated_length += skip;
                i += skip;
            }
        }
    }

    Ok(Some(estimated_length))
}

enum Flow {
    Continue,
    Refused,
}

/// Pass 2: re-walk the template, encoding each placeholder's value and
/// emitting either a numbered reference or an inline snippet.
fn emit(
    template: &str,
    vars: &Vars,
    ctx: &ConnContext,
    estimated_length: usize,
) -> Result<RewriteOutcome, Error> {
    let mut sql = String::with_capacity(estimated_length + 1);
    let mut params = ParameterBuffer::new();
    let mut oidx = 0usize;
    let mut next_positional = 0usize;
    let bytes = template.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        match bytes[i] {
            b'%' if bytes.get(i + 1) == Some(&b'%') => {
                sql.push('%');
                i += 2;
            }
            b'$' if bytes.get(i + 1) == Some(&b'$') => {
                sql.push_str("$$");
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
                match emit_one(value, ctx, &mut params, &mut sql, &mut oidx)? {
                    Flow::Continue => {}
                    Flow::Refused => return Ok(RewriteOutcome::Refused),
                }
                i = j;
            }
            b'%' => {
                let j = skip_type_letter(bytes, i + 1)
                    .ok_or_else(|| Error::programming("placeholder missing type letter"))?;
                let value = vars.get_positional(next_positional).ok_or_else(|| {
                    Error::programming("not enough arguments for format string")
                })?;
                next_positional += 1;
                match emit_one(value, ctx, &mut params, &mut sql, &mut oidx)? {
                    Flow::Continue => {}
                    Flow::Refused => return Ok(RewriteOutcome::Refused),
                }
                i = j;
            }
            b'$' if bytes[i + 1..].first().map_or(false, u8::is_ascii_digit) => {
                // Forbidden-with-vars was already rejected in `scan`; a
                // native-numbered reference here passes through verbatim.
                let mut j = i + 1;
                while j < bytes.len() && bytes[j].is_ascii_digit() {
                    j += 1;
                }
                sql.push_str(&template[i..j]);
                i = j;
            }
            _ => {
                // `%`, `$`, and `;` are all ASCII and never appear as a
                // continuation byte of a multi-byte UTF-8 sequence, so
                // this slice boundary is always a char boundary.
                let rest = &bytes[i..];
                let skip = memchr::memchr3(b'%', b'$', b';', rest).unwrap_or(rest.len()).max(1);
                sql.push_str(&template[i..i + skip]);
                i += skip;
            }
        }
    }

    Ok(RewriteOutcome::Bound { sql, params })
}

fn emit_one(
    value: &Value,
    ctx: &ConnContext,
    params: &mut ParameterBuffer,
    sql: &mut String,
    oidx: &mut usize,
) -> Result<Flow, Error> {
    match encoder::encode(value, ctx, params)? {
        EncodeOutcome::Bound => {
            write!(sql, "${}", *oidx + 1).expect("write! to a String never fails");
            *oidx += 1;
            Ok(Flow::Continue)
        }
        EncodeOutcome::InlineExpansion { len, snippet } => {
            sql.push_str(&snippet);
            *oidx += len;
            Ok(Flow::Continue)
        }
        EncodeOutcome::Refused => Ok(Flow::Refused),
    }
}

fn set_style(style: &mut Style, new: Style) -> Result<(), Error> {
    match *style {
        Style::Unknown => {
            *style = new;
            Ok(())
        }
        current if current == new => Ok(()),
        _ => Err(Error::programming("argument formats can't be mixed")),
    }
}

/// Index just past the closing `)` of a `%(name)s`-style placeholder,
/// skipping any format-spec characters up through the type letter.
fn skip_named_placeholder(bytes: &[u8], start: usize) -> Result<usize, Error> {
    let close = bytes[start + 2..]
        .iter()
        .position(|&b| b == b')')
        .map(|p| start + 2 + p)
        .ok_or_else(|| Error::programming("unterminated named placeholder"))?;
    skip_type_letter(bytes, close + 1)
        .ok_or_else(|| Error::programming("named placeholder missing type letter"))
}

/// Index just past the first ASCII letter found starting at `from`,
/// tolerating any run of non-letter format-spec bytes before it.
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

fn first_keyword(template: &str) -> &str {
    let trimmed = template.trim_start();
    let end = trimmed
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(trimmed.len());
    &trimmed[..end]
}

fn decimal_length(mut n: usize) -> usize {
    if n == 0 {
        return 1;
    }
    let mut len = 0;
    while n > 0 {
        len += 1;
        n /= 10;
    }
    len
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid::Oid;
    use crate::type_info::PgValueFormat;

    fn ctx() -> ConnContext {
        ConnContext::default()
    }

    #[test]
    fn scenario_1_positional_int_and_text() {
        let vars = Vars::Positional(vec![Value::Int4(7), Value::Text("hi".into())]);
        let outcome = rewrite("SELECT %s, %s", &vars, &ctx()).unwrap();
        match outcome {
            RewriteOutcome::Bound { sql, params } => {
                assert_eq!(sql, "SELECT $1, $2");
                assert_eq!(params.len(), 2);
                let mut iter = params.iter();
                let first = iter.next().unwrap();
                assert_eq!(first.type_oid, Oid::INT4);
                assert_eq!(first.as_bytes().unwrap(), &[0, 0, 0, 7]);
                let second = iter.next().unwrap();
                assert_eq!(second.type_oid, Oid::VARCHAR);
                assert_eq!(second.format, PgValueFormat::Text);
                assert_eq!(second.as_bytes().unwrap(), b"hi");
            }
            RewriteOutcome::Refused => panic!("expected Bound"),
        }
    }

    #[test]
    fn scenario_2_named_with_null() {
        let mut map = std::collections::HashMap::new();
        map.insert("a".to_string(), Value::Null);
        map.insert("b".to_string(), Value::Int4(42));
        let vars = Vars::Named(map);
        let outcome = rewrite("UPDATE t SET x=%(a)s WHERE id=%(b)s", &vars, &ctx()).unwrap();
        match outcome {
            RewriteOutcome::Bound { sql, params } => {
                assert_eq!(sql, "UPDATE t SET x=$1 WHERE id=$2");
                let mut iter = params.iter();
                assert!(iter.next().unwrap().is_null());
                assert_eq!(iter.next().unwrap().as_bytes().unwrap(), &[0, 0, 0, 0x2A]);
            }
            RewriteOutcome::Refused => panic!("expected Bound"),
        }
    }

    #[test]
    fn scenario_3_percent_escape() {
        let vars = Vars::Positional(vec![Value::Int4(3)]);
        let outcome = rewrite("SELECT 100 %% %s", &vars, &ctx()).unwrap();
        match outcome {
            RewriteOutcome::Bound { sql, params } => {
                assert_eq!(sql, "SELECT 100 % $1");
                assert_eq!(params.len(), 1);
            }
            RewriteOutcome::Refused => panic!("expected Bound"),
        }
    }

    #[test]
    fn scenario_4_mixed_styles_is_a_programming_error() {
        let mut map = std::collections::HashMap::new();
        map.insert("x".to_string(), Value::Int4(2));
        let vars = Vars::Named(map);
        let err = rewrite("SELECT %s AND %(x)s", &vars, &ctx()).unwrap_err();
        assert!(matches!(err, Error::Programming(_)));
    }

    #[test]
    fn scenario_5_multi_statement_is_refused() {
        let vars = Vars::Positional(vec![Value::Int4(1)]);
        let outcome = rewrite("SELECT %s; DROP TABLE t", &vars, &ctx()).unwrap();
        assert!(matches!(outcome, RewriteOutcome::Refused));
    }

    #[test]
    fn scenario_6_array_binds_a_single_slot() {
        let vars = Vars::Positional(vec![Value::Array(vec![
            Value::Int4(1),
            Value::Int4(2),
            Value::Int4(3),
        ])]);
        let outcome = rewrite("SELECT %s", &vars, &ctx()).unwrap();
        match outcome {
            RewriteOutcome::Bound { sql, params } => {
                assert_eq!(sql, "SELECT $1");
                assert_eq!(params.len(), 1);
                assert_eq!(params.iter().next().unwrap().type_oid, Oid::INT4_ARRAY);
            }
            RewriteOutcome::Refused => panic!("expected Bound"),
        }
    }

    #[test]
    fn empty_template_is_a_programming_error() {
        let err = rewrite("", &Vars::None, &ctx()).unwrap_err();
        assert!(matches!(err, Error::Programming(_)));
    }

    #[test]
    fn dollar_dollar_passes_through() {
        let outcome = rewrite("SELECT $$hi$$", &Vars::None, &ctx()).unwrap();
        match outcome {
            RewriteOutcome::Bound { sql, params } => {
                assert_eq!(sql, "SELECT $$hi$$");
                assert_eq!(params.len(), 0);
            }
            RewriteOutcome::Refused => panic!("expected Bound"),
        }
    }

    #[test]
    fn native_numbered_passes_through_without_vars() {
        let outcome = rewrite("SELECT $1, $2", &Vars::None, &ctx()).unwrap();
        match outcome {
            RewriteOutcome::Bound { sql, params } => {
                assert_eq!(sql, "SELECT $1, $2");
                assert_eq!(params.len(), 0);
            }
            RewriteOutcome::Refused => panic!("expected Bound"),
        }
    }

    #[test]
    fn native_numbered_with_vars_is_an_error() {
        let vars = Vars::Positional(vec![Value::Int4(1)]);
        let err = rewrite("SELECT $1", &vars, &ctx()).unwrap_err();
        assert!(matches!(err, Error::Programming(_)));
    }

    #[test]
    fn unrecognized_first_keyword_is_refused() {
        let vars = Vars::Positional(vec![Value::Int4(1)]);
        let outcome = rewrite("EXECUTE %s", &vars, &ctx()).unwrap();
        assert!(matches!(outcome, RewriteOutcome::Refused));
    }

    #[test]
    fn missing_named_key_is_an_error() {
        let vars = Vars::Named(std::collections::HashMap::new());
        let err = rewrite("SELECT %(missing)s", &vars, &ctx()).unwrap_err();
        assert!(matches!(err, Error::Programming(_)));
    }

    #[test]
    fn out_of_range_positional_is_an_error() {
        let vars = Vars::Positional(vec![]);
        let err = rewrite("SELECT %s", &vars, &ctx()).unwrap_err();
        assert!(matches!(err, Error::Programming(_)));
    }
}
