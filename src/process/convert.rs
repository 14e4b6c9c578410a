// src/process/convert.rs

use bigdecimal::BigDecimal;
use std::str::FromStr;
use tracing::debug;

use crate::process::{date_parser, unescape::unescape};
use crate::schema::{PrimitiveType, Value};

/// Convert one raw (non-null) field into a typed value.
///
/// The error string is the reason only; the caller adds column context.
/// Decimals never fail: text without a parseable prefix becomes `Null`.
pub fn convert_field(ty: PrimitiveType, raw: &str) -> Result<Value, String> {
    match ty {
        PrimitiveType::Boolean => parse_bool(raw).map(Value::Boolean),
        PrimitiveType::Int8 => parse_number::<i8>(raw).map(Value::Int8),
        PrimitiveType::Int16 => parse_number::<i16>(raw).map(Value::Int16),
        PrimitiveType::Int32 => parse_number::<i32>(raw).map(Value::Int32),
        PrimitiveType::Int64 => parse_number::<i64>(raw).map(Value::Int64),
        PrimitiveType::Float32 => parse_number::<f32>(raw).map(Value::Float32),
        PrimitiveType::Float64 => parse_number::<f64>(raw).map(Value::Float64),
        PrimitiveType::Decimal { .. } => Ok(parse_decimal(raw).map_or(Value::Null, Value::Decimal)),
        PrimitiveType::String => unescape(raw).map(|s| Value::String(s.into_owned())),
        PrimitiveType::Timestamp => date_parser::parse_timestamp_millis(raw).map(Value::Timestamp),
    }
}

/// Only the first character matters: `t` is true, anything else is false.
pub fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw.chars().next() {
        Some(c) => Ok(c == 't'),
        None => Err("empty boolean".to_string()),
    }
}

/// Whole-field parse for the fixed-width integers and floats. Floats also
/// take `Infinity`, `-Infinity` and `NaN`, which is how the server spells them.
pub fn parse_number<T>(raw: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| e.to_string())
}

/// Parse the longest decimal prefix of `raw`.
///
/// Fixed convention regardless of host locale: optional sign, digits with
/// optional `,` grouping, optional `.` fraction, optional `E` exponent.
/// Trailing text after the prefix is ignored. `None` when no digits lead, or
/// when the exponent is too large to represent.
pub fn parse_decimal(raw: &str) -> Option<BigDecimal> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    let mut digits = String::with_capacity(raw.len());

    if let Some(&sign @ (b'+' | b'-')) = bytes.first() {
        if sign == b'-' {
            digits.push('-');
        }
        i += 1;
    }

    let mut seen_digit = false;
    while i < bytes.len() {
        match bytes[i] {
            d @ b'0'..=b'9' => {
                digits.push(d as char);
                seen_digit = true;
            }
            // grouping separator only counts between digits
            b',' if seen_digit && bytes.get(i + 1).is_some_and(u8::is_ascii_digit) => {}
            _ => break,
        }
        i += 1;
    }

    if bytes.get(i) == Some(&b'.') {
        let mut j = i + 1;
        let mut frac = String::new();
        while let Some(d @ b'0'..=b'9') = bytes.get(j).copied() {
            frac.push(d as char);
            j += 1;
        }
        if seen_digit || !frac.is_empty() {
            if !seen_digit {
                digits.push('0');
            }
            if !frac.is_empty() {
                digits.push('.');
                digits.push_str(&frac);
            }
            seen_digit = true;
            i = j;
        }
    }

    if !seen_digit {
        debug!(raw, "no decimal prefix");
        return None;
    }

    if let Some(b'E' | b'e') = bytes.get(i) {
        let rest = &raw[i + 1..];
        let end = rest
            .char_indices()
            .find(|&(k, ch)| !(ch.is_ascii_digit() || (k == 0 && (ch == '-' || ch == '+'))))
            .map_or(rest.len(), |(k, _)| k);
        let exp_text = &rest[..end];
        // a bare `E` or sign is not part of the number
        if exp_text.bytes().any(|b| b.is_ascii_digit()) {
            let Ok(exp) = exp_text.parse::<i64>() else {
                debug!(raw, "decimal exponent out of range");
                return None;
            };
            digits.push('E');
            digits.push_str(&exp.to_string());
        }
    }

    match BigDecimal::from_str(&digits) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(raw, error = %e, "decimal out of range");
            None
        }
    }
}
