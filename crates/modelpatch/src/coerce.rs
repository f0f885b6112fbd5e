//! Default coercion of raw JSON into typed [`Node`]s.

use chrono::DateTime;
use serde_json::{Number, Value};
use thiserror::Error;

use crate::model::{Node, NodeMap, Object, Scalar, ScalarType, TypeRef};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoerceError {
    #[error("cannot parse {found:?} as {expected}")]
    Format { expected: String, found: String },
    #[error("{found} does not fit in {expected}")]
    Overflow { expected: String, found: String },
    #[error("{found:?} is not a variant of {expected}")]
    Argument { expected: String, found: String },
    #[error("expected {expected}, found {found}")]
    Mismatch { expected: String, found: &'static str },
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn mismatch(ty: &TypeRef, raw: &Value) -> CoerceError {
    CoerceError::Mismatch {
        expected: ty.to_string(),
        found: kind(raw),
    }
}

fn format_err(expected: &ScalarType, found: impl ToString) -> CoerceError {
    CoerceError::Format {
        expected: expected.as_str().to_string(),
        found: found.to_string(),
    }
}

fn int_from_number(n: &Number, ty: &ScalarType) -> Result<i64, CoerceError> {
    if let Some(i) = n.as_i64() {
        return Ok(i);
    }
    if n.is_u64() {
        return Err(CoerceError::Overflow {
            expected: ty.as_str().to_string(),
            found: n.to_string(),
        });
    }
    // Floats are accepted only when integral.
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => Ok(f as i64),
        Some(f) if f.fract() == 0.0 => Err(CoerceError::Overflow {
            expected: ty.as_str().to_string(),
            found: n.to_string(),
        }),
        _ => Err(format_err(ty, n)),
    }
}

fn int_from_str(s: &str, ty: &ScalarType) -> Result<i64, CoerceError> {
    let trimmed = s.trim();
    match trimmed.parse::<i64>() {
        Ok(i) => Ok(i),
        Err(_) if !trimmed.is_empty() && trimmed.trim_start_matches(&['-', '+'][..]).bytes().all(|b| b.is_ascii_digit()) => {
            Err(CoerceError::Overflow {
                expected: ty.as_str().to_string(),
                found: s.to_string(),
            })
        }
        Err(_) => Err(format_err(ty, s)),
    }
}

fn coerce_scalar(raw: &Value, st: &ScalarType, ty: &TypeRef) -> Result<Node, CoerceError> {
    // An empty string means "no value" for every non-string scalar.
    if let Value::String(s) = raw {
        if s.is_empty() && *st != ScalarType::String {
            return Ok(Node::Null);
        }
    }
    let scalar = match (st, raw) {
        (ScalarType::Bool, Value::Bool(b)) => Scalar::Bool(*b),
        (ScalarType::Bool, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Scalar::Bool(true),
            "false" => Scalar::Bool(false),
            _ => return Err(format_err(st, s)),
        },
        (ScalarType::Int32 | ScalarType::Int64, Value::Number(n)) => Scalar::Int(int_from_number(n, st)?),
        (ScalarType::Int32 | ScalarType::Int64, Value::String(s)) => Scalar::Int(int_from_str(s, st)?),
        (ScalarType::Float64, Value::Number(n)) => Scalar::Float(n.as_f64().ok_or_else(|| format_err(st, n))?),
        (ScalarType::Float64, Value::String(s)) => {
            Scalar::Float(s.trim().parse::<f64>().map_err(|_| format_err(st, s))?)
        }
        (ScalarType::String, Value::String(s)) => Scalar::Str(s.clone()),
        (ScalarType::String, Value::Number(n)) => Scalar::Str(n.to_string()),
        (ScalarType::String, Value::Bool(b)) => Scalar::Str(b.to_string()),
        (ScalarType::Enum(variants), Value::String(s)) => {
            match variants.iter().find(|v| v.eq_ignore_ascii_case(s.trim())) {
                Some(v) => Scalar::Enum(v.clone()),
                None => {
                    return Err(CoerceError::Argument {
                        expected: format!("enum {variants:?}"),
                        found: s.clone(),
                    })
                }
            }
        }
        (ScalarType::Timestamp, Value::String(s)) => {
            Scalar::Timestamp(DateTime::parse_from_rfc3339(s.trim()).map_err(|_| format_err(st, s))?)
        }
        _ => return Err(mismatch(ty, raw)),
    };
    if let (ScalarType::Int32, Scalar::Int(i)) = (st, &scalar) {
        if i32::try_from(*i).is_err() {
            return Err(CoerceError::Overflow {
                expected: st.as_str().to_string(),
                found: i.to_string(),
            });
        }
    }
    Ok(Node::Scalar(scalar))
}

/// Coerce `raw` to a value of declared type `ty`.
///
/// `null` coerces to [`Node::Null`] for every type. Objects start from
/// [`Object::new`] and take every known key; unknown keys are ignored.
pub fn coerce_value(raw: &Value, ty: &TypeRef) -> Result<Node, CoerceError> {
    if raw.is_null() {
        return Ok(Node::Null);
    }
    match ty {
        TypeRef::Scalar(st) => coerce_scalar(raw, st, ty),
        TypeRef::List(item) => match raw {
            Value::Array(items) => items
                .iter()
                .map(|v| coerce_value(v, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Node::List),
            _ => Err(mismatch(ty, raw)),
        },
        TypeRef::Map(item) => match raw {
            Value::Object(entries) => entries
                .iter()
                .map(|(k, v)| Ok((k.clone(), coerce_value(v, item)?)))
                .collect::<Result<NodeMap, _>>()
                .map(Node::Map),
            _ => Err(mismatch(ty, raw)),
        },
        TypeRef::Object(shape) => match raw {
            Value::Object(entries) => {
                let mut obj = Object::new(shape);
                for (idx, field) in shape.fields().iter().enumerate() {
                    let Some(v) = entries.get(field.name()) else {
                        continue;
                    };
                    let value = coerce_value(v, field.ty())?;
                    if let Some(slot) = obj.value_at_mut(idx) {
                        *slot = value;
                    }
                }
                Ok(Node::Object(obj))
            }
            _ => Err(mismatch(ty, raw)),
        },
    }
}
