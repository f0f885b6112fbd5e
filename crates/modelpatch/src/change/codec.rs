//! JSON codec for changes: `{op, path, from?, value?}` records, the subset
//! of RFC 6902 the engines speak.

use modelpatch_pointer::{Pointer, PointerError};
use serde_json::{Map, Value};
use thiserror::Error;

use super::types::{Change, Operation};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CodecError {
    #[error("patch document must be an array")]
    NotAnArray,
    #[error("operation must be an object")]
    NotAnObject,
    #[error("`{0}` must be a string")]
    NotAString(&'static str),
    #[error("missing `{0}`")]
    Missing(&'static str),
    #[error("`{field}` is not allowed for `{op}`")]
    Unexpected { field: &'static str, op: &'static str },
    #[error("invalid `{field}`: {source}")]
    Pointer {
        field: &'static str,
        #[source]
        source: PointerError,
    },
}

fn decode_pointer(obj: &Map<String, Value>, field: &'static str) -> Result<Option<Pointer>, CodecError> {
    let Some(v) = obj.get(field) else {
        return Ok(None);
    };
    let s = v.as_str().ok_or(CodecError::NotAString(field))?;
    Pointer::parse(s)
        .map(Some)
        .map_err(|source| CodecError::Pointer { field, source })
}

/// Serialize one change.
pub fn to_json(change: &Change) -> Value {
    let mut m = Map::new();
    m.insert("op".into(), Value::String(change.op.as_str().to_string()));
    m.insert("path".into(), Value::String(change.path.to_string()));
    if let Some(from) = &change.from {
        m.insert("from".into(), Value::String(from.to_string()));
    }
    if let Some(value) = &change.value {
        m.insert("value".into(), value.clone());
    }
    Value::Object(m)
}

/// Deserialize one change.
///
/// Unknown operation names decode to [`Operation::Invalid`] and `copy`/`test`
/// decode as themselves, so the applyer can reject them with the change
/// attached. For `add`/`remove`/`replace`/`move` the payload rule is checked
/// here: `from` only on `move`, `value` only on `add`/`replace`.
pub fn from_json(v: &Value) -> Result<Change, CodecError> {
    let obj = v.as_object().ok_or(CodecError::NotAnObject)?;
    let op = obj
        .get("op")
        .ok_or(CodecError::Missing("op"))?
        .as_str()
        .ok_or(CodecError::NotAString("op"))?;
    let op = Operation::parse(op);
    let path = decode_pointer(obj, "path")?.ok_or(CodecError::Missing("path"))?;
    let from = decode_pointer(obj, "from")?;
    let value = obj.get("value").cloned();

    match op {
        Operation::Add | Operation::Replace => {
            if value.is_none() {
                return Err(CodecError::Missing("value"));
            }
            if from.is_some() {
                return Err(CodecError::Unexpected { field: "from", op: op.as_str() });
            }
        }
        Operation::Remove => {
            if value.is_some() {
                return Err(CodecError::Unexpected { field: "value", op: op.as_str() });
            }
            if from.is_some() {
                return Err(CodecError::Unexpected { field: "from", op: op.as_str() });
            }
        }
        Operation::Move => {
            if from.is_none() {
                return Err(CodecError::Missing("from"));
            }
            if value.is_some() {
                return Err(CodecError::Unexpected { field: "value", op: op.as_str() });
            }
        }
        Operation::Copy | Operation::Test | Operation::Invalid => {}
    }

    Ok(Change { op, path, from, value })
}

/// Serialize a change list as a patch document.
pub fn to_json_patch(changes: &[Change]) -> Value {
    Value::Array(changes.iter().map(to_json).collect())
}

/// Deserialize a patch document.
pub fn from_json_patch(v: &Value) -> Result<Vec<Change>, CodecError> {
    v.as_array()
        .ok_or(CodecError::NotAnArray)?
        .iter()
        .map(from_json)
        .collect()
}
