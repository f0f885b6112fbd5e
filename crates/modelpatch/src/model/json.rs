//! Owned JSON rendering of instance values, used for change payloads.

use serde_json::{Map, Number, Value};

use super::node::{Node, Object, Scalar};

impl Scalar {
    pub fn to_json(&self) -> Value {
        match self {
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Int(i) => Value::Number((*i).into()),
            // Non-finite floats have no JSON form.
            Scalar::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            Scalar::Str(s) | Scalar::Enum(s) => Value::String(s.clone()),
            Scalar::Timestamp(t) => Value::String(t.to_rfc3339()),
        }
    }
}

impl Object {
    /// Every declared field, in declaration order. Null slots render as `null`.
    pub fn to_json(&self) -> Value {
        let mut out = Map::with_capacity(self.shape().len());
        for (field, value) in self.fields() {
            out.insert(field.name().to_string(), value.to_json());
        }
        Value::Object(out)
    }
}

impl Node {
    pub fn to_json(&self) -> Value {
        match self {
            Node::Null => Value::Null,
            Node::Scalar(s) => s.to_json(),
            Node::Object(o) => o.to_json(),
            Node::List(items) => Value::Array(items.iter().map(Node::to_json).collect()),
            Node::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}
