//! The patch operation data model.

use std::fmt;

use modelpatch_pointer::Pointer;
use serde_json::Value;

/// Operation kind. `Copy` and `Test` are recognized so they can be reported,
/// but neither engine emits or applies them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Add,
    Remove,
    Replace,
    Move,
    Copy,
    Test,
    /// Any other operation name.
    Invalid,
}

impl Operation {
    pub fn parse(s: &str) -> Self {
        match s {
            "add" => Operation::Add,
            "remove" => Operation::Remove,
            "replace" => Operation::Replace,
            "move" => Operation::Move,
            "copy" => Operation::Copy,
            "test" => Operation::Test,
            _ => Operation::Invalid,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Remove => "remove",
            Operation::Replace => "replace",
            Operation::Move => "move",
            Operation::Copy => "copy",
            Operation::Test => "test",
            Operation::Invalid => "invalid",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One patch operation.
///
/// The constructors keep `from` set only for `move` and `value` set only for
/// `add`/`replace`. The fields stay public so externally supplied patches,
/// which may break that rule, can still reach the applyer and be rejected
/// there with the offending change attached.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub op: Operation,
    pub path: Pointer,
    pub from: Option<Pointer>,
    pub value: Option<Value>,
}

impl Change {
    pub fn add(path: Pointer, value: Value) -> Self {
        Self {
            op: Operation::Add,
            path,
            from: None,
            value: Some(value),
        }
    }

    pub fn remove(path: Pointer) -> Self {
        Self {
            op: Operation::Remove,
            path,
            from: None,
            value: None,
        }
    }

    pub fn replace(path: Pointer, value: Value) -> Self {
        Self {
            op: Operation::Replace,
            path,
            from: None,
            value: Some(value),
        }
    }

    /// Move the element at `from` so that it ends up at `path`.
    pub fn move_to(path: Pointer, from: Pointer) -> Self {
        Self {
            op: Operation::Move,
            path,
            from: Some(from),
            value: None,
        }
    }
}

/// `op:path=value`, with an empty value for remove/move.
impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}=", self.op, self.path)?;
        match &self.value {
            Some(Value::String(s)) => f.write_str(s),
            Some(v) => write!(f, "{v}"),
            None => Ok(()),
        }
    }
}
