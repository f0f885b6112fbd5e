//! Patch application.
//!
//! [`Applyer::apply_changes`] replays changes against a target object, one
//! at a time, coercing and validating incoming values through the
//! configured [`Strategies`]. It stops at the first change that fails;
//! changes before it stay applied.

use std::sync::Arc;

use modelpatch_pointer::Token;
use serde_json::Value;
use tracing::debug;

use crate::change::{Change, Operation};
use crate::coerce::CoerceError;
use crate::error::{ApplyError, ApplyResult, ContractViolation, OperationError, PathError};
use crate::model::{empty_slot, FieldDescriptor, Node, NodeMap, Object, TypeRef};
use crate::strategies::Strategies;
use crate::validate::ValidationError;

mod resolve;

use resolve::{resolve_container, Cursor};

/// Failure of one change, before it is attached to the change.
#[derive(Debug)]
pub(crate) enum StepError {
    Operation(OperationError),
    Contract(ContractViolation),
}

impl From<OperationError> for StepError {
    fn from(err: OperationError) -> Self {
        StepError::Operation(err)
    }
}

impl From<PathError> for StepError {
    fn from(err: PathError) -> Self {
        StepError::Operation(err.into())
    }
}

impl From<CoerceError> for StepError {
    fn from(err: CoerceError) -> Self {
        StepError::Operation(err.into())
    }
}

impl From<ValidationError> for StepError {
    fn from(err: ValidationError) -> Self {
        StepError::Operation(err.into())
    }
}

impl From<ContractViolation> for StepError {
    fn from(err: ContractViolation) -> Self {
        StepError::Contract(err)
    }
}

type StepResult<T> = Result<T, StepError>;

#[derive(Debug, Clone, Default)]
pub struct Applyer {
    strategies: Strategies,
}

impl Applyer {
    pub fn new(strategies: Strategies) -> Self {
        Self { strategies }
    }

    pub fn strategies(&self) -> &Strategies {
        &self.strategies
    }

    /// Apply `changes` to `target` in order.
    ///
    /// Returns the fields touched, one entry per change, in application
    /// order (all fields of the shape for a root `replace`). For changes
    /// inside a list or map the entry is the field holding it.
    ///
    /// # Example
    ///
    /// ```
    /// use modelpatch::{from_json_patch, Applyer, Object, Shape, TypeRef};
    /// use serde_json::json;
    ///
    /// let shape = Shape::builder("Doc")
    ///     .field("title", TypeRef::string())
    ///     .field("tags", TypeRef::list(TypeRef::string()))
    ///     .build();
    /// let mut doc = Object::new(&shape);
    /// let patch = from_json_patch(&json!([
    ///     {"op": "replace", "path": "/title", "value": "hello"},
    ///     {"op": "add", "path": "/tags/-", "value": "greeting"},
    /// ]))
    /// .unwrap();
    ///
    /// let touched = Applyer::default().apply_changes(&mut doc, &patch).unwrap();
    /// assert_eq!(touched.len(), 2);
    /// assert_eq!(doc.to_json(), json!({"title": "hello", "tags": ["greeting"]}));
    /// ```
    pub fn apply_changes(&self, target: &mut Object, changes: &[Change]) -> ApplyResult<Vec<FieldDescriptor>> {
        debug!(shape = target.shape().name(), count = changes.len(), "apply changes");
        let mut touched = Vec::with_capacity(changes.len());
        for change in changes {
            match self.apply_change(target, change) {
                Ok(fields) => {
                    debug!(%change, "applied");
                    touched.extend(fields);
                }
                Err(StepError::Operation(source)) => {
                    debug!(%change, %source, "rejected");
                    return Err(ApplyError::InvalidOperation {
                        change: Box::new(change.clone()),
                        source,
                    });
                }
                Err(StepError::Contract(err)) => return Err(err.into()),
            }
        }
        Ok(touched)
    }

    fn apply_change(&self, target: &mut Object, change: &Change) -> StepResult<Vec<FieldDescriptor>> {
        if matches!(change.op, Operation::Copy | Operation::Test | Operation::Invalid) {
            return Err(OperationError::Unsupported(change.op.as_str()).into());
        }
        let Some((parents, last)) = change.path.split_last() else {
            return self.replace_root(target, change);
        };
        let (container, owner) = resolve_container(target, parents, &change.path)?;
        match container {
            Cursor::Object(obj) => Ok(vec![self.apply_to_field(obj, last, change)?]),
            Cursor::List(items, elem) => {
                self.apply_to_list(items, &elem, parents, last, change)?;
                Ok(owner.into_iter().collect())
            }
            Cursor::Map(map, value_ty) => {
                self.apply_to_map(map, &value_ty, last, change)?;
                Ok(owner.into_iter().collect())
            }
        }
    }

    fn coerce_value(&self, change: &Change, ty: &TypeRef) -> StepResult<Node> {
        let raw: &Value = change
            .value
            .as_ref()
            .ok_or(OperationError::MissingValue(change.op.as_str()))?;
        Ok((self.strategies.coerce())(raw, ty)?)
    }

    fn replace_root(&self, target: &mut Object, change: &Change) -> StepResult<Vec<FieldDescriptor>> {
        if change.op != Operation::Replace {
            return Err(OperationError::RootOperation(change.op.as_str()).into());
        }
        let shape = Arc::clone(target.shape());
        match self.coerce_value(change, &TypeRef::object(&shape))? {
            Node::Object(replacement) => {
                *target = replacement;
                Ok(shape.fields().to_vec())
            }
            _ => Err(OperationError::MissingValue("replace").into()),
        }
    }

    fn apply_to_field(&self, obj: &mut Object, name: &str, change: &Change) -> StepResult<FieldDescriptor> {
        let path = &change.path;
        let Some(idx) = obj.field_index(name) else {
            if Token::classify(name).is_positional() {
                return Err(OperationError::NotAList { path: path.to_string() }.into());
            }
            return Err(PathError::UnknownField {
                field: name.to_string(),
                path: path.to_string(),
            }
            .into());
        };
        let field = obj
            .shape()
            .fields()
            .get(idx)
            .cloned()
            .ok_or_else(|| ContractViolation::Internal(format!("no field {idx} for {path}")))?;

        let value = match change.op {
            Operation::Remove => empty_slot(field.ty()),
            Operation::Add | Operation::Replace => {
                let value = self.coerce_value(change, field.ty())?;
                (self.strategies.validate())(&value, &field, &*obj)?;
                value
            }
            Operation::Move => return Err(OperationError::MoveOnField(path.to_string()).into()),
            op => return Err(OperationError::Unsupported(op.as_str()).into()),
        };
        if let Some(slot) = obj.value_at_mut(idx) {
            *slot = value;
        }
        Ok(field)
    }

    fn apply_to_list(
        &self,
        items: &mut Vec<Node>,
        elem: &TypeRef,
        parents: &[String],
        last: &str,
        change: &Change,
    ) -> StepResult<()> {
        let path = &change.path;
        let index = match Token::classify(last) {
            Token::Index(index) => Some(index),
            Token::Append => None,
            Token::Name(_) => {
                return Err(PathError::NotAnIndex {
                    path: path.to_string(),
                    token: last.to_string(),
                }
                .into())
            }
        };
        let len = items.len();
        let op = change.op.as_str();
        let out_of_range = |index: usize| OperationError::OutOfRange { op, index, len };

        match change.op {
            Operation::Add => {
                let at = index.unwrap_or(len);
                if at > len {
                    return Err(out_of_range(at).into());
                }
                let value = self.coerce_value(change, elem)?;
                if value.is_null() {
                    return Err(OperationError::MissingValue(op).into());
                }
                items.insert(at, value);
            }
            Operation::Remove => {
                let at = index.unwrap_or(len);
                if at >= len {
                    return Err(out_of_range(at).into());
                }
                items.remove(at);
            }
            Operation::Replace => {
                let at = index.unwrap_or(len);
                let value = self.coerce_value(change, elem)?;
                let slot = items.get_mut(at).ok_or_else(|| out_of_range(at))?;
                *slot = value;
            }
            Operation::Move => {
                let from = change.from.as_ref().ok_or(OperationError::MissingFrom)?;
                let (from_parents, from_last) = from
                    .split_last()
                    .ok_or_else(|| OperationError::FromNotIndex(from.to_string()))?;
                if from_parents != parents {
                    return Err(OperationError::CrossListMove {
                        from: from.to_string(),
                        path: path.to_string(),
                    }
                    .into());
                }
                let Token::Index(source) = Token::classify(from_last) else {
                    return Err(OperationError::FromNotIndex(from.to_string()).into());
                };
                if source >= len {
                    return Err(out_of_range(source).into());
                }
                // The destination addresses the list with the source removed.
                let dest = index.unwrap_or(len - 1);
                if dest >= len {
                    return Err(out_of_range(dest).into());
                }
                let item = items.remove(source);
                items.insert(dest, item);
            }
            _ => return Err(OperationError::Unsupported(op).into()),
        }
        Ok(())
    }

    fn apply_to_map(&self, map: &mut NodeMap, value_ty: &TypeRef, key: &str, change: &Change) -> StepResult<()> {
        let missing = || PathError::MissingKey {
            path: change.path.to_string(),
            key: key.to_string(),
        };
        match change.op {
            Operation::Add => {
                let value = self.coerce_value(change, value_ty)?;
                map.insert(key.to_string(), value);
            }
            Operation::Replace => {
                let value = self.coerce_value(change, value_ty)?;
                let slot = map.get_mut(key).ok_or_else(missing)?;
                *slot = value;
            }
            Operation::Remove => {
                map.shift_remove(key).ok_or_else(missing)?;
            }
            op => return Err(OperationError::Unsupported(op.as_str()).into()),
        }
        Ok(())
    }
}
