//! Walking a pointer through a live object graph.

use modelpatch_pointer::{Pointer, Token, APPEND};

use super::StepError;
use crate::error::{ContractViolation, PathError};
use crate::model::{FieldDescriptor, Node, NodeMap, Object, TypeRef};

/// A mutable position in the graph that can hold children.
#[derive(Debug)]
pub(crate) enum Cursor<'a> {
    Object(&'a mut Object),
    /// A list and its element type.
    List(&'a mut Vec<Node>, TypeRef),
    /// A map and its value type.
    Map(&'a mut NodeMap, TypeRef),
}

fn descend<'a>(slot: &'a mut Node, ty: &TypeRef, token: &str, path: &Pointer) -> Result<Cursor<'a>, StepError> {
    match (ty, slot) {
        (_, Node::Null) => Err(PathError::NullIntermediate {
            path: path.to_string(),
            token: token.to_string(),
        }
        .into()),
        (TypeRef::Object(_), Node::Object(obj)) => Ok(Cursor::Object(obj)),
        (TypeRef::List(elem), Node::List(items)) => Ok(Cursor::List(items, (**elem).clone())),
        (TypeRef::Map(value), Node::Map(map)) => Ok(Cursor::Map(map, (**value).clone())),
        (TypeRef::Scalar(_), _) => Err(PathError::NotAContainer {
            path: path.to_string(),
            token: token.to_string(),
        }
        .into()),
        (ty, other) => Err(ContractViolation::TypeMismatch {
            path: path.to_string(),
            expected: ty.to_string(),
            found: other.kind(),
        }
        .into()),
    }
}

/// Follow `parents` (every token of `path` but the last) from `root`.
///
/// Returns the container the last token addresses into, plus the field
/// that holds it: the most recent field step, or `None` when the container
/// is `root` itself. Nulls along the way are never created.
pub(crate) fn resolve_container<'a>(
    root: &'a mut Object,
    parents: &[String],
    path: &Pointer,
) -> Result<(Cursor<'a>, Option<FieldDescriptor>), StepError> {
    let mut cursor = Cursor::Object(root);
    let mut owner = None;
    for token in parents {
        cursor = match cursor {
            Cursor::Object(obj) => {
                let unknown = || PathError::UnknownField {
                    field: token.clone(),
                    path: path.to_string(),
                };
                let idx = obj.field_index(token).ok_or_else(unknown)?;
                let field = obj.shape().fields().get(idx).cloned().ok_or_else(unknown)?;
                let slot = obj.value_at_mut(idx).ok_or_else(unknown)?;
                let next = descend(slot, field.ty(), token, path)?;
                owner = Some(field);
                next
            }
            Cursor::List(items, elem) => {
                // Map keys and field names may be "-"; only a list reads it
                // as the append position.
                if token == APPEND {
                    return Err(PathError::AppendInMiddle { path: path.to_string() }.into());
                }
                let Token::Index(index) = Token::classify(token) else {
                    return Err(PathError::NotAnIndex {
                        path: path.to_string(),
                        token: token.clone(),
                    }
                    .into());
                };
                let len = items.len();
                let slot = items.get_mut(index).ok_or_else(|| PathError::IndexOutOfRange {
                    path: path.to_string(),
                    index,
                    len,
                })?;
                descend(slot, &elem, token, path)?
            }
            Cursor::Map(map, value) => {
                let slot = map.get_mut(token.as_str()).ok_or_else(|| PathError::MissingKey {
                    path: path.to_string(),
                    key: token.clone(),
                })?;
                descend(slot, &value, token, path)?
            }
        };
    }
    Ok((cursor, owner))
}
