//! Fused diff-and-apply.
//!
//! [`Differ::diff_and_patch`] walks `changed` field by field, writes every
//! difference into `original`, and reports each write as a [`Change`]. The
//! produced change list replayed against an untouched copy of `original`
//! reproduces the same state.

use std::sync::Arc;

use modelpatch_pointer::Pointer;
use tracing::{debug, warn};

use crate::change::Change;
use crate::classify::Category;
use crate::error::{ContractViolation, DiffResult};
use crate::model::{FieldDescriptor, Node, NodeMap, Object, TypeRef};
use crate::strategies::Strategies;

mod collection;
pub mod sink;

pub use sink::{ChangeSink, Count, Discard};

/// Diff engine. Holds the collaborators; carries no per-call state.
#[derive(Debug, Clone, Default)]
pub struct Differ {
    strategies: Strategies,
}

/// Hand `change` to `sink`, refusing paths that could not be parsed back.
pub(crate) fn emit(sink: &mut dyn ChangeSink, change: Change) -> DiffResult<()> {
    for pointer in std::iter::once(&change.path).chain(change.from.as_ref()) {
        pointer.check_limits().map_err(|source| ContractViolation::PathLimit {
            path: pointer.to_string(),
            source,
        })?;
    }
    debug!(%change, "emit");
    sink.push(change);
    Ok(())
}

pub(crate) fn mismatch(path: &Pointer, ty: &TypeRef, found: &Node) -> ContractViolation {
    ContractViolation::TypeMismatch {
        path: path.to_string(),
        expected: ty.to_string(),
        found: found.kind(),
    }
}

/// `node` is null or the variant `ty` declares.
pub(crate) fn expect_kind(node: &Node, ty: &TypeRef, path: &Pointer) -> DiffResult<()> {
    match (ty, node) {
        (_, Node::Null)
        | (TypeRef::Scalar(_), Node::Scalar(_))
        | (TypeRef::Object(_), Node::Object(_))
        | (TypeRef::List(_), Node::List(_))
        | (TypeRef::Map(_), Node::Map(_)) => Ok(()),
        _ => Err(mismatch(path, ty, node)),
    }
}

fn missing_slot(obj: &Object, idx: usize) -> ContractViolation {
    ContractViolation::Internal(format!("shape `{}` has no slot {idx}", obj.shape().name()))
}

impl Differ {
    pub fn new(strategies: Strategies) -> Self {
        Self { strategies }
    }

    pub fn strategies(&self) -> &Strategies {
        &self.strategies
    }

    /// Diff `changed` into `original` and collect the changes.
    ///
    /// With no `original`, the result is a single `replace` of the root
    /// carrying the whole of `changed`.
    ///
    /// # Example
    ///
    /// ```
    /// use modelpatch::{Differ, Object, Shape, TypeRef};
    ///
    /// let shape = Shape::builder("User").field("name", TypeRef::string()).build();
    /// let mut original = Object::new(&shape).with("name", "ann");
    /// let changed = Object::new(&shape).with("name", "bob");
    ///
    /// let changes = Differ::default().diff_and_patch(Some(&mut original), &changed).unwrap();
    /// assert_eq!(changes[0].to_string(), "replace:/name=bob");
    /// assert_eq!(original, changed);
    /// ```
    pub fn diff_and_patch(&self, original: Option<&mut Object>, changed: &Object) -> DiffResult<Vec<Change>> {
        let mut changes: Vec<Change> = Vec::new();
        self.diff_and_patch_into(original, changed, &mut changes)?;
        Ok(changes)
    }

    /// Like [`Differ::diff_and_patch`], handing each change to `sink` as it
    /// is produced. On error, changes already pushed stay pushed and
    /// `original` stays partially updated.
    pub fn diff_and_patch_into<S: ChangeSink>(
        &self,
        original: Option<&mut Object>,
        changed: &Object,
        sink: &mut S,
    ) -> DiffResult<()> {
        let Some(original) = original else {
            debug!(shape = changed.shape().name(), "no original, replacing root");
            emit(sink, Change::replace(Pointer::root(), changed.to_json()))?;
            return Ok(());
        };
        debug!(shape = changed.shape().name(), "diff and patch");
        self.diff_object(original, changed, &Pointer::root(), sink)
    }

    pub(crate) fn diff_object(
        &self,
        original: &mut Object,
        changed: &Object,
        path: &Pointer,
        sink: &mut dyn ChangeSink,
    ) -> DiffResult<()> {
        let shape = Arc::clone(original.shape());
        for (changed_field, changed_value) in changed.fields() {
            if self.strategies.is_skipped(changed_field) {
                continue;
            }
            let unbound = || ContractViolation::UnboundField {
                shape: shape.name().to_string(),
                field: changed_field.name().to_string(),
            };
            let idx = (self.strategies.same_field())(&shape, changed_field).ok_or_else(unbound)?;
            let field = shape.fields().get(idx).ok_or_else(unbound)?;
            let field_path = path.child(field.name());

            match field.category() {
                Category::Value => self.diff_value_field(original, idx, field, changed_value, &field_path, sink)?,
                Category::Container => {
                    self.diff_container_field(original, idx, field, changed_value, &field_path, sink)?
                }
                Category::Map => self.diff_map_field(original, idx, field, changed_value, &field_path, sink)?,
                Category::List => self.diff_list_field(original, idx, field, changed_value, &field_path, sink)?,
            }
        }
        Ok(())
    }

    fn diff_value_field(
        &self,
        original: &mut Object,
        idx: usize,
        field: &FieldDescriptor,
        changed: &Node,
        path: &Pointer,
        sink: &mut dyn ChangeSink,
    ) -> DiffResult<()> {
        expect_kind(changed, field.ty(), path)?;
        let current = original.value_at(idx).ok_or_else(|| missing_slot(original, idx))?;
        if (self.strategies.equals())(current, changed) {
            return Ok(());
        }
        if (self.strategies.set_value())(field, original, changed.clone()) {
            emit(sink, Change::replace(path.clone(), changed.to_json()))?;
        } else {
            warn!(%path, "write vetoed");
        }
        Ok(())
    }

    fn diff_container_field(
        &self,
        original: &mut Object,
        idx: usize,
        field: &FieldDescriptor,
        changed: &Node,
        path: &Pointer,
        sink: &mut dyn ChangeSink,
    ) -> DiffResult<()> {
        expect_kind(changed, field.ty(), path)?;
        let current_is_null = original
            .value_at(idx)
            .ok_or_else(|| missing_slot(original, idx))?
            .is_null();

        match (current_is_null, changed) {
            (true, Node::Null) => Ok(()),
            (false, Node::Null) => {
                if (self.strategies.set_value())(field, original, Node::Null) {
                    emit(sink, Change::remove(path.clone()))?;
                } else {
                    warn!(%path, "write vetoed");
                }
                Ok(())
            }
            (true, _) => {
                let created = self.build(field.ty(), changed, path)?;
                let value = created.to_json();
                if (self.strategies.set_value())(field, original, created) {
                    emit(sink, Change::add(path.clone(), value))?;
                } else {
                    warn!(%path, "write vetoed");
                }
                Ok(())
            }
            (false, Node::Object(changed)) => match original.value_at_mut(idx) {
                Some(Node::Object(current)) => self.diff_object(current, changed, path, sink),
                Some(other) => Err(mismatch(path, field.ty(), other)),
                None => Err(ContractViolation::Internal(format!("no slot {idx} at {path}"))),
            },
            (false, other) => Err(mismatch(path, field.ty(), other)),
        }
    }

    fn diff_map_field(
        &self,
        original: &mut Object,
        idx: usize,
        field: &FieldDescriptor,
        changed: &Node,
        path: &Pointer,
        sink: &mut dyn ChangeSink,
    ) -> DiffResult<()> {
        expect_kind(changed, field.ty(), path)?;
        let value_ty = field
            .ty()
            .item_type()
            .ok_or_else(|| mismatch(path, field.ty(), changed))?;
        let changed = changed.as_map();
        match original.value_at_mut(idx) {
            Some(Node::Map(current)) => self.diff_map(current, changed, value_ty, path, sink),
            Some(Node::Null) => Err(ContractViolation::UninitializedMap {
                field: field.name().to_string(),
                path: path.to_string(),
            }),
            Some(other) => Err(mismatch(path, field.ty(), other)),
            None => Err(ContractViolation::Internal(format!("no slot {idx} at {path}"))),
        }
    }

    fn diff_list_field(
        &self,
        original: &mut Object,
        idx: usize,
        field: &FieldDescriptor,
        changed: &Node,
        path: &Pointer,
        sink: &mut dyn ChangeSink,
    ) -> DiffResult<()> {
        expect_kind(changed, field.ty(), path)?;
        let elem = field
            .ty()
            .item_type()
            .ok_or_else(|| mismatch(path, field.ty(), changed))?;
        let changed = changed.as_list();
        match original.value_at_mut(idx) {
            Some(Node::List(current)) => self.diff_list(current, changed, elem, path, sink),
            Some(Node::Null) => Err(ContractViolation::UninitializedList {
                field: field.name().to_string(),
                path: path.to_string(),
            }),
            Some(other) => Err(mismatch(path, field.ty(), other)),
            None => Err(ContractViolation::Internal(format!("no slot {idx} at {path}"))),
        }
    }

    /// Reconcile a string-keyed map in place. Keys missing or null in
    /// `changed` are removed first, then new keys are added and existing
    /// ones updated, in `changed` order.
    fn diff_map(
        &self,
        current: &mut NodeMap,
        changed: Option<&NodeMap>,
        value_ty: &TypeRef,
        path: &Pointer,
        sink: &mut dyn ChangeSink,
    ) -> DiffResult<()> {
        let Some(changed) = changed else {
            for key in current.keys() {
                emit(sink, Change::remove(path.child(key.as_str())))?;
            }
            current.clear();
            return Ok(());
        };

        let stale: Vec<String> = current
            .keys()
            .filter(|key| changed.get(key.as_str()).map_or(true, Node::is_null))
            .cloned()
            .collect();
        for key in stale {
            current.shift_remove(&key);
            emit(sink, Change::remove(path.child(key)))?;
        }

        for (key, value) in changed {
            if value.is_null() {
                continue;
            }
            let entry_path = path.child(key.as_str());
            match current.get_mut(key) {
                Some(existing) => self.diff_slot(existing, value, value_ty, &entry_path, sink)?,
                None => {
                    expect_kind(value, value_ty, &entry_path)?;
                    let created = if value_ty.is_scalar() {
                        value.clone()
                    } else {
                        self.build(value_ty, value, &entry_path)?
                    };
                    let json = created.to_json();
                    current.insert(key.clone(), created);
                    emit(sink, Change::add(entry_path, json))?;
                }
            }
        }
        Ok(())
    }

    /// Diff a value that lives directly in a map or list slot, where writes
    /// go straight to the slot.
    pub(crate) fn diff_slot(
        &self,
        current: &mut Node,
        changed: &Node,
        ty: &TypeRef,
        path: &Pointer,
        sink: &mut dyn ChangeSink,
    ) -> DiffResult<()> {
        expect_kind(changed, ty, path)?;
        if ty.is_scalar() {
            if !(self.strategies.equals())(current, changed) {
                *current = changed.clone();
                emit(sink, Change::replace(path.clone(), changed.to_json()))?;
            }
            return Ok(());
        }

        if changed.is_null() {
            if !current.is_null() {
                *current = Node::Null;
                emit(sink, Change::remove(path.clone()))?;
            }
            return Ok(());
        }
        if current.is_null() {
            let created = self.build(ty, changed, path)?;
            emit(sink, Change::add(path.clone(), created.to_json()))?;
            *current = created;
            return Ok(());
        }

        match (current, changed) {
            (Node::Object(current), Node::Object(changed)) => self.diff_object(current, changed, path, sink),
            (Node::List(current), Node::List(changed)) => {
                let elem = ty.item_type().ok_or_else(|| mismatch(path, ty, &Node::Null))?;
                self.diff_list(current, Some(changed.as_slice()), elem, path, sink)
            }
            (Node::Map(current), Node::Map(changed)) => {
                let value_ty = ty.item_type().ok_or_else(|| mismatch(path, ty, &Node::Null))?;
                self.diff_map(current, Some(changed), value_ty, path, sink)
            }
            (current, _) => Err(mismatch(path, ty, current)),
        }
    }

    /// A new value of type `ty` populated from `changed`. The changes made
    /// while populating it are not reported; the caller emits one `add`.
    pub(crate) fn build(&self, ty: &TypeRef, changed: &Node, path: &Pointer) -> DiffResult<Node> {
        let mut created = (self.strategies.create())(ty)?;
        if created.is_null() {
            return Err(ContractViolation::NotConstructible(ty.to_string()));
        }
        self.diff_slot(&mut created, changed, ty, path, &mut Discard)?;
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Shape;
    use serde_json::json;

    fn shapes() -> (Arc<Shape>, Arc<Shape>) {
        let address = Shape::builder("Address")
            .field("city", TypeRef::string())
            .field("zip", TypeRef::string())
            .build();
        let person = Shape::builder("Person")
            .field("name", TypeRef::string())
            .field("age", TypeRef::int32())
            .field("address", TypeRef::object(&address))
            .field("props", TypeRef::map(TypeRef::string()))
            .build();
        (person, address)
    }

    #[test]
    fn value_change_is_replace() {
        let (person, _) = shapes();
        let mut original = Object::new(&person).with("name", "a").with("age", 1);
        let changed = Object::new(&person).with("name", "b").with("age", 1);
        let changes = Differ::default().diff_and_patch(Some(&mut original), &changed).unwrap();
        assert_eq!(changes, [Change::replace(Pointer::parse("/name").unwrap(), json!("b"))]);
        assert_eq!(original, changed);
    }

    #[test]
    fn container_add_carries_whole_value() {
        let (person, address) = shapes();
        let mut original = Object::new(&person);
        let changed = Object::new(&person).with("address", Object::new(&address).with("city", "Oslo"));
        let changes = Differ::default().diff_and_patch(Some(&mut original), &changed).unwrap();
        assert_eq!(
            changes,
            [Change::add(
                Pointer::parse("/address").unwrap(),
                json!({"city": "Oslo", "zip": null})
            )]
        );
        assert_eq!(original, changed);
    }

    #[test]
    fn container_remove_and_recurse() {
        let (person, address) = shapes();
        let mut original = Object::new(&person).with("address", Object::new(&address).with("city", "Oslo"));
        let changed = Object::new(&person).with("address", Object::new(&address).with("city", "Rome"));
        let changes = Differ::default().diff_and_patch(Some(&mut original), &changed).unwrap();
        assert_eq!(changes, [Change::replace(Pointer::parse("/address/city").unwrap(), json!("Rome"))]);

        let cleared = Object::new(&person);
        let changes = Differ::default().diff_and_patch(Some(&mut original), &cleared).unwrap();
        assert_eq!(changes, [Change::remove(Pointer::parse("/address").unwrap())]);
        assert_eq!(original.get("address"), Some(&Node::Null));
    }

    #[test]
    fn map_entries() {
        let (person, _) = shapes();
        let mut original = Object::new(&person).with("props", Node::map([("a", "1"), ("b", "2"), ("c", "3")]));
        let changed = Object::new(&person).with("props", Node::map([("c", "30"), ("b", "2"), ("d", "4")]));
        let changes = Differ::default().diff_and_patch(Some(&mut original), &changed).unwrap();
        let rendered: Vec<String> = changes.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["remove:/props/a=", "replace:/props/c=30", "add:/props/d=4"]);
        assert_eq!(original, changed);
    }

    #[test]
    fn null_map_is_contract_violation() {
        let (person, _) = shapes();
        let mut original = Object::new(&person).with("props", Node::Null);
        let changed = Object::new(&person);
        let err = Differ::default().diff_and_patch(Some(&mut original), &changed).unwrap_err();
        assert!(matches!(err, ContractViolation::UninitializedMap { .. }));
    }

    #[test]
    fn wrong_variant_is_contract_violation() {
        let (person, _) = shapes();
        let other = Shape::builder("Person").field("name", TypeRef::list(TypeRef::string())).build();
        let mut original = Object::new(&person);
        let changed = Object::new(&other).with("name", vec!["x"]);
        let err = Differ::default().diff_and_patch(Some(&mut original), &changed).unwrap_err();
        assert!(matches!(err, ContractViolation::TypeMismatch { found: "list", .. }));
    }

    #[test]
    fn unbound_field() {
        let (person, _) = shapes();
        let other = Shape::builder("Other").field("nickname", TypeRef::string()).build();
        let mut original = Object::new(&person);
        let changed = Object::new(&other).with("nickname", "x");
        let err = Differ::default().diff_and_patch(Some(&mut original), &changed).unwrap_err();
        assert_eq!(
            err,
            ContractViolation::UnboundField {
                shape: "Person".into(),
                field: "nickname".into()
            }
        );
    }

    #[test]
    fn vetoed_write_emits_nothing() {
        let (person, _) = shapes();
        let differ = Differ::new(
            Strategies::default()
                .with_set_value(|field, obj, value| field.name() != "age" && obj.set(field.name(), value).is_some()),
        );
        let mut original = Object::new(&person).with("age", 1);
        let changed = Object::new(&person).with("age", 2).with("name", "x");
        let changes = differ.diff_and_patch(Some(&mut original), &changed).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(original.get("age"), Some(&Node::from(1)));
    }
}
