//! List reconciliation.
//!
//! Three passes over the live list:
//!
//! 1. bind every original element to the first changed element it is the
//!    same as, removing originals that match nothing;
//! 2. create and insert every changed element left unbound;
//! 3. sweep the target positions in one direction, moving each bound
//!    element into place and diffing it against its changed counterpart.
//!
//! The sweep direction is picked from the aggregate displacement of bound
//! elements: mostly-behind sweeps ascending, mostly-ahead descending. It is a
//! heuristic; the move count is not minimal in general.

use std::cmp::Ordering;

use modelpatch_pointer::Pointer;
use tracing::trace;

use super::{emit, ChangeSink, Differ, Discard};
use crate::change::Change;
use crate::error::{ContractViolation, DiffResult};
use crate::model::{Node, TypeRef};

fn position(owners: &[usize], target: usize, path: &Pointer) -> DiffResult<usize> {
    owners
        .iter()
        .position(|&owner| owner == target)
        .ok_or_else(|| ContractViolation::Internal(format!("element for position {target} of {path} is unbound")))
}

fn null_element(path: &Pointer, side: &str) -> ContractViolation {
    ContractViolation::Internal(format!("unexpected null element in {side} list at {path}"))
}

impl Differ {
    /// Reconcile `current` with `changed`, elements typed `elem`. `None` for
    /// `changed` empties the list, one `remove` of index 0 per element.
    pub(crate) fn diff_list(
        &self,
        current: &mut Vec<Node>,
        changed: Option<&[Node]>,
        elem: &TypeRef,
        path: &Pointer,
        sink: &mut dyn ChangeSink,
    ) -> DiffResult<()> {
        let Some(changed) = changed else {
            trace!(%path, len = current.len(), "changed list is null");
            let len = current.len();
            current.clear();
            for _ in 0..len {
                emit(sink, Change::remove(path.index(0)))?;
            }
            return Ok(());
        };

        // Scalar elements are their own identity and their own copy.
        let complex = !elem.is_scalar();
        let (is_same, create_from) = if complex {
            let is_same = self
                .strategies
                .is_same()
                .ok_or(ContractViolation::MissingCollaborator("is_same"))?;
            let create_from = self
                .strategies
                .create_from()
                .ok_or(ContractViolation::MissingCollaborator("create_from"))?;
            (Some(is_same), Some(create_from))
        } else {
            (None, None)
        };
        if current.iter().any(Node::is_null) {
            return Err(null_element(path, "original"));
        }
        if changed.iter().any(Node::is_null) {
            return Err(null_element(path, "changed"));
        }
        let equals = self.strategies.equals();
        let same = |changed: &Node, original: &Node| match is_same {
            Some(is_same) => is_same(changed, original),
            None => equals(changed, original),
        };

        // Pass 1: bind and prune. `owners[i]` is the changed index bound to
        // `current[i]`.
        let mut bound = vec![false; changed.len()];
        let mut owners: Vec<usize> = Vec::with_capacity(changed.len());
        let mut i = 0;
        while i < current.len() {
            match changed.iter().position(|item| same(item, &current[i])) {
                Some(j) if bound[j] => {
                    return Err(ContractViolation::DuplicateIdentity {
                        path: path.index(i).to_string(),
                    });
                }
                Some(j) => {
                    bound[j] = true;
                    owners.push(j);
                    i += 1;
                }
                None => {
                    current.remove(i);
                    emit(sink, Change::remove(path.index(i)))?;
                }
            }
        }
        trace!(%path, kept = current.len(), target = changed.len(), "bound");

        // Pass 2: insert unbound changed elements at their target positions.
        for (pos, item) in changed.iter().enumerate() {
            if bound[pos] {
                continue;
            }
            if pos > current.len() {
                return Err(ContractViolation::Internal(format!(
                    "insert position {pos} past the end of {path}"
                )));
            }
            let item_path = path.index(pos);
            let mut created = match create_from {
                Some(create_from) => create_from(item, elem)?,
                None => item.clone(),
            };
            if complex {
                self.diff_slot(&mut created, item, elem, &item_path, &mut Discard)?;
            }
            let value = created.to_json();
            current.insert(pos, created);
            owners.insert(pos, pos);
            bound[pos] = true;
            emit(sink, Change::add(item_path, value))?;
        }
        if current.len() != changed.len() {
            return Err(ContractViolation::Internal(format!(
                "{path} has {} elements after insertion, expected {}",
                current.len(),
                changed.len()
            )));
        }

        // Pass 3: move into place and update.
        let mut weight: i64 = 0;
        for pos in 0..changed.len() {
            match position(&owners, pos, path)?.cmp(&pos) {
                Ordering::Less => weight -= 1,
                Ordering::Greater => weight += 1,
                Ordering::Equal => {}
            }
        }
        trace!(%path, weight, "reorder");

        let mut move_and_update = |pos: usize| -> DiffResult<()> {
            let at = position(&owners, pos, path)?;
            let item_path = path.index(pos);
            if at != pos {
                let item = current.remove(at);
                current.insert(pos, item);
                let owner = owners.remove(at);
                owners.insert(pos, owner);
                emit(sink, Change::move_to(item_path.clone(), path.index(at)))?;
            }
            if complex {
                self.diff_slot(&mut current[pos], &changed[pos], elem, &item_path, sink)?;
            }
            Ok(())
        };
        if weight <= 0 {
            for pos in 0..changed.len() {
                move_and_update(pos)?;
            }
        } else {
            for pos in (0..changed.len()).rev() {
                move_and_update(pos)?;
            }
        }
        Ok(())
    }
}
