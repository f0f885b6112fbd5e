//! Order-sensitive fingerprint of a change list.
//!
//! djb2-style state mixing (`state * 33 + n`) with per-kind discriminators,
//! so `[a, b]` and `[b, a]` fingerprint differently. Not a cryptographic
//! hash: use it to detect "same patch" cheaply, never for integrity.

use serde_json::Value;

use super::types::{Change, Operation};

const START_STATE: u64 = 5381;

const NULL_CONST: u64 = 982_452_847;
const TRUE_CONST: u64 = 982_453_247;
const FALSE_CONST: u64 = 982_454_243;
const ARRAY_CONST: u64 = 982_452_259;
const STRING_CONST: u64 = 982_453_601;
const OBJECT_CONST: u64 = 982_454_533;
const NUMBER_CONST: u64 = 982_454_837;
const ABSENT_CONST: u64 = 982_455_029;

fn update_num(state: u64, num: u64) -> u64 {
    state.wrapping_shl(5).wrapping_add(state).wrapping_add(num)
}

fn update_str(mut state: u64, s: &str) -> u64 {
    state = update_num(state, STRING_CONST);
    state = update_num(state, s.len() as u64);
    for b in s.bytes() {
        state = update_num(state, u64::from(b));
    }
    state
}

fn update_json(state: u64, json: &Value) -> u64 {
    match json {
        Value::Null => update_num(state, NULL_CONST),
        Value::Bool(b) => update_num(state, if *b { TRUE_CONST } else { FALSE_CONST }),
        // Textual form keeps 1 and 1.0 apart and covers the full u64/i64 range.
        Value::Number(n) => update_str(update_num(state, NUMBER_CONST), &n.to_string()),
        Value::String(s) => update_str(state, s),
        Value::Array(items) => {
            let mut state = update_num(state, ARRAY_CONST);
            for item in items {
                state = update_json(state, item);
            }
            state
        }
        Value::Object(map) => {
            let mut state = update_num(state, OBJECT_CONST);
            for (k, v) in map {
                state = update_str(state, k);
                state = update_json(state, v);
            }
            state
        }
    }
}

fn op_const(op: Operation) -> u64 {
    match op {
        Operation::Add => 1,
        Operation::Remove => 2,
        Operation::Replace => 3,
        Operation::Move => 4,
        Operation::Copy => 5,
        Operation::Test => 6,
        Operation::Invalid => 7,
    }
}

/// Fingerprint of `changes`, sensitive to their order.
///
/// Object payloads are hashed in their iteration order, so two patches whose
/// object values list the same keys differently fingerprint differently.
pub fn changes_fingerprint(changes: &[Change]) -> u64 {
    let mut state = update_num(START_STATE, changes.len() as u64);
    for change in changes {
        state = update_num(state, op_const(change.op));
        state = update_str(state, &change.path.to_string());
        state = match &change.from {
            Some(from) => update_str(state, &from.to_string()),
            None => update_num(state, ABSENT_CONST),
        };
        state = match &change.value {
            Some(value) => update_json(state, value),
            None => update_num(state, ABSENT_CONST),
        };
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelpatch_pointer::Pointer;
    use serde_json::json;

    fn ptr(s: &str) -> Pointer {
        Pointer::parse(s).unwrap()
    }

    #[test]
    fn equal_lists_equal_fingerprints() {
        let a = vec![Change::replace(ptr("/a"), json!(1)), Change::remove(ptr("/b/0"))];
        let b = a.clone();
        assert_eq!(changes_fingerprint(&a), changes_fingerprint(&b));
    }

    #[test]
    fn order_matters() {
        let x = Change::replace(ptr("/a"), json!(1));
        let y = Change::remove(ptr("/b/0"));
        assert_ne!(
            changes_fingerprint(&[x.clone(), y.clone()]),
            changes_fingerprint(&[y, x])
        );
    }

    #[test]
    fn payload_and_kind_matter() {
        let base = changes_fingerprint(&[Change::replace(ptr("/a"), json!(1))]);
        assert_ne!(base, changes_fingerprint(&[Change::replace(ptr("/a"), json!(2))]));
        assert_ne!(base, changes_fingerprint(&[Change::replace(ptr("/a"), json!("1"))]));
        assert_ne!(base, changes_fingerprint(&[Change::add(ptr("/a"), json!(1))]));
        assert_ne!(changes_fingerprint(&[]), base);
    }

    #[test]
    fn move_source_matters() {
        let a = Change::move_to(ptr("/l/0"), ptr("/l/1"));
        let b = Change::move_to(ptr("/l/0"), ptr("/l/2"));
        assert_ne!(changes_fingerprint(&[a]), changes_fingerprint(&[b]));
    }
}
