mod common;

use common::{by_sku, catalog, differ};
use modelpatch::{
    changes_fingerprint, from_json_patch, to_json_patch, ApplyError, Applyer, Change, ContractViolation,
    Node, OperationError, Pointer, Scalar, ValidationError,
};
use serde_json::json;

fn applyer() -> Applyer {
    Applyer::new(by_sku())
}

fn operation_error(err: ApplyError) -> OperationError {
    match err {
        ApplyError::InvalidOperation { source, .. } => source,
        ApplyError::Contract(violation) => panic!("unexpected contract violation: {violation}"),
    }
}

#[test]
fn json_patch_document_applies_in_order() {
    let c = catalog();
    let mut order = c.order().with("shipTo", c.address("Oslo", "0150"));
    let patch = from_json_patch(&json!([
        {"op": "replace", "path": "/customer", "value": "globex"},
        {"op": "replace", "path": "/status", "value": "shipped"},
        {"op": "add", "path": "/tags/-", "value": "rush"},
        {"op": "add", "path": "/lines/0", "value": {"sku": "a", "qty": 2}},
        {"op": "replace", "path": "/lines/0/qty", "value": "12"},
        {"op": "add", "path": "/attrs/gift", "value": "yes"},
        {"op": "remove", "path": "/shipTo"},
    ]))
    .unwrap();

    let touched = applyer().apply_changes(&mut order, &patch).unwrap();
    let names: Vec<&str> = touched.iter().map(|f| f.name()).collect();
    assert_eq!(names, ["customer", "status", "tags", "lines", "qty", "attrs", "shipTo"]);

    let expected = c
        .order()
        .with("customer", "globex")
        .with("status", Scalar::Enum("Shipped".into()))
        .with("tags", vec!["rush"])
        .with("lines", vec![c.line("a", 12)])
        .with("attrs", Node::map([("gift", "yes")]));
    assert_eq!(order, expected);
}

#[test]
fn validation_failures_name_the_change() {
    let c = catalog();
    let mut order = c.order().with("lines", vec![c.line("a", 1)]);

    let err = applyer()
        .apply_changes(&mut order, &[Change::replace(Pointer::parse("/lines/0/qty").unwrap(), json!(5000))])
        .unwrap_err();
    assert!(!err.is_fatal());
    assert_eq!(err.change().map(|c| c.path.to_string()).as_deref(), Some("/lines/0/qty"));
    assert!(matches!(operation_error(err), OperationError::Validation(ValidationError::Range { .. })));

    let err = applyer()
        .apply_changes(&mut order, &[Change::replace(Pointer::parse("/id").unwrap(), json!(8))])
        .unwrap_err();
    assert_eq!(
        operation_error(err),
        OperationError::Validation(ValidationError::ReadOnly("id".into()))
    );

    let err = applyer()
        .apply_changes(&mut order, &[Change::replace(Pointer::parse("/customer").unwrap(), json!(null))])
        .unwrap_err();
    assert_eq!(
        operation_error(err),
        OperationError::Validation(ValidationError::Required("customer".into()))
    );
    assert_eq!(order, c.order().with("lines", vec![c.line("a", 1)]));
}

#[test]
fn unsupported_operations_are_rejected() {
    let c = catalog();
    let mut order = c.order();
    let patch = from_json_patch(&json!([
        {"op": "copy", "path": "/customer", "from": "/status"},
    ]))
    .unwrap();
    let err = applyer().apply_changes(&mut order, &patch).unwrap_err();
    assert_eq!(operation_error(err), OperationError::Unsupported("copy"));
}

#[test]
fn broken_graph_is_fatal() {
    let c = catalog();
    let mut order = c.order().with("shipTo", "not an address");
    let err = applyer()
        .apply_changes(&mut order, &[Change::replace(Pointer::parse("/shipTo/city").unwrap(), json!("Oslo"))])
        .unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err, ApplyError::Contract(ContractViolation::TypeMismatch { .. })));
}

#[test]
fn diff_output_survives_the_wire() {
    let c = catalog();
    let original = c
        .order()
        .with("lines", vec![c.line("a", 1), c.line("b", 2)])
        .with("tags", vec!["x", "y"]);
    let changed = c
        .order()
        .with("customer", "globex")
        .with("lines", vec![c.line("b", 2), c.line("c", 3), c.line("a", 1)])
        .with("tags", vec!["y"]);

    let mut patched = original.clone();
    let changes = differ().diff_and_patch(Some(&mut patched), &changed).unwrap();
    let wire = to_json_patch(&changes);
    let decoded = from_json_patch(&wire).unwrap();
    assert_eq!(decoded, changes);
    assert_eq!(changes_fingerprint(&decoded), changes_fingerprint(&changes));

    let mut replayed = original.clone();
    applyer().apply_changes(&mut replayed, &decoded).unwrap();
    assert_eq!(replayed, changed);
}
