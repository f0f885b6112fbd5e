#![allow(dead_code)]

use std::sync::Arc;

use modelpatch::{Applyer, Change, Constraint, Differ, Object, Shape, Strategies, TypeRef};

/// Shapes for an order-management style graph.
pub struct Catalog {
    pub address: Arc<Shape>,
    pub line: Arc<Shape>,
    pub order: Arc<Shape>,
}

pub fn catalog() -> Catalog {
    let address = Shape::builder("Address")
        .field("city", TypeRef::string())
        .field("zip", TypeRef::string())
        .build();
    let line = Shape::builder("Line")
        .field("sku", TypeRef::string())
        .field("qty", TypeRef::int32())
        .constraint(Constraint::range(0.0, 1000.0))
        .build();
    let order = Shape::builder("Order")
        .field("id", TypeRef::int64())
        .read_only()
        .field("customer", TypeRef::string())
        .constraint(Constraint::Required)
        .field("status", TypeRef::enumeration(["Open", "Shipped", "Closed"]))
        .field("shipTo", TypeRef::object(&address))
        .field("lines", TypeRef::list(TypeRef::object(&line)))
        .field("tags", TypeRef::list(TypeRef::string()))
        .field("attrs", TypeRef::map(TypeRef::string()))
        .build();
    Catalog { address, line, order }
}

impl Catalog {
    pub fn line(&self, sku: &str, qty: i32) -> Object {
        Object::new(&self.line).with("sku", sku).with("qty", qty)
    }

    pub fn address(&self, city: &str, zip: &str) -> Object {
        Object::new(&self.address).with("city", city).with("zip", zip)
    }

    pub fn order(&self) -> Object {
        Object::new(&self.order)
            .with("id", 7i64)
            .with("customer", "acme")
    }
}

/// Strategies that identify order lines by SKU.
pub fn by_sku() -> Strategies {
    Strategies::default().with_identity_field("sku")
}

pub fn differ() -> Differ {
    Differ::new(by_sku())
}

/// Diff `changed` into a copy of `original`, then replay the changes onto a
/// second copy and check both end up equal to `changed`.
pub fn diff_and_replay(original: &Object, changed: &Object) -> Vec<Change> {
    let mut patched = original.clone();
    let changes = differ()
        .diff_and_patch(Some(&mut patched), changed)
        .expect("diff succeeds");
    assert_eq!(&patched, changed, "diff leaves original equal to changed");

    let mut replayed = original.clone();
    Applyer::new(by_sku().with_validate(|_, _, _| Ok(())))
        .apply_changes(&mut replayed, &changes)
        .expect("replay succeeds");
    assert_eq!(&replayed, changed, "replay reproduces changed");
    changes
}

pub fn rendered(changes: &[Change]) -> Vec<String> {
    changes.iter().map(ToString::to_string).collect()
}
