//! Value classifier: picks the comparison strategy for a declared type.

use crate::model::{FieldDescriptor, TypeRef};

/// Comparison strategy for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Scalar or string: compared by equality, replaced as a whole.
    Value,
    /// Nested object: recursed into field by field.
    Container,
    /// Ordered list: reconciled by identity.
    List,
    /// String-keyed map: reconciled by key.
    Map,
}

/// Classify a declared type. Total: every type lands in exactly one category.
pub fn classify(ty: &TypeRef) -> Category {
    match ty {
        TypeRef::Scalar(_) => Category::Value,
        TypeRef::Map(_) => Category::Map,
        TypeRef::List(_) => Category::List,
        TypeRef::Object(_) => Category::Container,
    }
}

impl FieldDescriptor {
    pub fn category(&self) -> Category {
        classify(self.ty())
    }
}
