//! The structured-value model the engines operate on.
//!
//! A [`Shape`] declares the ordered, typed fields of an object type; an
//! [`Object`] is one instance of it. Field lookup by name goes through the
//! shape, so two objects of different shapes can be reconciled field by
//! field without runtime type introspection.

pub mod json;
pub mod node;
pub mod shape;

pub use node::{empty_slot, Node, NodeMap, Object, Scalar};
pub use shape::{FieldDescriptor, ScalarType, Shape, ShapeBuilder, TypeRef};
