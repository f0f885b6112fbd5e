//! Instance values: scalars, nodes and shaped objects.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;

use super::shape::{FieldDescriptor, Shape, TypeRef};

/// String-keyed map payload. Equality ignores insertion order, iteration
/// preserves it.
pub type NodeMap = IndexMap<String, Node>;

/// Opaque leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Enum(String),
    Timestamp(DateTime<FixedOffset>),
}

impl Scalar {
    pub fn kind(&self) -> &'static str {
        match self {
            Scalar::Bool(_) => "bool",
            Scalar::Int(_) => "int",
            Scalar::Float(_) => "float",
            Scalar::Str(_) => "string",
            Scalar::Enum(_) => "enum",
            Scalar::Timestamp(_) => "timestamp",
        }
    }
}

/// A structured value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Node {
    #[default]
    Null,
    Scalar(Scalar),
    Object(Object),
    List(Vec<Node>),
    Map(NodeMap),
}

impl Node {
    /// Build a map node from key/value pairs.
    pub fn map<I, K, V>(entries: I) -> Node
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Node>,
    {
        Node::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build a list node.
    pub fn list<I, V>(items: I) -> Node
    where
        I: IntoIterator<Item = V>,
        V: Into<Node>,
    {
        Node::List(items.into_iter().map(Into::into).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Scalar(s) => s.kind(),
            Node::Object(_) => "object",
            Node::List(_) => "list",
            Node::Map(_) => "map",
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Node::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(Scalar::Str(s) | Scalar::Enum(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Node::Scalar(Scalar::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Node::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            Node::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Node]> {
        match self {
            Node::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&NodeMap> {
        match self {
            Node::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut NodeMap> {
        match self {
            Node::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl From<bool> for Node {
    fn from(v: bool) -> Self {
        Node::Scalar(Scalar::Bool(v))
    }
}

impl From<i32> for Node {
    fn from(v: i32) -> Self {
        Node::Scalar(Scalar::Int(i64::from(v)))
    }
}

impl From<i64> for Node {
    fn from(v: i64) -> Self {
        Node::Scalar(Scalar::Int(v))
    }
}

impl From<f64> for Node {
    fn from(v: f64) -> Self {
        Node::Scalar(Scalar::Float(v))
    }
}

impl From<&str> for Node {
    fn from(v: &str) -> Self {
        Node::Scalar(Scalar::Str(v.to_string()))
    }
}

impl From<String> for Node {
    fn from(v: String) -> Self {
        Node::Scalar(Scalar::Str(v))
    }
}

impl From<Scalar> for Node {
    fn from(v: Scalar) -> Self {
        Node::Scalar(v)
    }
}

impl From<DateTime<FixedOffset>> for Node {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Node::Scalar(Scalar::Timestamp(v))
    }
}

impl From<Object> for Node {
    fn from(v: Object) -> Self {
        Node::Object(v)
    }
}

impl<T: Into<Node>> From<Vec<T>> for Node {
    fn from(v: Vec<T>) -> Self {
        Node::list(v)
    }
}

impl<T: Into<Node>> From<Option<T>> for Node {
    fn from(v: Option<T>) -> Self {
        v.map_or(Node::Null, Into::into)
    }
}

/// The empty value a freshly created slot of type `ty` holds: lists and maps
/// start empty, everything else starts null.
pub fn empty_slot(ty: &TypeRef) -> Node {
    match ty {
        TypeRef::List(_) => Node::List(Vec::new()),
        TypeRef::Map(_) => Node::Map(NodeMap::new()),
        TypeRef::Scalar(_) | TypeRef::Object(_) => Node::Null,
    }
}

/// An instance of a [`Shape`]: one value slot per declared field.
#[derive(Debug, Clone)]
pub struct Object {
    shape: Arc<Shape>,
    values: Vec<Node>,
}

impl Object {
    /// An empty instance: every slot holds [`empty_slot`] of its field type.
    pub fn new(shape: &Arc<Shape>) -> Self {
        Self {
            shape: Arc::clone(shape),
            values: shape.fields().iter().map(|f| empty_slot(f.ty())).collect(),
        }
    }

    pub fn shape(&self) -> &Arc<Shape> {
        &self.shape
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.shape.field_index(name).map(|idx| &self.values[idx])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.shape.field_index(name).map(|idx| &mut self.values[idx])
    }

    /// Set a field by name, returning the previous value, or `None` if the
    /// shape has no such field (in which case nothing changes).
    pub fn set(&mut self, name: &str, value: impl Into<Node>) -> Option<Node> {
        let idx = self.shape.field_index(name)?;
        Some(std::mem::replace(&mut self.values[idx], value.into()))
    }

    /// Builder-style [`Object::set`].
    ///
    /// # Panics
    ///
    /// Panics if the shape has no field called `name`.
    pub fn with(mut self, name: &str, value: impl Into<Node>) -> Self {
        if self.set(name, value).is_none() {
            panic!("shape `{}` has no field `{name}`", self.shape.name());
        }
        self
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.shape.field_index(name)
    }

    /// Slot at a field index obtained from this object's shape.
    pub fn value_at(&self, idx: usize) -> Option<&Node> {
        self.values.get(idx)
    }

    pub fn value_at_mut(&mut self, idx: usize) -> Option<&mut Node> {
        self.values.get_mut(idx)
    }

    /// Field descriptors paired with their current values, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&FieldDescriptor, &Node)> {
        self.shape.fields().iter().zip(self.values.iter())
    }
}

/// Objects are equal when they have the same shape name and the same
/// field names holding equal values, in order.
impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        if self.shape.name() != other.shape.name() || self.values.len() != other.values.len() {
            return false;
        }
        self.fields()
            .zip(other.fields())
            .all(|((fa, va), (fb, vb))| fa.name() == fb.name() && va == vb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::shape::Shape;

    fn item_shape() -> Arc<Shape> {
        Shape::builder("Item")
            .field("id", TypeRef::string())
            .field("tags", TypeRef::list(TypeRef::string()))
            .field("attrs", TypeRef::map(TypeRef::int64()))
            .field("child", TypeRef::object(&Shape::builder("Child").build()))
            .build()
    }

    #[test]
    fn new_object_has_initialized_collections() {
        let obj = Object::new(&item_shape());
        assert_eq!(obj.get("id"), Some(&Node::Null));
        assert_eq!(obj.get("tags"), Some(&Node::List(vec![])));
        assert_eq!(obj.get("attrs"), Some(&Node::Map(NodeMap::new())));
        assert_eq!(obj.get("child"), Some(&Node::Null));
    }

    #[test]
    fn set_unknown_field_is_none() {
        let mut obj = Object::new(&item_shape());
        assert_eq!(obj.set("id", "a"), Some(Node::Null));
        assert_eq!(obj.set("nope", 1), None);
        assert_eq!(obj.get("id").and_then(Node::as_str), Some("a"));
    }

    #[test]
    fn equality_is_by_shape_name_and_values() {
        let shape = item_shape();
        let a = Object::new(&shape).with("id", "x");
        let b = Object::new(&shape).with("id", "x");
        let c = Object::new(&shape).with("id", "y");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn map_equality_ignores_order() {
        let a = Node::map([("a", 1), ("b", 2)]);
        let b = Node::map([("b", 2), ("a", 1)]);
        assert_eq!(a, b);
    }

    #[test]
    fn conversions() {
        assert_eq!(Node::from(Some(3)), Node::Scalar(Scalar::Int(3)));
        assert_eq!(Node::from(None::<i32>), Node::Null);
        assert_eq!(
            Node::from(vec!["a", "b"]),
            Node::List(vec![Node::from("a"), Node::from("b")])
        );
    }
}
