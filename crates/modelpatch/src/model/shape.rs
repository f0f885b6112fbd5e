//! Declared types: scalar kinds, type references, field descriptors, shapes.

use std::fmt;
use std::sync::Arc;

use crate::validate::Constraint;

/// Declared kind of a scalar field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalarType {
    Bool,
    Int32,
    Int64,
    Float64,
    String,
    /// Closed set of variant names, matched case-insensitively on input.
    Enum(Arc<[String]>),
    /// RFC 3339 date-time with offset.
    Timestamp,
}

impl ScalarType {
    pub fn enumeration<I, S>(variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScalarType::Enum(variants.into_iter().map(Into::into).collect())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarType::Bool => "bool",
            ScalarType::Int32 => "int32",
            ScalarType::Int64 => "int64",
            ScalarType::Float64 => "float64",
            ScalarType::String => "string",
            ScalarType::Enum(_) => "enum",
            ScalarType::Timestamp => "timestamp",
        }
    }
}

/// The declared type of a field, list element or map value.
#[derive(Debug, Clone)]
pub enum TypeRef {
    Scalar(ScalarType),
    Object(Arc<Shape>),
    List(Box<TypeRef>),
    /// String-keyed map.
    Map(Box<TypeRef>),
}

impl TypeRef {
    pub fn bool() -> Self {
        TypeRef::Scalar(ScalarType::Bool)
    }

    pub fn int32() -> Self {
        TypeRef::Scalar(ScalarType::Int32)
    }

    pub fn int64() -> Self {
        TypeRef::Scalar(ScalarType::Int64)
    }

    pub fn float64() -> Self {
        TypeRef::Scalar(ScalarType::Float64)
    }

    pub fn string() -> Self {
        TypeRef::Scalar(ScalarType::String)
    }

    pub fn timestamp() -> Self {
        TypeRef::Scalar(ScalarType::Timestamp)
    }

    pub fn enumeration<I, S>(variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TypeRef::Scalar(ScalarType::enumeration(variants))
    }

    pub fn object(shape: &Arc<Shape>) -> Self {
        TypeRef::Object(Arc::clone(shape))
    }

    pub fn list(element: TypeRef) -> Self {
        TypeRef::List(Box::new(element))
    }

    pub fn map(value: TypeRef) -> Self {
        TypeRef::Map(Box::new(value))
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, TypeRef::Scalar(_))
    }

    /// Element type of a list, value type of a map.
    pub fn item_type(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::List(item) | TypeRef::Map(item) => Some(item),
            _ => None,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Scalar(s) => f.write_str(s.as_str()),
            TypeRef::Object(shape) => f.write_str(shape.name()),
            TypeRef::List(item) => write!(f, "list<{item}>"),
            TypeRef::Map(item) => write!(f, "map<string, {item}>"),
        }
    }
}

/// A named, typed field of a [`Shape`].
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    name: String,
    ty: TypeRef,
    read_only: bool,
    constraints: Vec<Constraint>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            read_only: false,
            constraints: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }
}

/// Ordered field layout of an object type. Declaration order is the order
/// in which the differ visits fields.
#[derive(Debug, Clone)]
pub struct Shape {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl Shape {
    pub fn builder(name: impl Into<String>) -> ShapeBuilder {
        ShapeBuilder {
            shape: Shape {
                name: name.into(),
                fields: Vec::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Builder for [`Shape`]. Modifiers such as [`ShapeBuilder::read_only`]
/// apply to the most recently added field.
///
/// # Example
///
/// ```
/// use modelpatch::{Constraint, Shape, TypeRef};
///
/// let item = Shape::builder("Item")
///     .field("id", TypeRef::string())
///     .read_only()
///     .field("name", TypeRef::string())
///     .constraint(Constraint::Required)
///     .build();
/// assert_eq!(item.fields().len(), 2);
/// assert!(item.field("id").unwrap().is_read_only());
/// ```
#[derive(Debug)]
pub struct ShapeBuilder {
    shape: Shape,
}

impl ShapeBuilder {
    /// Add a field. A field with the same name replaces the earlier one in place.
    pub fn field(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        let field = FieldDescriptor::new(name, ty);
        match self.shape.field_index(&field.name) {
            Some(idx) => self.shape.fields[idx] = field,
            None => self.shape.fields.push(field),
        }
        self
    }

    pub fn read_only(mut self) -> Self {
        if let Some(field) = self.shape.fields.last_mut() {
            field.read_only = true;
        }
        self
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        if let Some(field) = self.shape.fields.last_mut() {
            field.constraints.push(constraint);
        }
        self
    }

    pub fn build(self) -> Arc<Shape> {
        Arc::new(self.shape)
    }
}
