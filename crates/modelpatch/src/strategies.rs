//! Pluggable collaborators for the differ and the applyer.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::coerce::{coerce_value, CoerceError};
use crate::error::{ContractViolation, DiffResult};
use crate::model::{empty_slot, FieldDescriptor, Node, Object, Scalar, Shape, TypeRef};
use crate::validate::{validate_field, ValidationError};

pub type SkipFn = dyn Fn(&FieldDescriptor) -> bool + Send + Sync;
pub type EqualsFn = dyn Fn(&Node, &Node) -> bool + Send + Sync;
pub type SameFieldFn = dyn Fn(&Shape, &FieldDescriptor) -> Option<usize> + Send + Sync;
pub type SetValueFn = dyn Fn(&FieldDescriptor, &mut Object, Node) -> bool + Send + Sync;
pub type CreateFn = dyn Fn(&TypeRef) -> DiffResult<Node> + Send + Sync;
/// `(changed, original) -> same identity?`
pub type IsSameFn = dyn Fn(&Node, &Node) -> bool + Send + Sync;
/// `(changed, element type) -> new original element`
pub type CreateFromFn = dyn Fn(&Node, &TypeRef) -> DiffResult<Node> + Send + Sync;
pub type CoerceFn = dyn Fn(&Value, &TypeRef) -> Result<Node, CoerceError> + Send + Sync;
pub type ValidateFn = dyn Fn(&Node, &FieldDescriptor, &Object) -> Result<(), ValidationError> + Send + Sync;

/// The collaborator set. Every hook has a default except `skip` (none) and
/// the list identity pair `is_same`/`create_from`, which lists of complex
/// elements require.
///
/// # Example
///
/// ```
/// use modelpatch::Strategies;
///
/// let strategies = Strategies::default()
///     .with_skip(|field| field.name() == "id")
///     .with_identity_field("id");
/// assert!(strategies.is_same().is_some());
/// ```
#[derive(Clone)]
pub struct Strategies {
    skip: Option<Arc<SkipFn>>,
    equals: Arc<EqualsFn>,
    same_field: Arc<SameFieldFn>,
    set_value: Arc<SetValueFn>,
    create: Arc<CreateFn>,
    is_same: Option<Arc<IsSameFn>>,
    create_from: Option<Arc<CreateFromFn>>,
    coerce: Arc<CoerceFn>,
    validate: Arc<ValidateFn>,
}

impl Default for Strategies {
    fn default() -> Self {
        Self {
            skip: None,
            equals: Arc::new(default_equals),
            same_field: Arc::new(|shape: &Shape, field: &FieldDescriptor| shape.field_index(field.name())),
            set_value: Arc::new(|field: &FieldDescriptor, obj: &mut Object, value: Node| {
                obj.set(field.name(), value).is_some()
            }),
            create: Arc::new(default_create),
            is_same: None,
            create_from: None,
            coerce: Arc::new(coerce_value),
            validate: Arc::new(validate_field),
        }
    }
}

impl fmt::Debug for Strategies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strategies")
            .field("skip", &self.skip.is_some())
            .field("is_same", &self.is_same.is_some())
            .field("create_from", &self.create_from.is_some())
            .finish_non_exhaustive()
    }
}

/// Null equals null only; differing kinds are unequal; otherwise structural
/// equality, with NaN equal to NaN so an unchanged NaN is not re-emitted.
pub fn default_equals(a: &Node, b: &Node) -> bool {
    match (a, b) {
        (Node::Scalar(Scalar::Float(x)), Node::Scalar(Scalar::Float(y))) => {
            x == y || (x.is_nan() && y.is_nan())
        }
        _ => a == b,
    }
}

/// Empty instance of a container type. Scalars cannot be created.
pub fn default_create(ty: &TypeRef) -> DiffResult<Node> {
    match ty {
        TypeRef::Object(shape) => Ok(Node::Object(Object::new(shape))),
        TypeRef::List(_) | TypeRef::Map(_) => Ok(empty_slot(ty)),
        TypeRef::Scalar(_) => Err(ContractViolation::NotConstructible(ty.to_string())),
    }
}

impl Strategies {
    pub fn with_skip(mut self, f: impl Fn(&FieldDescriptor) -> bool + Send + Sync + 'static) -> Self {
        self.skip = Some(Arc::new(f));
        self
    }

    pub fn with_equals(mut self, f: impl Fn(&Node, &Node) -> bool + Send + Sync + 'static) -> Self {
        self.equals = Arc::new(f);
        self
    }

    pub fn with_same_field(
        mut self,
        f: impl Fn(&Shape, &FieldDescriptor) -> Option<usize> + Send + Sync + 'static,
    ) -> Self {
        self.same_field = Arc::new(f);
        self
    }

    pub fn with_set_value(
        mut self,
        f: impl Fn(&FieldDescriptor, &mut Object, Node) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.set_value = Arc::new(f);
        self
    }

    pub fn with_create(mut self, f: impl Fn(&TypeRef) -> DiffResult<Node> + Send + Sync + 'static) -> Self {
        self.create = Arc::new(f);
        self
    }

    pub fn with_is_same(mut self, f: impl Fn(&Node, &Node) -> bool + Send + Sync + 'static) -> Self {
        self.is_same = Some(Arc::new(f));
        self
    }

    pub fn with_create_from(
        mut self,
        f: impl Fn(&Node, &TypeRef) -> DiffResult<Node> + Send + Sync + 'static,
    ) -> Self {
        self.create_from = Some(Arc::new(f));
        self
    }

    pub fn with_coerce(
        mut self,
        f: impl Fn(&Value, &TypeRef) -> Result<Node, CoerceError> + Send + Sync + 'static,
    ) -> Self {
        self.coerce = Arc::new(f);
        self
    }

    pub fn with_validate(
        mut self,
        f: impl Fn(&Node, &FieldDescriptor, &Object) -> Result<(), ValidationError> + Send + Sync + 'static,
    ) -> Self {
        self.validate = Arc::new(f);
        self
    }

    /// Identify list elements by the value of one field: two objects are the
    /// same element when both carry equal non-null values in `field`. New
    /// elements are created empty with only that field copied over.
    pub fn with_identity_field(self, field: impl Into<String>) -> Self {
        let field: Arc<str> = Arc::from(field.into());
        let key = Arc::clone(&field);
        self.with_is_same(move |changed, original| {
            match (identity(changed, &key), identity(original, &key)) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
        })
        .with_create_from(move |changed, ty| {
            let mut created = default_create(ty)?;
            if let (Some(obj), Some(id)) = (created.as_object_mut(), identity(changed, &field)) {
                obj.set(&field, id.clone());
            }
            Ok(created)
        })
    }

    pub fn skip(&self) -> Option<&SkipFn> {
        self.skip.as_deref()
    }

    pub fn is_skipped(&self, field: &FieldDescriptor) -> bool {
        self.skip.as_ref().is_some_and(|skip| skip(field))
    }

    pub fn equals(&self) -> &EqualsFn {
        &*self.equals
    }

    pub fn same_field(&self) -> &SameFieldFn {
        &*self.same_field
    }

    pub fn set_value(&self) -> &SetValueFn {
        &*self.set_value
    }

    pub fn create(&self) -> &CreateFn {
        &*self.create
    }

    pub fn is_same(&self) -> Option<&IsSameFn> {
        self.is_same.as_deref()
    }

    pub fn create_from(&self) -> Option<&CreateFromFn> {
        self.create_from.as_deref()
    }

    pub fn coerce(&self) -> &CoerceFn {
        &*self.coerce
    }

    pub fn validate(&self) -> &ValidateFn {
        &*self.validate
    }
}

fn identity<'n>(node: &'n Node, field: &str) -> Option<&'n Node> {
    node.as_object()?.get(field).filter(|id| !id.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> Arc<Shape> {
        Shape::builder("Item")
            .field("id", TypeRef::int32())
            .field("name", TypeRef::string())
            .build()
    }

    #[test]
    fn equals_fallback() {
        assert!(default_equals(&Node::Null, &Node::Null));
        assert!(!default_equals(&Node::Null, &Node::from(1)));
        assert!(!default_equals(&Node::from(1), &Node::from(1.0)));
        assert!(default_equals(&Node::from("a"), &Node::from("a")));
        assert!(default_equals(&Node::from(f64::NAN), &Node::from(f64::NAN)));
    }

    #[test]
    fn create_defaults() {
        let shape = item();
        let created = default_create(&TypeRef::object(&shape)).unwrap();
        assert_eq!(created, Node::Object(Object::new(&shape)));
        assert_eq!(default_create(&TypeRef::list(TypeRef::int32())).unwrap(), Node::List(vec![]));
        assert!(matches!(
            default_create(&TypeRef::string()),
            Err(ContractViolation::NotConstructible(_))
        ));
    }

    #[test]
    fn identity_field_pair() {
        let shape = item();
        let strategies = Strategies::default().with_identity_field("id");
        let a = Node::Object(Object::new(&shape).with("id", 1).with("name", "a"));
        let b = Node::Object(Object::new(&shape).with("id", 1).with("name", "b"));
        let c = Node::Object(Object::new(&shape).with("id", 2));
        let no_id = Node::Object(Object::new(&shape));
        let is_same = strategies.is_same().unwrap();
        assert!(is_same(&a, &b));
        assert!(!is_same(&a, &c));
        assert!(!is_same(&no_id, &no_id));

        let create_from = strategies.create_from().unwrap();
        let created = create_from(&b, &TypeRef::object(&shape)).unwrap();
        let created = created.as_object().unwrap();
        assert_eq!(created.get("id"), Some(&Node::from(1)));
        assert_eq!(created.get("name"), Some(&Node::Null));
    }

    #[test]
    fn skip_and_same_field() {
        let shape = item();
        let strategies = Strategies::default().with_skip(|f| f.name() == "id");
        assert!(strategies.is_skipped(&shape.fields()[0]));
        assert!(!strategies.is_skipped(&shape.fields()[1]));
        assert!(!Strategies::default().is_skipped(&shape.fields()[0]));
        let other = Shape::builder("Other").field("name", TypeRef::string()).build();
        assert_eq!((Strategies::default().same_field())(&other, &shape.fields()[1]), Some(0));
        assert_eq!((Strategies::default().same_field())(&other, &shape.fields()[0]), None);
    }
}
