//! Field constraints and the default validator.

use regex::Regex;
use thiserror::Error;

use crate::model::{FieldDescriptor, Node, Object, Scalar};

/// A declarative rule attached to a field.
#[derive(Debug, Clone)]
pub enum Constraint {
    /// Value must not be null (or an empty string).
    Required,
    /// Inclusive numeric bounds.
    Range { min: Option<f64>, max: Option<f64> },
    /// Inclusive length bounds: characters for strings, entries for lists and maps.
    Length { min: Option<usize>, max: Option<usize> },
    /// Strings must match the whole pattern.
    Pattern(Regex),
    /// Strings and enum values must be one of these.
    OneOf(Vec<String>),
}

impl Constraint {
    pub fn range(min: f64, max: f64) -> Self {
        Constraint::Range {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn max_length(max: usize) -> Self {
        Constraint::Length {
            min: None,
            max: Some(max),
        }
    }

    /// Compile a pattern constraint. The pattern is anchored at both ends.
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(&format!("^(?:{pattern})$")).map(Constraint::Pattern)
    }

    pub fn one_of<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Constraint::OneOf(allowed.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("field `{0}` is read-only")]
    ReadOnly(String),
    #[error("field `{0}` is required")]
    Required(String),
    #[error("field `{field}` value {found} is outside [{min:?}, {max:?}]")]
    Range {
        field: String,
        found: f64,
        min: Option<f64>,
        max: Option<f64>,
    },
    #[error("field `{field}` length {found} is outside [{min:?}, {max:?}]")]
    Length {
        field: String,
        found: usize,
        min: Option<usize>,
        max: Option<usize>,
    },
    #[error("field `{field}` does not match {pattern}")]
    Pattern { field: String, pattern: String },
    #[error("field `{field}` must be one of {allowed:?}")]
    OneOf { field: String, allowed: Vec<String> },
    #[error("{0}")]
    Custom(String),
}

fn numeric(value: &Node) -> Option<f64> {
    match value {
        Node::Scalar(Scalar::Int(i)) => Some(*i as f64),
        Node::Scalar(Scalar::Float(f)) => Some(*f),
        _ => None,
    }
}

fn length(value: &Node) -> Option<usize> {
    match value {
        Node::Scalar(Scalar::Str(s)) => Some(s.chars().count()),
        Node::List(items) => Some(items.len()),
        Node::Map(map) => Some(map.len()),
        _ => None,
    }
}

fn outside<T: PartialOrd>(found: T, min: Option<T>, max: Option<T>) -> bool {
    min.is_some_and(|min| found < min) || max.is_some_and(|max| found > max)
}

/// Check one constraint. Nulls pass everything except [`Constraint::Required`];
/// values of a kind a constraint does not speak to pass it.
pub fn check(constraint: &Constraint, value: &Node, field: &FieldDescriptor) -> Result<(), ValidationError> {
    let name = || field.name().to_string();
    match constraint {
        Constraint::Required => match value {
            Node::Null => Err(ValidationError::Required(name())),
            Node::Scalar(Scalar::Str(s)) if s.is_empty() => Err(ValidationError::Required(name())),
            _ => Ok(()),
        },
        Constraint::Range { min, max } => match numeric(value) {
            Some(found) if outside(found, *min, *max) => Err(ValidationError::Range {
                field: name(),
                found,
                min: *min,
                max: *max,
            }),
            _ => Ok(()),
        },
        Constraint::Length { min, max } => match length(value) {
            Some(found) if outside(found, *min, *max) => Err(ValidationError::Length {
                field: name(),
                found,
                min: *min,
                max: *max,
            }),
            _ => Ok(()),
        },
        Constraint::Pattern(re) => match value {
            Node::Scalar(Scalar::Str(s)) if !re.is_match(s) => Err(ValidationError::Pattern {
                field: name(),
                pattern: re.as_str().to_string(),
            }),
            _ => Ok(()),
        },
        Constraint::OneOf(allowed) => match value.as_str() {
            Some(s) if !allowed.iter().any(|a| a == s) => Err(ValidationError::OneOf {
                field: name(),
                allowed: allowed.clone(),
            }),
            _ => Ok(()),
        },
    }
}

/// Default validator: read-only fields reject every write, then each
/// declared constraint is checked in order.
pub fn validate_field(value: &Node, field: &FieldDescriptor, _owner: &Object) -> Result<(), ValidationError> {
    if field.is_read_only() {
        return Err(ValidationError::ReadOnly(field.name().to_string()));
    }
    field
        .constraints()
        .iter()
        .try_for_each(|constraint| check(constraint, value, field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Shape, TypeRef};

    fn owner() -> Object {
        Object::new(&Shape::builder("Owner").build())
    }

    #[test]
    fn read_only_rejects() {
        let shape = Shape::builder("S").field("id", TypeRef::int32()).read_only().build();
        let field = shape.field("id").unwrap();
        assert_eq!(
            validate_field(&Node::from(1), field, &owner()),
            Err(ValidationError::ReadOnly("id".into()))
        );
    }

    #[test]
    fn required_and_nulls() {
        let shape = Shape::builder("S")
            .field("name", TypeRef::string())
            .constraint(Constraint::Required)
            .field("age", TypeRef::int32())
            .constraint(Constraint::range(0.0, 150.0))
            .build();
        let name = shape.field("name").unwrap();
        let age = shape.field("age").unwrap();
        assert!(validate_field(&Node::Null, name, &owner()).is_err());
        assert!(validate_field(&Node::from(""), name, &owner()).is_err());
        assert!(validate_field(&Node::from("x"), name, &owner()).is_ok());
        // Null passes a range check.
        assert!(validate_field(&Node::Null, age, &owner()).is_ok());
        assert!(validate_field(&Node::from(151), age, &owner()).is_err());
        assert!(validate_field(&Node::from(150), age, &owner()).is_ok());
    }

    #[test]
    fn length_pattern_one_of() {
        let shape = Shape::builder("S")
            .field("code", TypeRef::string())
            .constraint(Constraint::max_length(4))
            .constraint(Constraint::pattern("[A-Z]+").unwrap())
            .field("color", TypeRef::enumeration(["Red", "Green", "Blue"]))
            .constraint(Constraint::one_of(["Red", "Green"]))
            .build();
        let code = shape.field("code").unwrap();
        assert!(validate_field(&Node::from("ABCD"), code, &owner()).is_ok());
        assert!(matches!(
            validate_field(&Node::from("ABCDE"), code, &owner()),
            Err(ValidationError::Length { found: 5, .. })
        ));
        assert!(matches!(
            validate_field(&Node::from("AB1"), code, &owner()),
            Err(ValidationError::Pattern { .. })
        ));
        let color = shape.field("color").unwrap();
        let blue = Node::Scalar(Scalar::Enum("Blue".into()));
        assert!(matches!(
            validate_field(&blue, color, &owner()),
            Err(ValidationError::OneOf { .. })
        ));
    }

    #[test]
    fn list_length() {
        let shape = Shape::builder("S")
            .field("tags", TypeRef::list(TypeRef::string()))
            .constraint(Constraint::Length { min: Some(1), max: None })
            .build();
        let tags = shape.field("tags").unwrap();
        assert!(validate_field(&Node::List(vec![]), tags, &owner()).is_err());
        assert!(validate_field(&Node::from(vec!["a"]), tags, &owner()).is_ok());
    }
}
