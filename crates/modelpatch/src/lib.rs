//! modelpatch: diff typed object graphs into JSON Patch changes and replay
//! them.
//!
//! - [`Differ`] walks an `original` and a `changed` graph of the same
//!   [`Shape`], mutates `original` until it matches, and reports every
//!   write as a [`Change`] addressed by a JSON [`Pointer`]. Lists are
//!   reconciled element by element with moves where elements are reordered.
//! - [`Applyer`] replays changes (from the differ, or decoded from an
//!   RFC 6902 document with [`from_json_patch`]) against a target graph,
//!   coercing and validating incoming values.
//!
//! Every point where the engines depend on the caller's domain (identity,
//! equality, construction, coercion, validation) is a hook in
//! [`Strategies`].

pub mod apply;
pub mod change;
pub mod classify;
pub mod coerce;
pub mod diff;
pub mod error;
pub mod model;
pub mod strategies;
pub mod validate;

pub use apply::Applyer;
pub use change::{changes_fingerprint, from_json, from_json_patch, to_json, to_json_patch, Change, CodecError, Operation};
pub use classify::{classify, Category};
pub use coerce::{coerce_value, CoerceError};
pub use diff::{ChangeSink, Count, Differ, Discard};
pub use error::{ApplyError, ApplyResult, ContractViolation, DiffResult, OperationError, PathError};
pub use model::{empty_slot, FieldDescriptor, Node, NodeMap, Object, Scalar, ScalarType, Shape, ShapeBuilder, TypeRef};
pub use modelpatch_pointer::{Pointer, PointerError};
pub use strategies::Strategies;
pub use validate::{validate_field, Constraint, ValidationError};
