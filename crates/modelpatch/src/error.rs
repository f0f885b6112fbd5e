//! Error types.
//!
//! Two disjoint classes: recoverable operation errors (bad input data,
//! reported per [`Change`]) and [`ContractViolation`]s (a collaborator or
//! caller broke an assumption of the engine; never wrapped or retried).

use modelpatch_pointer::PointerError;
use thiserror::Error;

use crate::change::Change;
use crate::coerce::CoerceError;
use crate::validate::ValidationError;

/// Fatal violation of the engine's contract with its caller.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ContractViolation {
    #[error("collaborator `{0}` is required but not configured")]
    MissingCollaborator(&'static str),
    #[error("original item at {path} matches a changed item that is already bound; the identity predicate is not injective over this collection")]
    DuplicateIdentity { path: String },
    #[error("map field `{field}` at {path} must be initialized")]
    UninitializedMap { field: String, path: String },
    #[error("list field `{field}` at {path} must be initialized")]
    UninitializedList { field: String, path: String },
    #[error("field `{field}` not found on shape `{shape}`")]
    UnboundField { shape: String, field: String },
    #[error("value at {path} is a {found}, declared type is {expected}")]
    TypeMismatch {
        path: String,
        expected: String,
        found: &'static str,
    },
    #[error("cannot construct a value of type {0}")]
    NotConstructible(String),
    #[error("change path {path} exceeds pointer limits: {source}")]
    PathLimit {
        path: String,
        #[source]
        source: PointerError,
    },
    #[error("internal invariant violated: {0}")]
    Internal(String),
}

/// Failure to resolve a pointer against a live object graph.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PathError {
    #[error("append token '-' used before the end of {path}")]
    AppendInMiddle { path: String },
    #[error("unknown field `{field}` in {path}")]
    UnknownField { field: String, path: String },
    #[error("{path} passes through a null value at `{token}`")]
    NullIntermediate { path: String, token: String },
    #[error("index {index} out of range (len {len}) in {path}")]
    IndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },
    #[error("token `{token}` in {path} is not a list index")]
    NotAnIndex { path: String, token: String },
    #[error("token `{token}` in {path} steps into a scalar")]
    NotAContainer { path: String, token: String },
    #[error("map key `{key}` not found in {path}")]
    MissingKey { path: String, key: String },
}

/// Why a single [`Change`] could not be applied.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OperationError {
    #[error("operation `{0}` is not supported")]
    Unsupported(&'static str),
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("{path} addresses a list position but its container is not a list")]
    NotAList { path: String },
    #[error("position {index} out of range for `{op}` (len {len})")]
    OutOfRange {
        op: &'static str,
        index: usize,
        len: usize,
    },
    #[error("`{0}` requires a value")]
    MissingValue(&'static str),
    #[error("`move` requires `from`")]
    MissingFrom,
    #[error("`move` between different lists is not supported ({from} -> {path})")]
    CrossListMove { from: String, path: String },
    #[error("`from` {0} does not address a list element")]
    FromNotIndex(String),
    #[error("`move` is not supported for field target {0}")]
    MoveOnField(String),
    #[error("the root pointer only supports `replace`, got `{0}`")]
    RootOperation(&'static str),
    #[error(transparent)]
    Coerce(#[from] CoerceError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Error returned by [`crate::Applyer::apply_changes`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApplyError {
    #[error("invalid patch operation {change}: {source}")]
    InvalidOperation {
        change: Box<Change>,
        #[source]
        source: OperationError,
    },
    #[error(transparent)]
    Contract(#[from] ContractViolation),
}

impl ApplyError {
    /// True for contract violations.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ApplyError::Contract(_))
    }

    /// The offending change, for recoverable errors.
    pub fn change(&self) -> Option<&Change> {
        match self {
            ApplyError::InvalidOperation { change, .. } => Some(change),
            ApplyError::Contract(_) => None,
        }
    }
}

/// Result of a diff: only contract violations can stop it.
pub type DiffResult<T> = Result<T, ContractViolation>;

/// Result of an apply.
pub type ApplyResult<T> = Result<T, ApplyError>;
