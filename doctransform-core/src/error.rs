//! Error types and result types for document transform operations.
//!
//! Use [`DocumentTransformResult<T>`] as the return type for fallible operations.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur while resolving paths, building transforms
/// or merging an update into a document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentTransformError {
    /// A read path does not exist in the document.
    ///
    /// Transforms recover from this locally by falling back to their absent-field default,
    /// so it never escapes [`merge`](crate::engine::merge).
    #[error("Path not found: {0}")]
    PathNotFound(String),
    /// An intermediate segment of a path resolved to something other than a document.
    #[error("Cannot descend into non-document value at segment '{segment}' of path '{path}'")]
    TypeShape {
        /// The full dotted path being resolved.
        path: String,
        /// The segment whose value is not a document.
        segment: String,
    },
    /// A field exists but holds a value the transform cannot operate on.
    #[error("Field '{path}' holds {found}, expected {expected}")]
    TypeMismatch {
        /// The full dotted path of the field.
        path: String,
        /// The kind of value the transform needs.
        expected: String,
        /// The BSON type found at the path.
        found: String,
    },
    /// Two leaves of an update address overlapping fields, one nested inside the other.
    #[error("Update field '{parent}' conflicts with nested update field '{child}'")]
    PathConflict {
        /// The leaf whose value would replace or be replaced by `child`'s container.
        parent: String,
        /// The leaf nested under `parent`.
        child: String,
    },
    /// A transform was constructed with an operand of the wrong type or arity.
    #[error("Invalid operand: {0}")]
    InvalidOperand(String),
    /// An array element cannot take part in a membership comparison.
    #[error("Unhashable element: {0}")]
    UnhashableElement(String),
    /// Serialization/deserialization error when converting between document formats (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// A specialized `Result` type for document transform operations.
pub type DocumentTransformResult<T> = Result<T, DocumentTransformError>;

impl From<BsonError> for DocumentTransformError {
    fn from(err: BsonError) -> Self {
        DocumentTransformError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for DocumentTransformError {
    fn from(err: SerdeJsonError) -> Self {
        DocumentTransformError::Serialization(err.to_string())
    }
}
