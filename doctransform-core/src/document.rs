//! Conversions between BSON documents and JSON values.
//!
//! The engine works on [`bson::Document`]. Callers that keep their documents as
//! [`serde_json::Value`] can convert at the boundary with [`DocumentExt`].

use bson::{Bson, Document, de::deserialize_from_bson, ser::serialize_to_bson};
use serde_json::Value;

use crate::error::{DocumentTransformError, DocumentTransformResult};

/// Extension trait providing JSON conversion utilities for documents.
///
/// # Example
///
/// ```ignore
/// use bson::Document;
/// use doctransform::document::DocumentExt;
/// use serde_json::json;
///
/// let document = Document::from_json(json!({ "count": 1 }))?;
/// assert_eq!(document.to_json()?, json!({ "count": 1 }));
/// ```
pub trait DocumentExt: Sized {
    /// Converts this document to a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn to_json(&self) -> DocumentTransformResult<Value>;

    /// Creates a document from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is not a JSON object or cannot be represented as BSON.
    fn from_json(value: Value) -> DocumentTransformResult<Self>;
}

impl DocumentExt for Document {
    fn to_json(&self) -> DocumentTransformResult<Value> {
        Ok(deserialize_from_bson(Bson::Document(self.clone()))?)
    }

    fn from_json(value: Value) -> DocumentTransformResult<Self> {
        match serialize_to_bson(&value)? {
            Bson::Document(document) => Ok(document),
            other => Err(DocumentTransformError::Serialization(format!(
                "expected a JSON object, got {:?}",
                other.element_type()
            ))),
        }
    }
}
