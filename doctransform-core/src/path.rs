//! Dotted field paths and the resolver that reads and writes values through them.
//!
//! Reading and writing follow different policies. [`read`] fails as soon as a segment is
//! missing, because a transform needs to know whether the field currently exists. [`write`]
//! builds any missing intermediate documents, because the field must exist once the write
//! has happened.
//!
//! # Example
//!
//! ```ignore
//! use bson::{doc, Bson};
//! use doctransform::path::{self, FieldPath};
//!
//! let mut document = doc! {};
//! let field: FieldPath = "profile.stats.visits".parse()?;
//!
//! path::write(&mut document, &field, Bson::Int32(1))?;
//! assert_eq!(path::read(&document, &field)?, &Bson::Int32(1));
//! ```

use bson::{Bson, Document};
use std::{convert::Infallible, fmt, str::FromStr};

use crate::error::{DocumentTransformError, DocumentTransformResult};

/// Separator between the segments of a dotted field key.
pub const PATH_SEPARATOR: &str = ".";

/// An ordered, non-empty sequence of segments addressing one location inside a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Splits a dotted key into its segments (`"a.b.c"` becomes `["a", "b", "c"]`).
    ///
    /// Splitting always yields at least one segment, so the path is never empty.
    pub fn parse(key: &str) -> Self {
        Self {
            segments: key
                .split(PATH_SEPARATOR)
                .map(str::to_string)
                .collect(),
        }
    }

    /// Returns the segments of this path.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl FromStr for FieldPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(FieldPath::parse(s))
    }
}

impl From<&str> for FieldPath {
    fn from(key: &str) -> Self {
        FieldPath::parse(key)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join(PATH_SEPARATOR))
    }
}

/// Reads the value stored at `path` inside `document`.
///
/// # Errors
///
/// - [`DocumentTransformError::PathNotFound`] if any segment, including the leaf, is absent.
/// - [`DocumentTransformError::TypeShape`] if an intermediate segment holds a non-document value.
pub fn read<'a>(document: &'a Document, path: &FieldPath) -> DocumentTransformResult<&'a Bson> {
    let (leaf, parents) = path
        .segments()
        .split_last()
        .ok_or_else(|| DocumentTransformError::PathNotFound(path.to_string()))?;

    let mut current = document;

    for segment in parents {
        current = match current.get(segment) {
            Some(Bson::Document(child)) => child,
            Some(_) => return Err(type_shape(path, segment)),
            None => return Err(DocumentTransformError::PathNotFound(path.to_string())),
        };
    }

    current
        .get(leaf)
        .ok_or_else(|| DocumentTransformError::PathNotFound(path.to_string()))
}

/// Writes `value` at `path` inside `container`, creating empty documents for any missing
/// intermediate segment.
///
/// # Errors
///
/// Returns [`DocumentTransformError::TypeShape`] if an existing intermediate segment holds a
/// non-document value.
pub fn write(container: &mut Document, path: &FieldPath, value: Bson) -> DocumentTransformResult<()> {
    write_segments(container, path.segments(), value, path)
}

fn write_segments(
    container: &mut Document,
    segments: &[String],
    value: Bson,
    path: &FieldPath,
) -> DocumentTransformResult<()> {
    match segments {
        [] => Err(DocumentTransformError::PathNotFound(path.to_string())),
        [leaf] => {
            container.insert(leaf.as_str(), value);
            Ok(())
        },
        [head, rest @ ..] => match container.get_mut(head) {
            Some(Bson::Document(child)) => write_segments(child, rest, value, path),
            Some(_) => Err(type_shape(path, head)),
            None => {
                // Build the missing branch bottom-up, then hand it to the parent.
                let mut child = Document::new();
                write_segments(&mut child, rest, value, path)?;
                container.insert(head.as_str(), child);
                Ok(())
            },
        },
    }
}

fn type_shape(path: &FieldPath, segment: &str) -> DocumentTransformError {
    DocumentTransformError::TypeShape {
        path: path.to_string(),
        segment: segment.to_string(),
    }
}
