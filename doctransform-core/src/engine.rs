//! The transform engine: resolves an update payload against a document and merges the result.
//!
//! Merging happens in two phases. First every leaf of the payload is resolved into a staged
//! document: literals are copied, transforms are computed from the document as it stood before
//! the merge. Then the staged top-level fields replace the document's fields of the same name.
//! A failure while staging leaves the document untouched.
//!
//! A payload whose leaves overlap, such as `"a"` together with `"a.b"`, is rejected before
//! anything is computed, whatever order the two leaves appear in.
//!
//! # Example
//!
//! ```ignore
//! use bson::doc;
//! use doctransform::{engine::merge, transform::FieldTransform, update::UpdateDocument};
//!
//! let mut document = doc! { "count": 1, "tags": ["x"] };
//!
//! merge(
//!     &mut document,
//!     UpdateDocument::new()
//!         .transform("count", FieldTransform::increment(2)?)
//!         .transform("tags", FieldTransform::array_union(["y"])?),
//! )?;
//!
//! assert_eq!(document, doc! { "count": 3, "tags": ["x", "y"] });
//! ```

use bson::{Bson, Document};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::{
    error::{DocumentTransformError, DocumentTransformResult},
    path::{self, FieldPath, PATH_SEPARATOR},
    transform::{FieldTransform, Transform, current_array, current_number},
    update::{FieldUpdate, UpdateDocument},
};

/// Configuration for a [`TransformEngine`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformEngineConfig {
    /// Recompute [`Increment`](crate::transform::Increment) and
    /// [`ArrayUnion`](crate::transform::ArrayUnion) results in a second pass over the staged
    /// payload, from the document's original values.
    ///
    /// The second pass reads the same original values as the first, so both produce the same
    /// staged document. Off by default.
    pub replay_accumulators: bool,
}

/// Applies update payloads to documents.
///
/// The engine holds only configuration, so one instance can be shared freely. Each call to
/// [`merge`](TransformEngine::merge) works on a single document, which the `&mut` borrow keeps
/// exclusive for the duration of the call.
#[derive(Debug, Clone, Default)]
pub struct TransformEngine {
    config: TransformEngineConfig,
}

impl TransformEngine {
    /// Creates an engine with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine with the given configuration.
    pub fn with_config(config: TransformEngineConfig) -> Self {
        Self { config }
    }

    /// Creates a builder for constructing a `TransformEngine` with custom options.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use doctransform::engine::TransformEngine;
    ///
    /// let engine = TransformEngine::builder()
    ///     .replay_accumulators(true)
    ///     .build();
    /// ```
    pub fn builder() -> TransformEngineBuilder {
        TransformEngineBuilder::new()
    }

    pub fn config(&self) -> &TransformEngineConfig {
        &self.config
    }

    /// Resolves `update` against `document` and merges the result into `document`.
    ///
    /// Each top-level field of the resolved update replaces the document's field of the same
    /// name wholesale; nested fields are not merged further.
    ///
    /// # Errors
    ///
    /// - [`PathConflict`](crate::error::DocumentTransformError::PathConflict) if one leaf of
    ///   the update is nested under another leaf's path.
    /// - [`TypeMismatch`](crate::error::DocumentTransformError::TypeMismatch) if a transform
    ///   finds an existing field of a type it cannot operate on.
    /// - [`UnhashableElement`](crate::error::DocumentTransformError::UnhashableElement) from an
    ///   [`ArrayRemove`](crate::transform::ArrayRemove) over documents or arrays.
    ///
    /// The document is left unchanged when an error is returned.
    pub fn merge(&self, document: &mut Document, update: UpdateDocument) -> DocumentTransformResult<()> {
        let staged = self.stage(document, &update)?;

        tracing::debug!(fields = staged.len(), "merging staged update into document");

        for (key, value) in staged {
            document.insert(key, value);
        }

        Ok(())
    }

    /// Resolves every leaf of `update` against `document` without modifying it.
    ///
    /// Returns the staged document that [`merge`](TransformEngine::merge) folds into
    /// `document`.
    pub fn stage(&self, document: &Document, update: &UpdateDocument) -> DocumentTransformResult<Document> {
        let mut staged = Document::new();
        let mut accumulators = Vec::new();
        let mut transforms = 0usize;

        let leaves: Vec<(FieldPath, &FieldUpdate)> = update
            .leaves()
            .map(|(key, leaf)| (FieldPath::parse(&key), leaf))
            .collect();

        check_conflicts(&leaves)?;

        for (field, leaf) in leaves {
            let value = match leaf {
                FieldUpdate::Value(value) => value.clone(),
                // leaves() only yields nested updates that are empty
                FieldUpdate::Nested(_) => Bson::Document(Document::new()),
                FieldUpdate::Transform(transform) => {
                    transforms += 1;

                    if self.config.replay_accumulators
                        && matches!(transform, FieldTransform::Increment(_) | FieldTransform::ArrayUnion(_))
                    {
                        accumulators.push((field.clone(), transform));
                    }

                    transform.apply(document, &field)?
                },
            };

            path::write(&mut staged, &field, value)?;
        }

        if self.config.replay_accumulators {
            replay_accumulators(document, &mut staged, accumulators)?;
        }

        tracing::debug!(
            transforms,
            fields = staged.len(),
            replayed = self.config.replay_accumulators,
            "staged update"
        );

        Ok(staged)
    }
}

/// Fails if any leaf path is a proper prefix of another leaf path.
fn check_conflicts(leaves: &[(FieldPath, &FieldUpdate)]) -> DocumentTransformResult<()> {
    let paths: HashSet<&[String]> = leaves.iter().map(|(field, _)| field.segments()).collect();

    for (field, _) in leaves {
        let segments = field.segments();

        for end in 1..segments.len() {
            let parent = &segments[..end];

            if paths.contains(parent) {
                return Err(DocumentTransformError::PathConflict {
                    parent: parent.join(PATH_SEPARATOR),
                    child: field.to_string(),
                });
            }
        }
    }

    Ok(())
}

/// Rewrites increments and array unions from the original document's values.
fn replay_accumulators(
    document: &Document,
    staged: &mut Document,
    accumulators: Vec<(FieldPath, &FieldTransform)>,
) -> DocumentTransformResult<()> {
    for (field, transform) in accumulators {
        let value: Bson = match transform {
            FieldTransform::Increment(increment) => current_number(document, &field)?
                .add(increment.value())
                .into(),
            FieldTransform::ArrayUnion(array_union) => {
                let mut items = current_array(document, &field)?.to_vec();
                items.extend_from_slice(array_union.values());
                Bson::Array(items)
            },
            _ => continue,
        };

        tracing::trace!(field = %field, transform = transform.name(), "replaying accumulator");
        path::write(staged, &field, value)?;
    }

    Ok(())
}

/// Merges `update` into `document` using a default [`TransformEngine`].
///
/// See [`TransformEngine::merge`].
pub fn merge(document: &mut Document, update: UpdateDocument) -> DocumentTransformResult<()> {
    TransformEngine::default().merge(document, update)
}

/// Builder for constructing [`TransformEngine`] instances.
#[derive(Debug, Clone, Default)]
pub struct TransformEngineBuilder {
    config: TransformEngineConfig,
}

impl TransformEngineBuilder {
    /// Creates a new builder with the default configuration.
    pub fn new() -> Self {
        TransformEngineBuilder { config: TransformEngineConfig::default() }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: TransformEngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Enables or disables the second pass over increments and array unions.
    ///
    /// # Arguments
    ///
    /// * `enabled` - Whether to recompute accumulated fields after the first pass
    pub fn replay_accumulators(mut self, enabled: bool) -> Self {
        self.config.replay_accumulators = enabled;
        self
    }

    /// Builds and returns the engine.
    pub fn build(self) -> TransformEngine {
        TransformEngine::with_config(self.config)
    }
}
