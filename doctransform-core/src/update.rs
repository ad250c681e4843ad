//! Update payloads and the iterator that flattens them into dotted leaves.
//!
//! An [`UpdateDocument`] has the shape of the part of a document being updated. Each leaf is
//! either a literal replacement value or a [`FieldTransform`]. Keys may themselves be dotted
//! (`"stats.visits"`), which addresses the same field as nesting `stats` → `visits`.
//!
//! # Example
//!
//! ```ignore
//! use bson::doc;
//! use doctransform::{transform::FieldTransform, update::UpdateDocument};
//!
//! let update = UpdateDocument::new()
//!     .set("name", "Alice")
//!     .transform("stats.visits", FieldTransform::increment(1)?)
//!     .nested("profile", UpdateDocument::from(doc! { "active": true }));
//!
//! let paths: Vec<String> = update.leaves().map(|(path, _)| path).collect();
//! assert_eq!(paths, ["name", "stats.visits", "profile.active"]);
//! ```

use bson::{Bson, Document};
use std::slice;

use crate::{path::PATH_SEPARATOR, transform::FieldTransform};

/// A single entry of an [`UpdateDocument`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    /// Literal replacement value.
    Value(Bson),
    /// Nested update whose keys are relative to this entry.
    Nested(UpdateDocument),
    /// Value computed from the document at merge time.
    Transform(FieldTransform),
}

impl From<Bson> for FieldUpdate {
    /// Embedded documents become [`FieldUpdate::Nested`] so that transforms can be mixed into
    /// them later; every other value is a literal.
    fn from(value: Bson) -> Self {
        match value {
            Bson::Document(document) => FieldUpdate::Nested(document.into()),
            other => FieldUpdate::Value(other),
        }
    }
}

impl From<FieldTransform> for FieldUpdate {
    fn from(transform: FieldTransform) -> Self {
        FieldUpdate::Transform(transform)
    }
}

impl From<UpdateDocument> for FieldUpdate {
    fn from(update: UpdateDocument) -> Self {
        FieldUpdate::Nested(update)
    }
}

/// An insertion-ordered update payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateDocument {
    fields: Vec<(String, FieldUpdate)>,
}

impl UpdateDocument {
    /// Creates an empty update.
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Sets `key` to a literal value.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Bson>) -> Self {
        let value: Bson = value.into();
        self.insert(key, FieldUpdate::from(value));
        self
    }

    /// Sets `key` to a transform.
    pub fn transform(mut self, key: impl Into<String>, transform: FieldTransform) -> Self {
        self.insert(key, FieldUpdate::Transform(transform));
        self
    }

    /// Sets `key` to a nested update.
    pub fn nested(mut self, key: impl Into<String>, update: UpdateDocument) -> Self {
        self.insert(key, FieldUpdate::Nested(update));
        self
    }

    /// Inserts an entry, returning the previous entry for `key` if there was one.
    ///
    /// Replacing an existing key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, update: impl Into<FieldUpdate>) -> Option<FieldUpdate> {
        let key = key.into();
        let update = update.into();

        match self.fields.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, update)),
            None => {
                self.fields.push((key, update));
                None
            },
        }
    }

    /// Returns the update stored under the top-level `key`, if any.
    pub fn get(&self, key: &str) -> Option<&FieldUpdate> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, update)| update)
    }

    /// Returns the number of top-level fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the update has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over the top-level entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldUpdate)> {
        self.fields
            .iter()
            .map(|(key, update)| (key.as_str(), update))
    }

    /// Flattens the update into `(dotted path, leaf)` pairs.
    ///
    /// The walk is depth-first in insertion order and descends only into non-empty
    /// [`FieldUpdate::Nested`] entries. Arrays and transforms are leaves, and so is an empty
    /// nested update. The iterator borrows the update without modifying it, so calling
    /// `leaves` again starts a fresh walk.
    pub fn leaves(&self) -> Leaves<'_> {
        Leaves {
            stack: vec![(None, self.fields.iter())],
        }
    }
}

impl From<Document> for UpdateDocument {
    fn from(document: Document) -> Self {
        let mut update = UpdateDocument::new();

        for (key, value) in document {
            update.insert(key, FieldUpdate::from(value));
        }

        update
    }
}

impl FromIterator<(String, FieldUpdate)> for UpdateDocument {
    fn from_iter<T: IntoIterator<Item = (String, FieldUpdate)>>(iter: T) -> Self {
        let mut update = UpdateDocument::new();

        for (key, value) in iter {
            update.insert(key, value);
        }

        update
    }
}

/// Lazy depth-first iterator over the leaves of an [`UpdateDocument`].
///
/// Created by [`UpdateDocument::leaves`].
pub struct Leaves<'a> {
    /// One frame per nested update being walked, with the dotted prefix leading to it.
    stack: Vec<(Option<String>, slice::Iter<'a, (String, FieldUpdate)>)>,
}

impl<'a> Iterator for Leaves<'a> {
    type Item = (String, &'a FieldUpdate);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (prefix, fields) = self.stack.last_mut()?;

            let Some((key, update)) = fields.next() else {
                self.stack.pop();
                continue;
            };

            let path = match prefix {
                Some(prefix) => format!("{prefix}{PATH_SEPARATOR}{key}"),
                None => key.clone(),
            };

            match update {
                FieldUpdate::Nested(nested) if !nested.is_empty() => {
                    self.stack.push((Some(path), nested.fields.iter()));
                },
                leaf => return Some((path, leaf)),
            }
        }
    }
}
