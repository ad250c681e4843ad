//! Field transforms: deferred operations that compute a field's new value from its current one.
//!
//! Every transform implements [`Transform`], whose single method receives the document as it
//! stood before the merge began and the path the transform was placed at. [`FieldTransform`]
//! is the closed set of transforms an [`UpdateDocument`](crate::update::UpdateDocument) can
//! carry.
//!
//! | Transform | Field absent | Field present |
//! |---|---|---|
//! | [`Increment`] | operand | `current + operand`, error if current is not a number |
//! | [`Maximum`] | operand | larger of the two, operand if current is not a number |
//! | [`Minimum`] | operand | smaller of the two, operand if current is not a number |
//! | [`ArrayUnion`] | operands | current elements followed by the operands, duplicates kept; error if current is not an array |
//! | [`ArrayRemove`] | `[]` | current elements not among the operands; error if current is not an array |
//!
//! # Example
//!
//! ```ignore
//! use bson::doc;
//! use doctransform::transform::{FieldTransform, Transform};
//!
//! let document = doc! { "visits": 41 };
//! let bump = FieldTransform::increment(1)?;
//!
//! assert_eq!(bump.apply(&document, &"visits".into())?, bson::Bson::Int32(42));
//! ```

use bson::{Bson, Document};
use std::{cmp::Ordering, collections::HashSet};

use crate::{
    error::{DocumentTransformError, DocumentTransformResult},
    path::{self, FieldPath},
    value::{Numeric, ValueKey},
};

/// A field-level operation that derives a new value from the current document.
pub trait Transform {
    /// Computes the value the field at `path` should hold after this transform.
    ///
    /// A missing or unreadable field is not an error; each transform substitutes its own
    /// default instead.
    ///
    /// # Errors
    ///
    /// - [`DocumentTransformError::TypeMismatch`] if [`Increment`] finds a non-number, or
    ///   [`ArrayUnion`] / [`ArrayRemove`] find a non-array, at a field that exists.
    /// - [`DocumentTransformError::UnhashableElement`] from [`ArrayRemove`].
    fn apply(&self, document: &Document, path: &FieldPath) -> DocumentTransformResult<Bson>;
}

/// Adds a number to a numeric field.
#[derive(Debug, Clone, PartialEq)]
pub struct Increment {
    value: Numeric,
}

impl Increment {
    /// # Errors
    ///
    /// Returns [`DocumentTransformError::InvalidOperand`] unless `value` is a BSON number.
    pub fn new(value: impl Into<Bson>) -> DocumentTransformResult<Self> {
        Ok(Self { value: numeric_operand("Increment", value.into())? })
    }

    /// The amount added to the field.
    pub fn value(&self) -> Numeric {
        self.value
    }
}

impl Transform for Increment {
    fn apply(&self, document: &Document, path: &FieldPath) -> DocumentTransformResult<Bson> {
        Ok(current_number(document, path)?.add(self.value).into())
    }
}

/// Raises a numeric field to at least the operand.
#[derive(Debug, Clone, PartialEq)]
pub struct Maximum {
    value: Numeric,
}

impl Maximum {
    /// # Errors
    ///
    /// Returns [`DocumentTransformError::InvalidOperand`] unless `value` is a BSON number.
    pub fn new(value: impl Into<Bson>) -> DocumentTransformResult<Self> {
        Ok(Self { value: numeric_operand("Maximum", value.into())? })
    }

    /// The lower bound applied to the field.
    pub fn value(&self) -> Numeric {
        self.value
    }
}

impl Transform for Maximum {
    fn apply(&self, document: &Document, path: &FieldPath) -> DocumentTransformResult<Bson> {
        Ok(clamp(document, path, self.value, Ordering::Greater))
    }
}

/// Lowers a numeric field to at most the operand.
#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    value: Numeric,
}

impl Minimum {
    /// # Errors
    ///
    /// Returns [`DocumentTransformError::InvalidOperand`] unless `value` is a BSON number.
    pub fn new(value: impl Into<Bson>) -> DocumentTransformResult<Self> {
        Ok(Self { value: numeric_operand("Minimum", value.into())? })
    }

    /// The upper bound applied to the field.
    pub fn value(&self) -> Numeric {
        self.value
    }
}

impl Transform for Minimum {
    fn apply(&self, document: &Document, path: &FieldPath) -> DocumentTransformResult<Bson> {
        Ok(clamp(document, path, self.value, Ordering::Less))
    }
}

/// Appends values to an array field.
///
/// Unlike a set union, values already present in the array are appended again.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayUnion {
    values: Vec<Bson>,
}

impl ArrayUnion {
    /// # Errors
    ///
    /// Returns [`DocumentTransformError::InvalidOperand`] if `values` is empty.
    pub fn new<I, V>(values: I) -> DocumentTransformResult<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Bson>,
    {
        Ok(Self { values: list_operand("ArrayUnion", values)? })
    }

    /// The values appended to the field.
    pub fn values(&self) -> &[Bson] {
        &self.values
    }
}

impl Transform for ArrayUnion {
    fn apply(&self, document: &Document, path: &FieldPath) -> DocumentTransformResult<Bson> {
        let mut items = current_array(document, path)?.to_vec();
        items.extend(self.values.iter().cloned());

        Ok(Bson::Array(items))
    }
}

/// Removes every occurrence of the given values from an array field.
///
/// The result behaves as a set difference: elements left over appear once each. Their order
/// is not part of the contract.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayRemove {
    values: Vec<Bson>,
}

impl ArrayRemove {
    /// # Errors
    ///
    /// Returns [`DocumentTransformError::InvalidOperand`] if `values` is empty.
    pub fn new<I, V>(values: I) -> DocumentTransformResult<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Bson>,
    {
        Ok(Self { values: list_operand("ArrayRemove", values)? })
    }

    /// The values removed from the field.
    pub fn values(&self) -> &[Bson] {
        &self.values
    }
}

impl Transform for ArrayRemove {
    fn apply(&self, document: &Document, path: &FieldPath) -> DocumentTransformResult<Bson> {
        let removed = self
            .values
            .iter()
            .map(ValueKey::of)
            .collect::<DocumentTransformResult<HashSet<_>>>()?;

        let current = current_array(document, path)?;
        let mut seen = HashSet::with_capacity(current.len());
        let mut remaining = Vec::with_capacity(current.len());

        for item in current {
            let key = ValueKey::of(item)?;

            if !removed.contains(&key) && seen.insert(key) {
                remaining.push(item.clone());
            }
        }

        Ok(Bson::Array(remaining))
    }
}

/// The closed set of transforms an update payload can carry.
///
/// The associated constructors mirror the variant constructors and validate their operands
/// the same way.
///
/// # Example
///
/// ```ignore
/// use doctransform::transform::FieldTransform;
///
/// let transforms = vec![
///     FieldTransform::increment(1)?,
///     FieldTransform::maximum(100.0)?,
///     FieldTransform::array_union(["rust", "bson"])?,
/// ];
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum FieldTransform {
    Increment(Increment),
    Maximum(Maximum),
    Minimum(Minimum),
    ArrayUnion(ArrayUnion),
    ArrayRemove(ArrayRemove),
}

impl FieldTransform {
    /// Creates an [`Increment`] transform.
    pub fn increment(value: impl Into<Bson>) -> DocumentTransformResult<Self> {
        Ok(FieldTransform::Increment(Increment::new(value)?))
    }

    /// Creates a [`Maximum`] transform.
    pub fn maximum(value: impl Into<Bson>) -> DocumentTransformResult<Self> {
        Ok(FieldTransform::Maximum(Maximum::new(value)?))
    }

    /// Creates a [`Minimum`] transform.
    pub fn minimum(value: impl Into<Bson>) -> DocumentTransformResult<Self> {
        Ok(FieldTransform::Minimum(Minimum::new(value)?))
    }

    /// Creates an [`ArrayUnion`] transform.
    pub fn array_union<I, V>(values: I) -> DocumentTransformResult<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Bson>,
    {
        Ok(FieldTransform::ArrayUnion(ArrayUnion::new(values)?))
    }

    /// Creates an [`ArrayRemove`] transform.
    pub fn array_remove<I, V>(values: I) -> DocumentTransformResult<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Bson>,
    {
        Ok(FieldTransform::ArrayRemove(ArrayRemove::new(values)?))
    }

    /// Returns the name of the transform, for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            FieldTransform::Increment(_) => "Increment",
            FieldTransform::Maximum(_) => "Maximum",
            FieldTransform::Minimum(_) => "Minimum",
            FieldTransform::ArrayUnion(_) => "ArrayUnion",
            FieldTransform::ArrayRemove(_) => "ArrayRemove",
        }
    }
}

impl Transform for FieldTransform {
    fn apply(&self, document: &Document, path: &FieldPath) -> DocumentTransformResult<Bson> {
        tracing::trace!(field = %path, transform = self.name(), "applying field transform");

        match self {
            FieldTransform::Increment(transform) => transform.apply(document, path),
            FieldTransform::Maximum(transform) => transform.apply(document, path),
            FieldTransform::Minimum(transform) => transform.apply(document, path),
            FieldTransform::ArrayUnion(transform) => transform.apply(document, path),
            FieldTransform::ArrayRemove(transform) => transform.apply(document, path),
        }
    }
}

impl From<Increment> for FieldTransform {
    fn from(transform: Increment) -> Self {
        FieldTransform::Increment(transform)
    }
}

impl From<Maximum> for FieldTransform {
    fn from(transform: Maximum) -> Self {
        FieldTransform::Maximum(transform)
    }
}

impl From<Minimum> for FieldTransform {
    fn from(transform: Minimum) -> Self {
        FieldTransform::Minimum(transform)
    }
}

impl From<ArrayUnion> for FieldTransform {
    fn from(transform: ArrayUnion) -> Self {
        FieldTransform::ArrayUnion(transform)
    }
}

impl From<ArrayRemove> for FieldTransform {
    fn from(transform: ArrayRemove) -> Self {
        FieldTransform::ArrayRemove(transform)
    }
}

fn numeric_operand(transform: &str, value: Bson) -> DocumentTransformResult<Numeric> {
    Numeric::from_bson(&value).ok_or_else(|| {
        DocumentTransformError::InvalidOperand(format!(
            "{transform} expects an integer or float, got {:?}",
            value.element_type()
        ))
    })
}

fn list_operand<I, V>(transform: &str, values: I) -> DocumentTransformResult<Vec<Bson>>
where
    I: IntoIterator<Item = V>,
    V: Into<Bson>,
{
    let values = values
        .into_iter()
        .map(Into::into)
        .collect::<Vec<Bson>>();

    if values.is_empty() {
        return Err(DocumentTransformError::InvalidOperand(format!(
            "{transform} expects a non-empty list of values"
        )));
    }

    Ok(values)
}

/// Reads the field a transform targets, treating unreadable paths as absent.
fn current_value<'a>(document: &'a Document, path: &FieldPath) -> Option<&'a Bson> {
    match path::read(document, path) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::debug!(field = %path, reason = %err, "field unreadable, using transform default");
            None
        },
    }
}

/// The number an accumulating transform starts from: zero when the field is absent.
pub(crate) fn current_number(document: &Document, path: &FieldPath) -> DocumentTransformResult<Numeric> {
    match current_value(document, path) {
        Some(value) => Numeric::from_bson(value).ok_or_else(|| type_mismatch(path, "a number", value)),
        None => Ok(Numeric::zero()),
    }
}

/// The elements an array transform starts from: empty when the field is absent.
pub(crate) fn current_array<'a>(document: &'a Document, path: &FieldPath) -> DocumentTransformResult<&'a [Bson]> {
    match current_value(document, path) {
        Some(Bson::Array(items)) => Ok(items.as_slice()),
        Some(other) => Err(type_mismatch(path, "an array", other)),
        None => Ok(&[]),
    }
}

fn type_mismatch(path: &FieldPath, expected: &str, found: &Bson) -> DocumentTransformError {
    DocumentTransformError::TypeMismatch {
        path: path.to_string(),
        expected: expected.to_string(),
        found: format!("{:?}", found.element_type()),
    }
}

/// Keeps the current number unless `operand` compares to it as `replace_when`.
///
/// A missing or non-numeric field is overwritten by the operand.
fn clamp(document: &Document, path: &FieldPath, operand: Numeric, replace_when: Ordering) -> Bson {
    match current_value(document, path).and_then(Numeric::from_bson) {
        Some(current) if operand.compare(current) != Some(replace_when) => current.into(),
        _ => operand.into(),
    }
}
