//! Convenient re-exports of commonly used types from doctransform.
//!
//! ```ignore
//! use doctransform::prelude::*;
//! ```

pub use doctransform_core::{
    document::DocumentExt,
    engine::{merge, TransformEngine, TransformEngineBuilder, TransformEngineConfig},
    error::{DocumentTransformError, DocumentTransformResult},
    path::FieldPath,
    transform::{ArrayRemove, ArrayUnion, FieldTransform, Increment, Maximum, Minimum, Transform},
    update::{FieldUpdate, UpdateDocument},
};
