//! A field-path transform engine for nested BSON documents.
//!
//! This crate is the core of the doctransform project and provides:
//!
//! - **Field paths** ([`path`]) - Dotted paths and the resolver that reads and writes through them
//! - **Update payloads** ([`update`]) - Ordered update documents and their leaf iterator
//! - **Field transforms** ([`transform`]) - Increment, maximum, minimum, array union and array remove
//! - **Transform engine** ([`engine`]) - Resolves an update against a document and merges it
//! - **Document conversions** ([`document`]) - JSON interop for BSON documents
//! - **Error handling** ([`error`]) - Error types and result types
//!
//! # Example
//!
//! ```ignore
//! use bson::doc;
//! use doctransform::{engine::merge, transform::FieldTransform, update::UpdateDocument};
//!
//! let mut document = doc! {};
//!
//! merge(
//!     &mut document,
//!     UpdateDocument::new().transform("a.b", FieldTransform::maximum(5)?),
//! )?;
//!
//! assert_eq!(document, doc! { "a": { "b": 5 } });
//! ```

#[allow(unused_extern_crates)]
extern crate self as doctransform_core;

pub mod document;
pub mod engine;
pub mod error;
pub mod path;
pub mod transform;
pub mod update;
pub mod value;
