//! Main doctransform crate: apply field transforms to nested documents.
//!
//! This crate is the primary entry point for users of doctransform. It re-exports the core
//! types from `doctransform-core` along with [`bson`], whose [`Document`](bson::Document) is
//! the document model the engine works on.
//!
//! # Features
//!
//! - **Dotted field paths** - Address nested fields as `"stats.visits"`, intermediate documents are created on write
//! - **Field transforms** - Increment, maximum, minimum, array union and array remove, computed from the current document
//! - **Staged merges** - An update is fully resolved before the document is touched
//! - **JSON interop** - Convert documents to and from `serde_json::Value`
//!
//! # Quick Start
//!
//! ```ignore
//! use doctransform::{prelude::*, bson::doc};
//!
//! let mut document = doc! { "count": 1, "tags": ["x", "y", "z"] };
//!
//! let update = UpdateDocument::new()
//!     .transform("count", FieldTransform::increment(2)?)
//!     .transform("tags", FieldTransform::array_remove(["y"])?)
//!     .transform("best", FieldTransform::maximum(10)?)
//!     .set("owner.name", "Alice");
//!
//! merge(&mut document, update)?;
//!
//! // count == 3, tags == ["x", "z"], best == 10, owner == { name: "Alice" }
//! println!("{document}");
//! ```
//!
//! # Configuring the engine
//!
//! [`merge`](engine::merge) uses the default engine. Build a [`TransformEngine`](engine::TransformEngine)
//! to change its behavior:
//!
//! ```ignore
//! use doctransform::prelude::*;
//!
//! let engine = TransformEngine::builder()
//!     .replay_accumulators(true)
//!     .build();
//!
//! engine.merge(&mut document, update)?;
//! ```
//!
//! # Working with JSON
//!
//! ```ignore
//! use doctransform::prelude::*;
//! use serde_json::json;
//!
//! let mut document = bson::Document::from_json(json!({ "visits": 1 }))?;
//! merge(&mut document, UpdateDocument::new().transform("visits", FieldTransform::increment(1)?))?;
//!
//! assert_eq!(document.to_json()?, json!({ "visits": 2 }));
//! ```

pub mod prelude;

pub use doctransform_core::{document, engine, error, path, transform, update, value};

pub use doctransform_core::engine::merge;

// Re-export BSON types for convenience
pub use bson;
