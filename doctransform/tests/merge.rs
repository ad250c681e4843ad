//! End-to-end merge tests.
//!
//! Covers the documented merge scenarios, the non-idempotence of array unions and JSON interop.

use std::collections::HashSet;

use doctransform::{
    bson::{Bson, Document, doc},
    prelude::*,
};
use serde_json::json;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing_subscriber::filter::LevelFilter::TRACE)
        .with_test_writer()
        .try_init();
}

fn string_set(document: &Document, key: &str) -> HashSet<String> {
    document
        .get_array(key)
        .unwrap()
        .iter()
        .map(|item| item.as_str().unwrap().to_string())
        .collect()
}

// ============================================================================
// Documented scenarios
// ============================================================================

#[test]
fn increment_and_union() {
    init_tracing();

    let mut document = doc! { "count": 1, "tags": ["x"] };
    let update = UpdateDocument::new()
        .transform("count", FieldTransform::increment(2).unwrap())
        .transform("tags", FieldTransform::array_union(["y"]).unwrap());

    merge(&mut document, update).unwrap();

    assert_eq!(document, doc! { "count": 3, "tags": ["x", "y"] });
}

#[test]
fn maximum_on_empty_document_builds_path() {
    init_tracing();

    let mut document = doc! {};
    let update = UpdateDocument::new().transform("a.b", FieldTransform::maximum(5).unwrap());

    merge(&mut document, update).unwrap();

    assert_eq!(document, doc! { "a": { "b": 5 } });
}

#[test]
fn array_remove_yields_set_difference() {
    init_tracing();

    let mut document = doc! { "tags": ["x", "y", "z"] };
    let update = UpdateDocument::new().transform("tags", FieldTransform::array_remove(["y"]).unwrap());

    merge(&mut document, update).unwrap();

    let expected: HashSet<String> = ["x", "z"].into_iter().map(String::from).collect();
    assert_eq!(string_set(&document, "tags"), expected);
}

#[test]
fn array_union_is_not_idempotent() {
    let original = doc! { "tags": ["x"] };
    let union = FieldTransform::array_union(["y"]).unwrap();

    let mut once = original.clone();
    merge(&mut once, UpdateDocument::new().transform("tags", union.clone())).unwrap();
    assert_eq!(once, doc! { "tags": ["x", "y"] });

    let mut twice = once.clone();
    merge(&mut twice, UpdateDocument::new().transform("tags", union)).unwrap();
    assert_eq!(twice, doc! { "tags": ["x", "y", "y"] });
    assert_ne!(once, twice);
}

// ============================================================================
// Merge semantics
// ============================================================================

#[test]
fn literal_dotted_keys_are_expanded() {
    let mut document = doc! { "owner": "nobody" };
    let update = UpdateDocument::new().set("owner.name", "Alice").set("owner.age", 30);

    merge(&mut document, update).unwrap();

    assert_eq!(document, doc! { "owner": { "name": "Alice", "age": 30 } });
}

#[test]
fn nested_update_from_bson_document() {
    let mut document = doc! { "profile": { "visits": 1, "stale": true } };

    let mut update = UpdateDocument::from(doc! { "profile": { "active": true } });
    if let Some(FieldUpdate::Nested(profile)) = update.get("profile").cloned() {
        update.insert(
            "profile",
            profile.transform("visits", FieldTransform::increment(1).unwrap()),
        );
    }

    merge(&mut document, update).unwrap();

    assert_eq!(document, doc! { "profile": { "active": true, "visits": 2 } });
}

#[test]
fn empty_nested_update_clears_field() {
    let mut document = doc! { "settings": { "theme": "dark" } };

    merge(&mut document, UpdateDocument::from(doc! { "settings": {} })).unwrap();

    assert_eq!(document, doc! { "settings": {} });
}

#[test]
fn clamps_overwrite_non_numeric_fields() {
    let mut document = doc! { "low": "n/a", "high": 12.5 };
    let update = UpdateDocument::new()
        .transform("low", FieldTransform::minimum(3).unwrap())
        .transform("high", FieldTransform::minimum(10).unwrap());

    merge(&mut document, update).unwrap();

    assert_eq!(document, doc! { "low": 3, "high": 10 });
}

#[test]
fn unreadable_path_uses_default() {
    // Reading "stats.count" descends into an array; the increment treats it as absent.
    let mut document = doc! { "stats": [1, 2], "kept": true };
    let update = UpdateDocument::new().transform("stats.count", FieldTransform::increment(4).unwrap());

    merge(&mut document, update).unwrap();

    assert_eq!(document, doc! { "stats": { "count": 4 }, "kept": true });
}

#[test]
fn array_remove_over_documents_fails() {
    let mut document = doc! { "items": [{ "id": 1 }] };
    let update = UpdateDocument::new().transform("items", FieldTransform::array_remove([1]).unwrap());

    let result = merge(&mut document, update);

    assert!(matches!(result, Err(DocumentTransformError::UnhashableElement(_))));
    assert_eq!(document, doc! { "items": [{ "id": 1 }] });
}

#[test]
fn overlapping_leaves_conflict_in_either_order() {
    init_tracing();

    let parent_first = UpdateDocument::new()
        .set("a", "scalar")
        .transform("a.b", FieldTransform::maximum(1).unwrap());
    let parent_last = UpdateDocument::new()
        .transform("a.b", FieldTransform::increment(1).unwrap())
        .set("a", 5);

    for update in [parent_first, parent_last] {
        let mut document = doc! { "a": { "b": 1 } };

        let result = merge(&mut document, update);

        assert!(matches!(
            result,
            Err(DocumentTransformError::PathConflict { ref parent, ref child }) if parent == "a" && child == "a.b"
        ));
        assert_eq!(document, doc! { "a": { "b": 1 } });
    }
}

#[test]
fn wrong_typed_fields_are_not_overwritten() {
    init_tracing();

    let mut document = doc! { "count": "many", "tags": "x" };

    let increment = merge(
        &mut document,
        UpdateDocument::new().transform("count", FieldTransform::increment(2).unwrap()),
    );
    let array_union = merge(
        &mut document,
        UpdateDocument::new().transform("tags", FieldTransform::array_union(["y"]).unwrap()),
    );

    assert!(matches!(
        increment,
        Err(DocumentTransformError::TypeMismatch { ref path, .. }) if path == "count"
    ));
    assert!(matches!(
        array_union,
        Err(DocumentTransformError::TypeMismatch { ref path, .. }) if path == "tags"
    ));
    assert_eq!(document, doc! { "count": "many", "tags": "x" });
}

#[test]
fn invalid_operands_fail_at_construction() {
    assert!(matches!(
        FieldTransform::array_union(Vec::<Bson>::new()),
        Err(DocumentTransformError::InvalidOperand(_))
    ));
    assert!(matches!(
        FieldTransform::increment("two"),
        Err(DocumentTransformError::InvalidOperand(_))
    ));
}

#[test]
fn replaying_engine_agrees_with_default() {
    let original = doc! { "count": 1, "tags": ["x"] };
    let update = UpdateDocument::new()
        .transform("count", FieldTransform::increment(2.5).unwrap())
        .transform("tags", FieldTransform::array_union(["x"]).unwrap());

    let mut single = original.clone();
    let mut double = original;

    merge(&mut single, update.clone()).unwrap();
    TransformEngine::builder()
        .replay_accumulators(true)
        .build()
        .merge(&mut double, update)
        .unwrap();

    assert_eq!(single, doc! { "count": 3.5, "tags": ["x", "x"] });
    assert_eq!(single, double);
}

// ============================================================================
// JSON interop
// ============================================================================

#[test]
fn merge_json_document() {
    let mut document = Document::from_json(json!({ "visits": 1, "tags": ["a"] })).unwrap();
    let update = UpdateDocument::new()
        .transform("visits", FieldTransform::increment(1).unwrap())
        .transform("tags", FieldTransform::array_union(["b"]).unwrap());

    merge(&mut document, update).unwrap();

    assert_eq!(document.to_json().unwrap(), json!({ "visits": 2, "tags": ["a", "b"] }));
}
