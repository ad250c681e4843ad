//! Property tests for the field transforms.

use std::collections::HashSet;

use doctransform::{
    bson::{Bson, doc},
    prelude::*,
};
use proptest::prelude::*;

fn as_i64(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(value) => Some(i64::from(*value)),
        Bson::Int64(value) => Some(*value),
        _ => None,
    }
}

fn strings(values: &[Bson]) -> HashSet<String> {
    values
        .iter()
        .filter_map(|value| value.as_str().map(str::to_string))
        .collect()
}

fn arb_tags() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-e]", 0..8)
}

proptest! {
    #[test]
    fn prop_increment_absent_is_operand(n in any::<i32>(), other in any::<i32>()) {
        let document = doc! { "other": other };
        let result = Increment::new(n).unwrap().apply(&document, &"count".into()).unwrap();
        prop_assert_eq!(result, Bson::Int32(n));
    }

    #[test]
    fn prop_increment_integers_add(c in any::<i32>(), n in any::<i32>()) {
        let document = doc! { "count": c };
        let result = Increment::new(n).unwrap().apply(&document, &"count".into()).unwrap();
        prop_assert_eq!(as_i64(&result), Some(i64::from(c) + i64::from(n)));
    }

    #[test]
    fn prop_increment_float_promotes(c in any::<i32>(), n in -1.0e9..1.0e9f64) {
        let document = doc! { "count": c };
        let result = Increment::new(n).unwrap().apply(&document, &"count".into()).unwrap();
        prop_assert_eq!(result, Bson::Double(f64::from(c) + n));
    }

    #[test]
    fn prop_maximum_minimum(c in any::<i64>(), n in any::<i64>()) {
        let document = doc! { "v": c };

        let max = Maximum::new(n).unwrap().apply(&document, &"v".into()).unwrap();
        let min = Minimum::new(n).unwrap().apply(&document, &"v".into()).unwrap();

        prop_assert_eq!(as_i64(&max), Some(c.max(n)));
        prop_assert_eq!(as_i64(&min), Some(c.min(n)));
    }

    #[test]
    fn prop_union_appends_everything(current in arb_tags(), values in arb_tags().prop_filter("non-empty", |v| !v.is_empty())) {
        let document = doc! { "tags": current.clone() };
        let result = ArrayUnion::new(values.clone()).unwrap().apply(&document, &"tags".into()).unwrap();

        let expected: Vec<Bson> = current.iter().chain(values.iter()).cloned().map(Bson::String).collect();
        prop_assert_eq!(result, Bson::Array(expected));
    }

    #[test]
    fn prop_remove_is_set_difference(current in arb_tags(), values in arb_tags().prop_filter("non-empty", |v| !v.is_empty())) {
        let document = doc! { "tags": current.clone() };
        let result = ArrayRemove::new(values.clone()).unwrap().apply(&document, &"tags".into()).unwrap();

        let Bson::Array(items) = result else {
            return Err(TestCaseError::fail("expected an array"));
        };

        let removed: HashSet<String> = values.into_iter().collect();
        let expected: HashSet<String> = current.into_iter().filter(|tag| !removed.contains(tag)).collect();

        prop_assert_eq!(items.len(), expected.len());
        prop_assert_eq!(strings(&items), expected);
    }
}
