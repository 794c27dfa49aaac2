use proptest::prelude::*;
use serde_json::{json, Value};

/// Strategy for generating location slugs
pub fn slug_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,20}"
}

/// Strategy for generating a breaker call outcome sequence (true = success)
pub fn outcome_sequence_strategy() -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(any::<bool>(), 0..40)
}

/// Strategy for generating arbitrary leaf values, well-formed or not
pub fn leaf_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i32>().prop_map(Value::from),
        (-1000.0f64..1000.0).prop_map(Value::from),
        "[a-zA-Z _-]{0,12}".prop_map(Value::from),
        Just(json!([])),
        Just(json!({})),
    ]
}

/// Strategy for generating modifier group payloads with randomly missing fields
pub fn modifier_group_strategy() -> impl Strategy<Value = Value> {
    (
        prop::option::of("[a-z]{1,8}"),
        prop::option::of("[A-Za-z ]{1,12}"),
        prop::option::of("[a-z-]{1,8}"),
        prop::option::of(-5.0f64..5.0),
        prop::collection::vec(
            (prop::option::of("[a-z]{1,6}"), prop::option::of("[A-Za-z]{1,8}"), leaf_value_strategy()),
            0..5,
        ),
    )
        .prop_map(|(id, name, slug, display_order, options)| {
            let options: Vec<Value> = options
                .into_iter()
                .map(|(key, name, available)| json!({"_key": key, "name": name, "available": available}))
                .collect();
            json!({
                "_id": id,
                "name": name,
                "slug": slug,
                "displayOrder": display_order,
                "required": true,
                "options": options
            })
        })
}

/// Strategy for generating menu item payloads with valid identity fields and
/// arbitrary leaves
pub fn menu_item_strategy() -> impl Strategy<Value = Value> {
    (
        "[a-z]{1,10}",
        prop::collection::vec(modifier_group_strategy(), 0..4),
        prop::collection::vec(leaf_value_strategy(), 0..4),
        prop::collection::vec((prop::option::of(slug_strategy()), leaf_value_strategy()), 0..4),
    )
        .prop_map(|(slug, groups, badges, overrides)| {
            let overrides: Vec<Value> = overrides
                .into_iter()
                .map(|(loc, price)| json!({"loc": loc, "price": price}))
                .collect();
            json!({
                "_id": format!("item-{slug}"),
                "name": slug,
                "slug": slug,
                "categorySlug": "baskets",
                "badges": badges,
                "overrides": overrides,
                "modifierGroups": groups
            })
        })
}
