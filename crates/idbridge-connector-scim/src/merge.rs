//! Recursive JSON tree merge.
//!
//! Used once per write request to fold the custom-attribute fragment
//! into the serialized resource before transmission. There are no
//! diffing or removal semantics: fields absent from the update leave
//! the base untouched.

use serde_json::Value;

/// Merge `update` into `base`, mutating `base`.
///
/// - object + object: recurse per key, inserting keys new to the base
/// - array + array: merge element-by-element by position, recursing
///   into paired elements and appending trailing update elements;
///   arrays are never merged by key or identity, so callers must keep
///   array ordering stable between base and update
/// - anything else: the update value replaces the base value outright
pub fn merge(base: &mut Value, update: &Value) {
    match (base, update) {
        (Value::Object(base_map), Value::Object(update_map)) => {
            for (key, update_value) in update_map {
                match base_map.get_mut(key) {
                    Some(base_value) => merge(base_value, update_value),
                    None => {
                        base_map.insert(key.clone(), update_value.clone());
                    }
                }
            }
        }
        (Value::Array(base_arr), Value::Array(update_arr)) => {
            for (idx, update_value) in update_arr.iter().enumerate() {
                match base_arr.get_mut(idx) {
                    Some(base_value) => merge(base_value, update_value),
                    None => base_arr.push(update_value.clone()),
                }
            }
        }
        (base_slot, update_value) => {
            *base_slot = update_value.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn disjoint_keys_are_additive() {
        let mut base = json!({
            "userName": "alice",
            "active": true,
            "emails": [{"type": "work", "value": "a@x"}]
        });
        let original = base.clone();
        let update = json!({
            "urn:custom:schema": {"department": "Treasury"}
        });

        merge(&mut base, &update);

        // All original keys unchanged, exactly the fragment's key added.
        for (key, value) in original.as_object().unwrap() {
            assert_eq!(base.get(key), Some(value));
        }
        assert_eq!(
            base.get("urn:custom:schema"),
            Some(&json!({"department": "Treasury"}))
        );
    }

    #[test]
    fn nested_objects_recurse() {
        let mut base = json!({"name": {"givenName": "Alice", "familyName": "Smith"}});
        let update = json!({"name": {"familyName": "Jones", "middleName": "Q"}});

        merge(&mut base, &update);

        assert_eq!(
            base,
            json!({"name": {"givenName": "Alice", "familyName": "Jones", "middleName": "Q"}})
        );
    }

    #[test]
    fn arrays_merge_positionally_and_append() {
        let mut base = json!({"emails": [{"type": "work", "value": "a@x"}]});
        let update = json!({"emails": [
            {"primary": true},
            {"type": "home", "value": "b@x"}
        ]});

        merge(&mut base, &update);

        assert_eq!(
            base,
            json!({"emails": [
                {"type": "work", "value": "a@x", "primary": true},
                {"type": "home", "value": "b@x"}
            ]})
        );
    }

    #[test]
    fn scalars_are_replaced() {
        let mut base = json!({"active": true, "title": "Engineer"});
        let update = json!({"active": false});

        merge(&mut base, &update);

        assert_eq!(base, json!({"active": false, "title": "Engineer"}));
    }

    #[test]
    fn type_mismatch_replaces_wholesale() {
        let mut base = json!({"value": ["a", "b"]});
        let update = json!({"value": "scalar-now"});

        merge(&mut base, &update);

        assert_eq!(base, json!({"value": "scalar-now"}));
    }
}
