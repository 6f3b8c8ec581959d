//! Field-by-field merging of configuration tiers.
//!
//! Objects merge recursively; any other overlay value replaces the base. A null
//! overlay means "not specified" and keeps the base value.

use serde_json::Value;

/// Merge `overlay` into `base` in place.
pub fn merge_into(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_into(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, overlay) => *slot = overlay,
    }
}

/// Merge two values, `overlay` winning.
pub fn deep_merge(mut base: Value, overlay: Value) -> Value {
    merge_into(&mut base, overlay);
    base
}

/// Merge tiers in order, later tiers winning.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    values.into_iter().fold(Value::Null, deep_merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn overlay_port_keeps_other_server_keys() {
        let base = json!({"server": {"host": "127.0.0.1", "port": 8080}});
        let overlay = json!({"server": {"port": 9000}});
        assert_eq!(
            deep_merge(base, overlay),
            json!({"server": {"host": "127.0.0.1", "port": 9000}})
        );
    }

    #[test]
    fn null_overlay_keeps_base() {
        let base = json!({"auth": {"user_header": "x-user-id"}});
        let overlay = json!({"auth": {"user_header": null}});
        assert_eq!(
            deep_merge(base, overlay),
            json!({"auth": {"user_header": "x-user-id"}})
        );
    }

    #[test]
    fn scalars_and_arrays_replace() {
        let base = json!({"a": [1, 2], "b": {"c": 1}});
        let overlay = json!({"a": [3], "b": 5});
        assert_eq!(deep_merge(base, overlay), json!({"a": [3], "b": 5}));
    }

    #[test]
    fn tiers_apply_in_order() {
        let merged = deep_merge_all(vec![
            json!({"server": {"port": 1, "host": "a"}}),
            json!({"server": {"port": 2}}),
            json!({"server": {"host": "c"}}),
        ]);
        assert_eq!(merged, json!({"server": {"port": 2, "host": "c"}}));
    }

    #[test]
    fn merging_into_nothing_takes_overlay() {
        assert_eq!(deep_merge_all(vec![json!({"x": 1})]), json!({"x": 1}));
    }
}
