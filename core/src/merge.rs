use reqwest::header::HeaderMap;
use serde_json::Value;

/// Deep-merge two JSON values, with `overlay` winning on conflicts.
///
/// Objects are merged key by key and recursively. Arrays are concatenated.
/// Any other overlay value replaces the base value outright.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            let mut output = base_map.clone();
            for (key, overlay_value) in overlay_map {
                let merged = match output.get(key) {
                    Some(existing) => deep_merge(existing, overlay_value),
                    None => overlay_value.clone(),
                };
                output.insert(key.clone(), merged);
            }
            Value::Object(output)
        }
        (Value::Array(base_items), Value::Array(overlay_items)) => {
            Value::Array(base_items.iter().chain(overlay_items).cloned().collect())
        }
        (_, overlay) => overlay.clone(),
    }
}

/// Merge header maps key by key.
///
/// Every header name present in `overlay` replaces all values stored under
/// that name in `base`; names only present in `base` are kept.
pub fn merge_headers(base: &HeaderMap, overlay: &HeaderMap) -> HeaderMap {
    let mut output = base.clone();
    for name in overlay.keys() {
        output.remove(name);
        for value in overlay.get_all(name) {
            output.append(name.clone(), value.clone());
        }
    }
    output
}
