use serde_json::Value;

use super::display_value;

/// Print just the headline answer from the output.
///
/// Looks for well-known result fields in priority order, then falls
/// back to the first field of the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let priority_keys = [
        "intrinsic_value_per_share",
        "wacc",
        "enterprise_value_dcf",
        "equity_value",
        "ttm_fcf",
    ];

    if let Value::Object(map) = result_obj {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", display_value(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, display_value(val));
            return;
        }
    }

    println!("{}", display_value(result_obj));
}
