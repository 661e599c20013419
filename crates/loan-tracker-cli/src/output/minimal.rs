use serde_json::Value;

use super::{cell_text, result_object};

/// Print just the key answer value from the output.
///
/// Looks for well-known result fields in order of priority, then falls
/// back to the first field in the result object.
pub fn print_minimal(value: &Value) {
    let Some(result) = result_object(value) else {
        println!("{}", cell_text(value, "null"));
        return;
    };

    let priority_keys = [
        "remaining_balance",
        "monthly_payment",
        "user_id",
        "id",
        "loan_id",
    ];

    if let Some(val) = priority_keys
        .iter()
        .filter_map(|key| result.get(*key))
        .find(|val| !val.is_null())
    {
        println!("{}", cell_text(val, "null"));
        return;
    }

    if let Some((key, val)) = result.iter().next() {
        println!("{}: {}", key, cell_text(val, "null"));
    }
}
