pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(value) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("JSON serialization error: {}", e),
        },
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// The `result` object of a computation envelope, if present.
pub(crate) fn result_object(value: &Value) -> Option<&Map<String, Value>> {
    value.as_object()?.get("result")?.as_object()
}

/// First field of a result holding an array of objects, e.g. `schedule`
/// or `loans`.
pub(crate) fn row_field(result: &Map<String, Value>) -> Option<(&str, &[Value])> {
    result.iter().find_map(|(key, val)| match val {
        Value::Array(rows) if rows.iter().all(Value::is_object) && !rows.is_empty() => {
            Some((key.as_str(), rows.as_slice()))
        }
        _ => None,
    })
}

/// Render a scalar for a cell; `null_text` stands in for JSON null.
pub(crate) fn cell_text(value: &Value, null_text: &str) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => null_text.to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_field_finds_schedule() {
        let value = json!({
            "result": {
                "monthly_payment": "85.61",
                "schedule": [{"month": 1}, {"month": 2}]
            }
        });
        let result = result_object(&value).unwrap();
        let (name, rows) = row_field(result).unwrap();
        assert_eq!(name, "schedule");
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_row_field_ignores_scalar_arrays() {
        let value = json!({ "result": { "user_ids": [1, 2] } });
        assert!(row_field(result_object(&value).unwrap()).is_none());
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&json!("170.15"), ""), "170.15");
        assert_eq!(cell_text(&json!(10), ""), "10");
        assert_eq!(cell_text(&Value::Null, "null"), "null");
    }
}
