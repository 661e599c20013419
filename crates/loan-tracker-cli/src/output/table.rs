use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{cell_text, result_object, row_field};

/// Format output as tables using the tabled crate.
///
/// Scalar result fields go in a Field/Value table; a nested row array such
/// as `schedule` gets its own table underneath.
pub fn print_table(value: &Value) {
    match (result_object(value), value.as_object()) {
        (Some(result), Some(envelope)) => print_result(result, envelope),
        (None, Some(map)) => print_fields(map),
        _ => match value {
            Value::Array(rows) => print_rows(rows),
            _ => println!("{}", value),
        },
    }
}

fn print_result(result: &Map<String, Value>, envelope: &Map<String, Value>) {
    let rows = row_field(result);
    let scalars: Map<String, Value> = result
        .iter()
        .filter(|(key, _)| rows.map_or(true, |(name, _)| name != key.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    if !scalars.is_empty() {
        print_fields(&scalars);
    }
    if let Some((name, rows)) = rows {
        println!("\n{}:", name);
        print_rows(rows);
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_fields(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_rows(rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        if rows.is_empty() {
            println!("(empty)");
        }
        for item in rows {
            println!("{}", format_value(item));
        }
        return;
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(&headers);
    for item in rows.iter().filter_map(Value::as_object) {
        let row: Vec<String> = headers
            .iter()
            .map(|h| item.get(h.as_str()).map(format_value).unwrap_or_default())
            .collect();
        builder.push_record(row);
    }
    println!("{}", Table::from(builder));
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        _ => cell_text(value, "null"),
    }
}
