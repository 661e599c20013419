use serde_json::{Map, Value};
use std::io;

use super::{cell_text, result_object, row_field};

type StdoutWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write output as CSV to stdout.
///
/// A result carrying rows (`schedule`, `loans`) is written one row per
/// record; anything else becomes a two-column field/value listing.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match (result_object(value), value) {
        (Some(result), _) => match row_field(result) {
            Some((_, rows)) => write_rows(&mut wtr, rows),
            None => write_fields(&mut wtr, result),
        },
        (None, Value::Object(map)) => write_fields(&mut wtr, map),
        (None, Value::Array(rows)) => write_rows(&mut wtr, rows),
        (None, _) => {
            let _ = wtr.write_record([cell_text(value, "")]);
        }
    }

    let _ = wtr.flush();
}

fn write_fields(wtr: &mut StdoutWriter<'_>, map: &Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in map {
        let _ = wtr.write_record([key.as_str(), &cell_text(val, "")]);
    }
}

fn write_rows(wtr: &mut StdoutWriter<'_>, rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        for item in rows {
            let _ = wtr.write_record([cell_text(item, "")]);
        }
        return;
    };

    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    let _ = wtr.write_record(&headers);
    for item in rows.iter().filter_map(Value::as_object) {
        let row: Vec<String> = headers
            .iter()
            .map(|h| item.get(*h).map(|v| cell_text(v, "")).unwrap_or_default())
            .collect();
        let _ = wtr.write_record(&row);
    }
}
