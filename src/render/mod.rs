//! Terminal rendering of view state: aligned text tables, CSV, pretty JSON,
//! flattened key/value listings for opaque report payloads and bar rows for
//! chart series.

pub mod table;

pub use table::Table;

use crate::domain::model::ChartPoint;
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

pub fn to_json<T: Serialize + ?Sized>(data: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(data)?)
}

pub fn money(amount: f64) -> String {
    format!("{:.2}", amount)
}

pub fn quantity(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

pub fn optional<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_else(|| "-".to_string())
}

/// Scalar JSON value as a table cell.
pub fn cell(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if !n.is_i64() && !n.is_u64() => money(f),
            _ => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Flattens nested objects into `a.b.c` paths. Arrays of scalars are joined,
/// arrays of objects are indexed (`rows[0].amount`).
pub fn flatten_json(value: &Value) -> Vec<(String, String)> {
    let mut out = Vec::new();
    flatten_into(value, String::new(), &mut out);
    out
}

fn flatten_into(value: &Value, prefix: String, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_into(child, path, out);
            }
        }
        Value::Array(items) if items.iter().any(|v| v.is_object() || v.is_array()) => {
            for (index, child) in items.iter().enumerate() {
                flatten_into(child, format!("{}[{}]", prefix, index), out);
            }
        }
        Value::Array(items) => {
            let joined: Vec<String> = items.iter().map(cell).collect();
            out.push((prefix, joined.join(", ")));
        }
        scalar => out.push((prefix, cell(scalar))),
    }
}

/// `flatten_json` with every path rooted at `key`.
pub fn flatten_under(key: &str, value: &Value) -> Vec<(String, String)> {
    flatten_json(value)
        .into_iter()
        .map(|(path, cell)| {
            let name = if path.is_empty() {
                key.to_string()
            } else if path.starts_with('[') {
                format!("{}{}", key, path)
            } else {
                format!("{}.{}", key, path)
            };
            (name, cell)
        })
        .collect()
}

/// Rows of JSON objects as a table. Columns follow the first row's key
/// order; keys first seen in later rows are appended.
pub fn json_rows_table(rows: &[Value]) -> Table {
    let mut headers: Vec<String> = Vec::new();
    for row in rows {
        if let Value::Object(map) = row {
            for key in map.keys() {
                if !headers.iter().any(|h| h == key) {
                    headers.push(key.clone());
                }
            }
        }
    }

    let mut table = Table::new(headers.clone());
    for row in rows {
        table.push(
            headers
                .iter()
                .map(|h| row.get(h).map(cell).unwrap_or_default())
                .collect(),
        );
    }
    table
}

/// Labelled horizontal bars scaled to the largest value.
pub fn bar_chart(points: &[ChartPoint], width: usize) -> String {
    if points.is_empty() {
        return "(no data)".to_string();
    }

    let label_width = points.iter().map(|p| p.label.chars().count()).max().unwrap_or(0);
    let max = points.iter().map(|p| p.value.abs()).fold(0.0_f64, f64::max);

    points
        .iter()
        .map(|point| {
            let bar_len = if max > 0.0 {
                ((point.value.abs() / max) * width as f64).round() as usize
            } else {
                0
            };
            format!(
                "{:<label_width$}  {:<width$}  {}",
                point.label,
                "#".repeat(bar_len),
                quantity(point.value),
                label_width = label_width,
                width = width
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
