use unicode_width::UnicodeWidthStr;

use crate::db::{CellValue, QueryResult};

/// psql-style aligned table with a row count footer.
pub fn to_table(result: &QueryResult) -> String {
    if result.columns.is_empty() {
        return "(0 rows)\n".to_string();
    }

    let widths: Vec<usize> = result.columns.iter().map(|c| c.max_width).collect();
    let mut output = String::new();

    let header: Vec<String> = result
        .columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| pad(&c.name, *w))
        .collect();
    output.push(' ');
    output.push_str(&header.join(" | "));
    output.push('\n');

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(w + 2)).collect();
    output.push_str(&rule.join("+"));
    output.push('\n');

    for row in &result.rows {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| pad(&cell.display().replace('\n', " "), *w))
            .collect();
        output.push(' ');
        output.push_str(cells.join(" | ").trim_end());
        output.push('\n');
    }

    let count = result.row_count();
    output.push_str(&format!(
        "({} {})\n",
        count,
        if count == 1 { "row" } else { "rows" }
    ));
    output
}

pub fn to_csv(result: &QueryResult) -> String {
    let mut output = String::new();

    let headers: Vec<String> = result.columns.iter().map(|c| csv_escape(&c.name)).collect();
    output.push_str(&headers.join(","));
    output.push('\n');

    for row in &result.rows {
        let cells: Vec<String> = row
            .iter()
            .map(|cell| csv_escape(&cell_to_csv(cell)))
            .collect();
        output.push_str(&cells.join(","));
        output.push('\n');
    }

    output
}

/// Array of objects keyed by column name.
pub fn to_json(result: &QueryResult) -> String {
    let rows: Vec<serde_json::Value> = result
        .rows
        .iter()
        .map(|row| {
            let obj: serde_json::Map<String, serde_json::Value> = row
                .iter()
                .enumerate()
                .map(|(i, cell)| {
                    let name = result
                        .columns
                        .get(i)
                        .map(|c| c.name.clone())
                        .unwrap_or_else(|| format!("column_{}", i));
                    (name, cell_to_json(cell))
                })
                .collect();
            serde_json::Value::Object(obj)
        })
        .collect();

    serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string())
}

fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(UnicodeWidthStr::width(text));
    format!("{}{}", text, " ".repeat(fill))
}

fn cell_to_csv(cell: &CellValue) -> String {
    match cell {
        CellValue::Null => String::new(),
        other => other.display(),
    }
}

fn cell_to_json(cell: &CellValue) -> serde_json::Value {
    match cell {
        CellValue::Null => serde_json::Value::Null,
        CellValue::Bool(b) => serde_json::Value::Bool(*b),
        CellValue::Int(i) => serde_json::json!(*i),
        CellValue::Float(f) => serde_json::json!(*f),
        CellValue::Numeric(d) => d
            .to_string()
            .parse::<serde_json::Number>()
            .map(serde_json::Value::Number)
            .unwrap_or_else(|_| serde_json::Value::String(d.to_string())),
        CellValue::Json(j) => j.clone(),
        other => serde_json::Value::String(other.display()),
    }
}

fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
