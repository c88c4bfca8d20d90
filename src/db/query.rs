use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;
use tokio_postgres::{
    error::ErrorPosition,
    types::{FromSql, Type},
    Row,
};
use uuid::Uuid;

/// Broad class of a failed statement, derived from its SQLSTATE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Class 42 syntax errors; usually an untranslated MySQL construct.
    Syntax,
    /// Missing table/column, type mismatch, undefined function.
    Semantic,
    /// Runtime failures such as division by zero or constraint violations.
    Execution,
    Transaction,
    Connection,
    Unknown,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorCategory::Syntax => "Syntax Error",
            ErrorCategory::Semantic => "Semantic Error",
            ErrorCategory::Execution => "Execution Error",
            ErrorCategory::Transaction => "Transaction Error",
            ErrorCategory::Connection => "Connection Error",
            ErrorCategory::Unknown => "Error",
        };
        f.write_str(label)
    }
}

/// A database-side failure, with position info resolved against the SQL
/// text that was actually sent (the translated one).
#[derive(Debug, Clone)]
pub struct StructuredError {
    pub category: ErrorCategory,
    /// SQLSTATE, empty for client-side failures.
    pub code: String,
    pub message: String,
    pub detail: Option<String>,
    pub hint: Option<String>,
    /// 1-based character offset reported by the server.
    pub position: Option<u32>,
    pub table: Option<String>,
    pub column: Option<String>,
    pub constraint: Option<String>,
    pub line: Option<usize>,
    pub col: Option<usize>,
}

impl StructuredError {
    pub fn from_pg(err: &tokio_postgres::Error, sql: &str) -> Self {
        let Some(db) = err.as_db_error() else {
            let category = if err.source().is_some() {
                ErrorCategory::Connection
            } else {
                ErrorCategory::Unknown
            };
            return Self {
                detail: err.source().map(|e| e.to_string()),
                ..Self::new(category, err.to_string())
            };
        };

        let code = db.code().code().to_string();
        let position = match db.position() {
            Some(ErrorPosition::Original(pos)) => Some(*pos),
            _ => None,
        };
        let (line, col) = position
            .map(|pos| line_col(sql, pos as usize))
            .unwrap_or((None, None));

        Self {
            category: categorize_sqlstate(&code),
            code,
            message: db.message().to_string(),
            detail: db.detail().map(str::to_string),
            hint: db.hint().map(str::to_string),
            position,
            table: db.table().map(str::to_string),
            column: db.column().map(str::to_string),
            constraint: db.constraint().map(str::to_string),
            line,
            col,
        }
    }

    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            code: String::new(),
            message: message.into(),
            detail: None,
            hint: None,
            position: None,
            table: None,
            column: None,
            constraint: None,
            line: None,
            col: None,
        }
    }

    /// Multi-line rendering for terminals and logs.
    pub fn display_full(&self) -> String {
        let mut lines = vec![format!("{}: {}", self.category, self.message)];
        if let (Some(line), Some(col)) = (self.line, self.col) {
            lines.push(format!("  at line {}, column {}", line, col));
        }
        if !self.code.is_empty() {
            lines.push(format!("  SQLSTATE: {}", self.code));
        }
        if let Some(detail) = &self.detail {
            lines.push(format!("  Detail: {}", detail));
        }
        if let Some(hint) = &self.hint {
            lines.push(format!("  Hint: {}", hint));
        }
        match (&self.table, &self.column) {
            (Some(table), Some(column)) => lines.push(format!("  Column: {}.{}", table, column)),
            (Some(table), None) => lines.push(format!("  Table: {}", table)),
            _ => {}
        }
        if let Some(constraint) = &self.constraint {
            lines.push(format!("  Constraint: {}", constraint));
        }
        lines.join("\n")
    }
}

impl fmt::Display for StructuredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.code.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{} (SQLSTATE {})", self.message, self.code)
        }
    }
}

impl StdError for StructuredError {}

/// 1-based character position → 1-based (line, column).
fn line_col(sql: &str, position: usize) -> (Option<usize>, Option<usize>) {
    if position == 0 || sql.is_empty() {
        return (Some(1), Some(1));
    }
    let mut line = 1;
    let mut col = 1;
    for ch in sql.chars().take(position - 1) {
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (Some(line), Some(col))
}

fn categorize_sqlstate(code: &str) -> ErrorCategory {
    match code.get(..2) {
        Some("42") if code == "42601" || code == "42000" => ErrorCategory::Syntax,
        // 42P01 undefined_table, 42703 undefined_column, 42883 undefined_function
        Some("42") => ErrorCategory::Semantic,
        Some("22" | "23" | "53" | "54" | "55" | "57") => ErrorCategory::Execution,
        Some("25" | "40") => ErrorCategory::Transaction,
        Some("08") => ErrorCategory::Connection,
        _ => ErrorCategory::Unknown,
    }
}

/// Rows decoded without a destination type, for display.
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub columns: Vec<ColumnInfo>,
    pub rows: Vec<Vec<CellValue>>,
    pub execution_time: Duration,
}

#[derive(Debug, Clone)]
pub struct ColumnInfo {
    pub name: String,
    pub type_name: String,
    pub max_width: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Numeric(Decimal),
    Text(String),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Json(serde_json::Value),
    /// Non-null value of a type with no text form, e.g. `interval`.
    /// Holds the type name.
    Unsupported(String),
}

impl CellValue {
    pub fn display(&self) -> String {
        match self {
            CellValue::Null => "NULL".to_string(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::Numeric(d) => d.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Bytes(b) => format!("[{} bytes]", b.len()),
            CellValue::Uuid(u) => u.to_string(),
            CellValue::Date(d) => d.to_string(),
            CellValue::Time(t) => t.to_string(),
            CellValue::DateTime(dt) => dt.to_string(),
            CellValue::TimestampTz(dt) => dt.to_string(),
            CellValue::Json(j) => j.to_string(),
            CellValue::Unsupported(type_name) => format!("[{}]", type_name),
        }
    }

    pub fn display_width(&self) -> usize {
        unicode_width::UnicodeWidthStr::width(self.display().as_str())
    }
}

impl QueryResult {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub(crate) fn from_rows(rows: &[Row], execution_time: Duration) -> Self {
        let Some(first) = rows.first() else {
            return Self {
                columns: Vec::new(),
                rows: Vec::new(),
                execution_time,
            };
        };

        let mut columns: Vec<ColumnInfo> = first
            .columns()
            .iter()
            .map(|col| ColumnInfo {
                name: col.name().to_string(),
                type_name: col.type_().name().to_string(),
                max_width: unicode_width::UnicodeWidthStr::width(col.name()),
            })
            .collect();

        let rows: Vec<Vec<CellValue>> = rows
            .iter()
            .map(|row| {
                row.columns()
                    .iter()
                    .enumerate()
                    .map(|(i, col)| decode_cell(row, i, col.type_()))
                    .collect()
            })
            .collect();

        for row in &rows {
            for (column, cell) in columns.iter_mut().zip(row) {
                column.max_width = column.max_width.max(cell.display_width());
            }
        }

        Self {
            columns,
            rows,
            execution_time,
        }
    }
}

/// Accepts any type and ignores the bytes; only tells NULL from non-NULL.
struct Opaque;

impl<'a> FromSql<'a> for Opaque {
    fn from_sql(_: &Type, _: &'a [u8]) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        Ok(Opaque)
    }

    fn accepts(_: &Type) -> bool {
        true
    }
}

fn has_text_form(pg_type: &Type) -> bool {
    <String as FromSql>::accepts(pg_type)
}

fn decode_cell(row: &Row, idx: usize, pg_type: &Type) -> CellValue {
    fn get<'a, T: FromSql<'a>>(row: &'a Row, idx: usize) -> Option<T> {
        row.try_get::<_, Option<T>>(idx).ok().flatten()
    }

    let value = match *pg_type {
        Type::BOOL => get(row, idx).map(CellValue::Bool),
        Type::INT2 => get::<i16>(row, idx).map(|v| CellValue::Int(v.into())),
        Type::INT4 => get::<i32>(row, idx).map(|v| CellValue::Int(v.into())),
        Type::INT8 => get(row, idx).map(CellValue::Int),
        Type::FLOAT4 => get::<f32>(row, idx).map(|v| CellValue::Float(v.into())),
        Type::FLOAT8 => get(row, idx).map(CellValue::Float),
        // ROUND(x::numeric, n) and EXTRACT(...) both come back as NUMERIC.
        Type::NUMERIC => get(row, idx).map(CellValue::Numeric),
        Type::BYTEA => get(row, idx).map(CellValue::Bytes),
        Type::UUID => get(row, idx).map(CellValue::Uuid),
        Type::DATE => get(row, idx).map(CellValue::Date),
        Type::TIME => get(row, idx).map(CellValue::Time),
        Type::TIMESTAMP => get(row, idx).map(CellValue::DateTime),
        Type::TIMESTAMPTZ => get(row, idx).map(CellValue::TimestampTz),
        Type::JSON | Type::JSONB => get(row, idx).map(CellValue::Json),
        // TEXT, VARCHAR, NAME, BPCHAR and anything else with a text form
        _ if has_text_form(pg_type) => get(row, idx).map(CellValue::Text),
        _ => get::<Opaque>(row, idx).map(|_| CellValue::Unsupported(pg_type.name().to_string())),
    };
    value.unwrap_or(CellValue::Null)
}
