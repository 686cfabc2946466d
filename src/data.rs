use crate::error::TableError;
use crate::Result;
use serde_json::Value;
use std::fmt;

/// A single scalar value at a given row and column
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl Cell {
    /// Numeric view of the cell. Text is trimmed and parsed; blank text is not a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => f.write_str(&display_number(*n)),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<i64> for Cell {
    fn from(n: i64) -> Self {
        Cell::Number(n as f64)
    }
}

impl From<i32> for Cell {
    fn from(n: i32) -> Self {
        Cell::Number(n as f64)
    }
}

/// Render a number without a trailing `.0` for integral values and
/// without float noise in the last digits.
pub fn display_number(n: f64) -> String {
    if !n.is_finite() {
        return n.to_string();
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        return format!("{}", n as i64);
    }
    let s = format!("{:.10}", n);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Rows of cells keyed by the column keys of the first row.
///
/// Every row holds exactly one cell per column; the shape is checked on
/// construction and never changes afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self> {
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(TableError::invalid(
                    None,
                    format!("row {}", idx),
                    format!(
                        "row has {} cells but the table has {} columns",
                        row.len(),
                        columns.len()
                    ),
                ));
            }
        }
        Ok(Self { columns, rows })
    }

    /// Build from positional rows; column keys are the zero-based indices.
    pub fn from_rows<R, C>(rows: impl IntoIterator<Item = R>) -> Result<Self>
    where
        R: IntoIterator<Item = C>,
        C: Into<Cell>,
    {
        let rows: Vec<Vec<Cell>> = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        let width = rows.first().map(Vec::len).unwrap_or(0);
        let columns = (0..width).map(|i| i.to_string()).collect();
        Self::new(columns, rows)
    }

    /// Create a Dataset from a CsvData struct
    pub fn from_csv(csv: crate::csv_reader::CsvData) -> Result<Self> {
        let rows = csv
            .rows
            .into_iter()
            .map(|row| row.into_iter().map(Cell::Text).collect())
            .collect();
        Self::new(csv.headers, rows)
    }

    /// Create a Dataset from a JSON array of arrays or array of objects
    pub fn from_json(value: &Value) -> Result<Self> {
        let array = value.as_array().ok_or_else(|| {
            TableError::invalid(None, kind_of(value), "dataset must be an array of rows")
        })?;

        let Some(first) = array.first() else {
            return Ok(Self::default());
        };

        match first {
            Value::Array(cells) => {
                let columns: Vec<String> = (0..cells.len()).map(|i| i.to_string()).collect();
                let mut rows = Vec::with_capacity(array.len());
                for (idx, item) in array.iter().enumerate() {
                    let cells = item.as_array().ok_or_else(|| {
                        TableError::invalid(
                            None,
                            format!("row {}", idx),
                            "rows must all be arrays like the first row",
                        )
                    })?;
                    let row = cells
                        .iter()
                        .zip(&columns)
                        .map(|(v, key)| cell_from_json(key, v))
                        .collect::<Result<Vec<_>>>()?;
                    if cells.len() != columns.len() {
                        return Err(TableError::invalid(
                            None,
                            format!("row {}", idx),
                            format!(
                                "row has {} cells but the table has {} columns",
                                cells.len(),
                                columns.len()
                            ),
                        ));
                    }
                    rows.push(row);
                }
                Self::new(columns, rows)
            }
            Value::Object(obj) => {
                let columns: Vec<String> = obj.keys().cloned().collect();
                let mut rows = Vec::with_capacity(array.len());
                for (idx, item) in array.iter().enumerate() {
                    let obj = item.as_object().ok_or_else(|| {
                        TableError::invalid(
                            None,
                            format!("row {}", idx),
                            "rows must all be objects like the first row",
                        )
                    })?;
                    if obj.len() != columns.len() {
                        return Err(TableError::invalid(
                            None,
                            format!("row {}", idx),
                            format!(
                                "row has {} columns but the first row has {}",
                                obj.len(),
                                columns.len()
                            ),
                        ));
                    }
                    let mut row = Vec::with_capacity(columns.len());
                    for key in &columns {
                        let v = obj.get(key).ok_or_else(|| {
                            TableError::invalid(
                                Some(key.as_str()),
                                format!("row {}", idx),
                                "column missing from row",
                            )
                        })?;
                        row.push(cell_from_json(key, v)?);
                    }
                    rows.push(row);
                }
                Self::new(columns, rows)
            }
            other => Err(TableError::invalid(
                None,
                kind_of(other),
                "dataset rows must be arrays or objects",
            )),
        }
    }

    pub fn from_json_str(input: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_json(&value)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, key: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == key)
    }

    /// All values of one column, top to bottom
    pub fn column_values(&self, col: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().map(move |row| &row[col])
    }
}

fn cell_from_json(key: &str, value: &Value) -> Result<Cell> {
    match value {
        Value::String(s) => Ok(Cell::Text(s.clone())),
        Value::Number(n) => n
            .as_f64()
            .map(Cell::Number)
            .ok_or_else(|| TableError::invalid(Some(key), n.to_string(), "number out of range")),
        Value::Bool(b) => Ok(Cell::Text(b.to_string())),
        Value::Null => Ok(Cell::Text(String::new())),
        other => Err(TableError::invalid(
            Some(key),
            kind_of(other),
            "cells must be scalar values",
        )),
    }
}

fn kind_of(value: &Value) -> String {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_arrays_use_positional_keys() {
        let data = Dataset::from_json(&json!([["AAA", "500"], ["BBB", 1000]])).unwrap();
        assert_eq!(data.columns(), &["0", "1"]);
        assert_eq!(data.row_count(), 2);
        assert_eq!(data.rows()[1][1], Cell::Number(1000.0));
    }

    #[test]
    fn test_from_json_objects_keep_key_order() {
        let data = Dataset::from_json(&json!([
            {"name": "a", "qty": 1, "price": 2.5},
            {"name": "b", "qty": 3, "price": 4}
        ]))
        .unwrap();
        assert_eq!(data.columns(), &["name", "qty", "price"]);
        let qty: Vec<f64> = data.column_values(1).filter_map(Cell::as_number).collect();
        assert_eq!(qty, vec![1.0, 3.0]);
    }

    #[test]
    fn test_from_json_rejects_non_array() {
        let err = Dataset::from_json(&json!({"a": 1})).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_from_json_rejects_scalar_rows() {
        assert!(Dataset::from_json(&json!([1, 2, 3])).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_from_json_rejects_ragged_rows() {
        let err = Dataset::from_json(&json!([["a", 1], ["b"]])).unwrap_err();
        assert!(err.is_invalid_input());
        let err = Dataset::from_json(&json!([{"a": 1, "b": 2}, {"a": 1, "c": 2}])).unwrap_err();
        assert_eq!(err.column(), Some("b"));
    }

    #[test]
    fn test_from_json_rejects_nested_cells() {
        assert!(Dataset::from_json(&json!([[[1]]])).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_from_json_empty() {
        let data = Dataset::from_json(&json!([])).unwrap();
        assert!(data.is_empty());
        assert_eq!(data.column_count(), 0);
    }

    #[test]
    fn test_new_checks_row_width() {
        let rows = vec![vec![Cell::from("a")], vec![Cell::from("b"), Cell::from("c")]];
        assert!(Dataset::new(vec!["x".into()], rows).is_err());
    }

    #[test]
    fn test_display_number() {
        assert_eq!(display_number(1500.0), "1500");
        assert_eq!(display_number(750.5), "750.5");
        assert_eq!(display_number(1.1 + 2.2), "3.3");
        assert_eq!(display_number(-0.0), "0");
        assert_eq!(display_number(-25.0), "-25");
    }

    #[test]
    fn test_text_cell_as_number() {
        assert_eq!(Cell::from(" 42 ").as_number(), Some(42.0));
        assert_eq!(Cell::from("abc").as_number(), None);
        assert_eq!(Cell::from("").as_number(), None);
    }
}
