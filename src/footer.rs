// Two-pass footer resolution
//
// Pass 1 resolves `sum`, `avg` and labels. Pass 2 evaluates expression
// footers, which may refer to any footer resolved in pass 1 and to
// expression footers declared before them.

use crate::column::ColumnSpec;
use crate::data::{Cell, Dataset};
use crate::error::TableError;
use crate::eval::{evaluate, Scope, Value};
use crate::parser::ast::{Expr, FooterRule};
use crate::parser::parse_footer;
use crate::Result;
use log::debug;

/// Compute the footer row. Returns `None` when no column declares a footer.
pub fn resolve_footer(data: &Dataset, specs: &[ColumnSpec]) -> Result<Option<Vec<Option<Value>>>> {
    if specs.iter().all(|s| s.footer.is_none()) {
        return Ok(None);
    }

    let keys = data.columns();
    let mut rules: Vec<Option<(FooterRule, &str)>> = Vec::with_capacity(specs.len());
    for (key, spec) in keys.iter().zip(specs) {
        let rule = match &spec.footer {
            Some(text) => Some((parse_footer(key, text)?, text.as_str())),
            None => None,
        };
        rules.push(rule);
    }

    let mut values: Vec<Option<Value>> = vec![None; keys.len()];

    // Pass 1: aggregates and labels
    for (col, rule) in rules.iter().enumerate() {
        let value = match rule {
            Some((FooterRule::Sum, _)) => Value::Number(column_sum(data, col)?),
            Some((FooterRule::Avg, _)) if data.is_empty() => Value::Number(0.0),
            Some((FooterRule::Avg, _)) => {
                Value::Number(column_sum(data, col)? / data.row_count() as f64)
            }
            Some((FooterRule::Label(label), _)) => Value::Text(label.clone()),
            Some((FooterRule::Expression(_), _)) | None => continue,
        };
        debug!("footer for column '{}' = {}", keys[col], value);
        values[col] = Some(value);
    }

    // Pass 2: expressions over resolved footers
    for (col, rule) in rules.iter().enumerate() {
        if values[col].is_some() {
            continue;
        }
        if let Some((FooterRule::Expression(expr), source)) = rule {
            let value = evaluate_footer(expr, source, keys, &values)?;
            debug!("footer for column '{}' = {}", keys[col], value);
            values[col] = Some(value);
        }
    }

    Ok(Some(values))
}

fn evaluate_footer(
    expr: &Expr,
    source: &str,
    keys: &[String],
    values: &[Option<Value>],
) -> Result<Value> {
    let scope = FooterScope { keys, values };
    evaluate(expr, &scope, source)
}

/// Arithmetic sum of a column. Blank cells count as zero.
fn column_sum(data: &Dataset, col: usize) -> Result<f64> {
    let key = data.columns()[col].as_str();
    data.column_values(col).try_fold(0.0, |acc, cell| -> Result<f64> {
        let n = match cell {
            Cell::Text(s) if s.trim().is_empty() => 0.0,
            _ => cell.as_number().ok_or_else(|| {
                TableError::invalid(Some(key), cell.to_string(), "footer sum needs numeric values")
            })?,
        };
        Ok(acc + n)
    })
}

/// Quoted keys resolve to footer values; a quoted integer that is not a
/// column key is an integer literal.
struct FooterScope<'a> {
    keys: &'a [String],
    values: &'a [Option<Value>],
}

impl Scope for FooterScope<'_> {
    fn variable(&self, _name: &str) -> Option<Value> {
        None
    }

    fn column(&self, key: &str) -> std::result::Result<Value, String> {
        match self.keys.iter().position(|k| k == key) {
            Some(idx) => self.values[idx]
                .clone()
                .ok_or_else(|| format!("column '{}' has no footer value to refer to", key)),
            None if !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit()) => key
                .parse::<f64>()
                .map(Value::Number)
                .map_err(|e| e.to_string()),
            None => Err(format!("unknown column '{}'", key)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data() -> Dataset {
        Dataset::from_json(&json!([
            {"name": "AAA", "revenue": "500", "cost": 200},
            {"name": "BBB", "revenue": "1000", "cost": 300}
        ]))
        .unwrap()
    }

    fn footers(specs: Vec<ColumnSpec>) -> Vec<Option<String>> {
        resolve_footer(&data(), &specs)
            .unwrap()
            .unwrap()
            .into_iter()
            .map(|v| v.map(|v| v.to_string()))
            .collect()
    }

    #[test]
    fn test_no_footer() {
        let specs = vec![ColumnSpec::new(), ColumnSpec::new().header("x"), ColumnSpec::new()];
        assert!(resolve_footer(&data(), &specs).unwrap().is_none());
    }

    #[test]
    fn test_sum_avg_and_label() {
        let out = footers(vec![
            ColumnSpec::new().footer("Total"),
            ColumnSpec::new().footer("sum"),
            ColumnSpec::new().footer("avg"),
        ]);
        assert_eq!(
            out,
            vec![Some("Total".into()), Some("1500".into()), Some("250".into())]
        );
    }

    #[test]
    fn test_expression_declared_before_its_inputs() {
        let out = footers(vec![
            ColumnSpec::new().footer("'revenue' - 'cost'"),
            ColumnSpec::new().footer("sum"),
            ColumnSpec::new().footer("sum"),
        ]);
        assert_eq!(out[0].as_deref(), Some("1000"));
    }

    #[test]
    fn test_expression_with_quoted_integer_literal() {
        let out = footers(vec![
            ColumnSpec::new(),
            ColumnSpec::new().footer("'cost' / '2'"),
            ColumnSpec::new().footer("sum"),
        ]);
        assert_eq!(out, vec![None, Some("250".into()), Some("500".into())]);
    }

    #[test]
    fn test_expression_chain_in_declaration_order() {
        let out = footers(vec![
            ColumnSpec::new().footer("'revenue' * 2"),
            ColumnSpec::new().footer("sum"),
            ColumnSpec::new().footer("'name' + 1"),
        ]);
        assert_eq!(out[0].as_deref(), Some("3000"));
        assert_eq!(out[2].as_deref(), Some("3001"));
    }

    #[test]
    fn test_reference_to_column_without_footer() {
        let specs = vec![
            ColumnSpec::new().footer("'cost' + 1"),
            ColumnSpec::new(),
            ColumnSpec::new(),
        ];
        let err = resolve_footer(&data(), &specs).unwrap_err();
        assert!(err.is_expression());
    }

    #[test]
    fn test_unknown_column_reference() {
        let specs = vec![
            ColumnSpec::new().footer("'price' + 1"),
            ColumnSpec::new(),
            ColumnSpec::new(),
        ];
        assert!(resolve_footer(&data(), &specs).unwrap_err().is_expression());
    }

    #[test]
    fn test_sum_of_text_column_fails() {
        let specs = vec![ColumnSpec::new().footer("sum"), ColumnSpec::new(), ColumnSpec::new()];
        let err = resolve_footer(&data(), &specs).unwrap_err();
        assert!(err.is_invalid_input());
        assert_eq!(err.column(), Some("name"));
    }
}
