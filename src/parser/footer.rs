// Footer rule classification

use super::ast::FooterRule;
use super::expr::parse_expression;
use super::lexer::{column_key, ws};
use super::pattern::is_label;
use crate::error::TableError;
use crate::Result;
use nom::combinator::peek;

/// Classify a `footer` rule: `sum`, `avg`, a bare label, or an expression
/// over quoted column keys.
pub fn parse_footer(column: &str, rule: &str) -> Result<FooterRule> {
    let trimmed = rule.trim();
    match trimmed {
        "sum" => return Ok(FooterRule::Sum),
        "avg" => return Ok(FooterRule::Avg),
        _ => {}
    }

    if is_label(trimmed) {
        return Ok(FooterRule::Label(trimmed.to_string()));
    }

    if peek(ws(column_key))(trimmed).is_err() {
        return Err(TableError::invalid(
            Some(column),
            rule,
            "footer must be sum, avg, a label or an expression starting with a quoted column key",
        ));
    }
    parse_expression(trimmed).map(FooterRule::Expression)
}
