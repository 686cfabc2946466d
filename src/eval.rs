// Sandboxed evaluator for format and footer expressions
//
// Only the operators of the grammar and the functions listed in `call` are
// available; there is no way to reach the host environment.

use crate::data::{display_number, Cell};
use crate::error::TableError;
use crate::parser::ast::{BinaryOp, Expr, UnaryOp};
use crate::parser::expr::MAX_SOURCE_LEN;
use crate::Result;
use std::cmp::Ordering;
use std::fmt;

/// Most decimals `round` and `number_format` accept
const MAX_DECIMALS: usize = 15;

/// Widest result `pad_left` and `pad_right` will produce
const MAX_PAD_WIDTH: usize = 1024;

/// Deepest tree the evaluator walks. Parsed expressions never exceed it.
const MAX_DEPTH: usize = MAX_SOURCE_LEN;

/// Runtime value of an expression
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Bool(bool),
}

impl Value {
    /// Numeric view; numeric text is coerced, booleans are not
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            Value::Bool(_) => None,
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0,
            Value::Text(s) => !s.is_empty() && s != "0",
            Value::Bool(b) => *b,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => f.write_str(&display_number(*n)),
            Value::Text(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&Cell> for Value {
    fn from(cell: &Cell) -> Self {
        match cell {
            Cell::Text(s) => Value::Text(s.clone()),
            Cell::Number(n) => Value::Number(*n),
        }
    }
}

/// Name resolution for an evaluation
pub trait Scope {
    /// Bound variable such as `cell`
    fn variable(&self, name: &str) -> Option<Value>;

    /// Single-quoted column key; the error text explains why it cannot resolve
    fn column(&self, key: &str) -> std::result::Result<Value, String>;
}

/// Evaluate `expr`. `source` is the expression text, used in error messages.
pub fn evaluate(expr: &Expr, scope: &dyn Scope, source: &str) -> Result<Value> {
    Evaluator { scope, source }.eval(expr, 0)
}

struct Evaluator<'a> {
    scope: &'a dyn Scope,
    source: &'a str,
}

impl Evaluator<'_> {
    fn error(&self, reason: impl Into<String>) -> TableError {
        TableError::expression(self.source, reason)
    }

    fn eval(&self, expr: &Expr, depth: usize) -> Result<Value> {
        if depth > MAX_DEPTH {
            return Err(self.error(format!(
                "expression nested deeper than {} levels",
                MAX_DEPTH
            )));
        }
        let depth = depth + 1;
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Str(s) => Ok(Value::Text(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Var(name) => self
                .scope
                .variable(name)
                .ok_or_else(|| self.error(format!("unknown variable '{}'", name))),
            Expr::Column(key) => self.scope.column(key).map_err(|reason| self.error(reason)),
            Expr::Unary(op, operand) => {
                let v = self.eval(operand, depth)?;
                match op {
                    UnaryOp::Neg => Ok(Value::Number(-self.number(&v, "-")?)),
                    UnaryOp::Not => Ok(Value::Bool(!v.truthy())),
                }
            }
            Expr::Binary(BinaryOp::And, lhs, rhs) => {
                let ok = self.eval(lhs, depth)?.truthy() && self.eval(rhs, depth)?.truthy();
                Ok(Value::Bool(ok))
            }
            Expr::Binary(BinaryOp::Or, lhs, rhs) => {
                let ok = self.eval(lhs, depth)?.truthy() || self.eval(rhs, depth)?.truthy();
                Ok(Value::Bool(ok))
            }
            Expr::Binary(op, lhs, rhs) => {
                let lhs = self.eval(lhs, depth)?;
                let rhs = self.eval(rhs, depth)?;
                self.binary(*op, &lhs, &rhs)
            }
            Expr::Conditional(cond, then, otherwise) => {
                if self.eval(cond, depth)?.truthy() {
                    self.eval(then, depth)
                } else {
                    self.eval(otherwise, depth)
                }
            }
            Expr::Call(name, args) => {
                let args = args
                    .iter()
                    .map(|a| self.eval(a, depth))
                    .collect::<Result<Vec<_>>>()?;
                self.call(name, &args)
            }
        }
    }

    fn number(&self, v: &Value, op: &str) -> Result<f64> {
        v.as_number()
            .ok_or_else(|| self.error(format!("'{}' needs a number, got {:?}", op, v.to_string())))
    }

    fn binary(&self, op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value> {
        let arith = |sym: &str| -> Result<(f64, f64)> {
            Ok((self.number(lhs, sym)?, self.number(rhs, sym)?))
        };
        match op {
            BinaryOp::Add => arith("+").map(|(a, b)| Value::Number(a + b)),
            BinaryOp::Sub => arith("-").map(|(a, b)| Value::Number(a - b)),
            BinaryOp::Mul => arith("*").map(|(a, b)| Value::Number(a * b)),
            BinaryOp::Div => {
                let (a, b) = arith("/")?;
                if b == 0.0 {
                    return Err(self.error("division by zero"));
                }
                Ok(Value::Number(a / b))
            }
            BinaryOp::Rem => {
                let (a, b) = arith("%")?;
                if b == 0.0 {
                    return Err(self.error("modulo by zero"));
                }
                Ok(Value::Number(a % b))
            }
            BinaryOp::Concat => Ok(Value::Text(format!("{}{}", lhs, rhs))),
            BinaryOp::Eq => Ok(Value::Bool(compare(lhs, rhs) == Ordering::Equal)),
            BinaryOp::Ne => Ok(Value::Bool(compare(lhs, rhs) != Ordering::Equal)),
            BinaryOp::Lt => Ok(Value::Bool(compare(lhs, rhs) == Ordering::Less)),
            BinaryOp::Le => Ok(Value::Bool(compare(lhs, rhs) != Ordering::Greater)),
            BinaryOp::Gt => Ok(Value::Bool(compare(lhs, rhs) == Ordering::Greater)),
            BinaryOp::Ge => Ok(Value::Bool(compare(lhs, rhs) != Ordering::Less)),
            BinaryOp::And => Ok(Value::Bool(lhs.truthy() && rhs.truthy())),
            BinaryOp::Or => Ok(Value::Bool(lhs.truthy() || rhs.truthy())),
        }
    }

    fn arity(&self, name: &str, args: &[Value], min: usize, max: usize) -> Result<()> {
        if args.len() < min || args.len() > max {
            let expected = if min == max {
                min.to_string()
            } else if max == usize::MAX {
                format!("at least {}", min)
            } else {
                format!("{} to {}", min, max)
            };
            return Err(self.error(format!(
                "{}() takes {} arguments, got {}",
                name,
                expected,
                args.len()
            )));
        }
        Ok(())
    }

    fn count_arg(&self, name: &str, v: &Value, limit: usize) -> Result<usize> {
        let n = self.number(v, name)?;
        if !n.is_finite() || n < 0.0 || n.fract() != 0.0 {
            return Err(self.error(format!("{}() needs a non-negative integer, got {}", name, v)));
        }
        if n > limit as f64 {
            return Err(self.error(format!(
                "{}() argument {} is above the limit of {}",
                name, v, limit
            )));
        }
        Ok(n as usize)
    }

    fn text_arg(args: &[Value], idx: usize, default: &str) -> String {
        args.get(idx)
            .map(|v| v.to_string())
            .unwrap_or_else(|| default.to_string())
    }

    fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        match name {
            "number_format" => {
                self.arity(name, args, 1, 4)?;
                let n = self.number(&args[0], name)?;
                let decimals = match args.get(1) {
                    Some(v) => self.count_arg(name, v, MAX_DECIMALS)?,
                    None => 0,
                };
                let dec_point = Self::text_arg(args, 2, ".");
                let thousands = Self::text_arg(args, 3, ",");
                Ok(Value::Text(number_format(n, decimals, &dec_point, &thousands)))
            }
            "round" => {
                self.arity(name, args, 1, 2)?;
                let n = self.number(&args[0], name)?;
                let digits = match args.get(1) {
                    Some(v) => self.count_arg(name, v, MAX_DECIMALS)?,
                    None => 0,
                };
                Ok(Value::Number(round_half_away(n, digits)))
            }
            "floor" | "ceil" | "abs" => {
                self.arity(name, args, 1, 1)?;
                let n = self.number(&args[0], name)?;
                let out = match name {
                    "floor" => n.floor(),
                    "ceil" => n.ceil(),
                    _ => n.abs(),
                };
                Ok(Value::Number(out))
            }
            "min" | "max" => {
                self.arity(name, args, 1, usize::MAX)?;
                let mut nums = args.iter().map(|v| self.number(v, name));
                let first = nums.next().unwrap_or(Ok(0.0))?;
                let out = nums.try_fold(first, |acc, n| {
                    let n = n?;
                    Ok::<f64, TableError>(if name == "min" { acc.min(n) } else { acc.max(n) })
                })?;
                Ok(Value::Number(out))
            }
            "upper" | "lower" | "trim" => {
                self.arity(name, args, 1, 1)?;
                let s = args[0].to_string();
                let out = match name {
                    "upper" => s.to_uppercase(),
                    "lower" => s.to_lowercase(),
                    _ => s.trim().to_string(),
                };
                Ok(Value::Text(out))
            }
            "len" => {
                self.arity(name, args, 1, 1)?;
                Ok(Value::Number(args[0].to_string().chars().count() as f64))
            }
            "substr" => {
                self.arity(name, args, 2, 3)?;
                let chars: Vec<char> = args[0].to_string().chars().collect();
                let start = self.number(&args[1], name)?.trunc() as i64;
                let start = if start < 0 {
                    (chars.len() as i64).saturating_add(start).max(0) as usize
                } else {
                    (start as usize).min(chars.len())
                };
                let end = match args.get(2) {
                    Some(v) => start
                        .saturating_add(self.count_arg(name, v, usize::MAX)?)
                        .min(chars.len()),
                    None => chars.len(),
                };
                Ok(Value::Text(chars[start..end].iter().collect()))
            }
            "pad_left" | "pad_right" => {
                self.arity(name, args, 2, 3)?;
                let s = args[0].to_string();
                let width = self.count_arg(name, &args[1], MAX_PAD_WIDTH)?;
                let fill = Self::text_arg(args, 2, " ").chars().next().unwrap_or(' ');
                let missing = width.saturating_sub(s.chars().count());
                let padding: String = std::iter::repeat(fill).take(missing).collect();
                let out = if name == "pad_left" {
                    padding + &s
                } else {
                    s + &padding
                };
                Ok(Value::Text(out))
            }
            "concat" => Ok(Value::Text(args.iter().map(|v| v.to_string()).collect())),
            _ => Err(self.error(format!("unknown function '{}'", name))),
        }
    }
}

/// Numbers compare numerically, anything else compares as text
fn compare(lhs: &Value, rhs: &Value) -> Ordering {
    match (lhs, rhs) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => match (lhs.as_number(), rhs.as_number()) {
            (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            _ => lhs.to_string().cmp(&rhs.to_string()),
        },
    }
}

fn round_half_away(n: f64, digits: usize) -> f64 {
    let factor = 10f64.powi(digits.min(15) as i32);
    (n * factor).round() / factor
}

/// Fixed-decimal formatting with custom decimal point and thousands separator
pub fn number_format(n: f64, decimals: usize, dec_point: &str, thousands_sep: &str) -> String {
    let rounded = round_half_away(n, decimals);
    let text = format!("{:.*}", decimals, rounded.abs());
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push_str(thousands_sep);
        }
        grouped.push(ch);
    }

    let mut out = String::new();
    let is_zero = text.chars().all(|c| c == '0' || c == '.');
    if rounded < 0.0 && !is_zero {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push_str(dec_point);
        out.push_str(frac);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expression;
    use std::collections::HashMap;

    struct TestScope {
        cell: Value,
        columns: HashMap<String, Value>,
    }

    impl Scope for TestScope {
        fn variable(&self, name: &str) -> Option<Value> {
            (name == "cell").then(|| self.cell.clone())
        }

        fn column(&self, key: &str) -> std::result::Result<Value, String> {
            self.columns
                .get(key)
                .cloned()
                .ok_or_else(|| format!("unknown column '{}'", key))
        }
    }

    fn eval_with(source: &str, cell: Value) -> Result<Value> {
        let mut columns = HashMap::new();
        columns.insert("a".to_string(), Value::Number(1500.0));
        columns.insert("b".to_string(), Value::Text("250".to_string()));
        let scope = TestScope { cell, columns };
        let expr = parse_expression(source)?;
        evaluate(&expr, &scope, source)
    }

    fn eval_str(source: &str, cell: &str) -> String {
        eval_with(source, Value::Text(cell.to_string())).unwrap().to_string()
    }

    #[test]
    fn test_arithmetic_coerces_numeric_text() {
        assert_eq!(eval_str("cell * 2 + 1", "500"), "1001");
        assert_eq!(eval_str("cell / 4", "10"), "2.5");
        assert_eq!(eval_str("cell % 7", "10"), "3");
        assert_eq!(eval_str("-cell", "3"), "-3");
    }

    #[test]
    fn test_column_references() {
        assert_eq!(eval_str("'a' + 'b'", ""), "1750");
        assert_eq!(eval_str("'a' / ('b' * 2)", ""), "3");
    }

    #[test]
    fn test_concat_and_conditional() {
        assert_eq!(eval_str(r#"cell ~ " EUR""#, "12"), "12 EUR");
        assert_eq!(eval_str(r#"cell > 100 ? "high" : "low""#, "500"), "high");
        assert_eq!(eval_str(r#"cell > 100 ? "high" : "low""#, "50"), "low");
        assert_eq!(eval_str(r#"cell == "x" || cell == "y""#, "y"), "true");
    }

    #[test]
    fn test_number_comparison_is_numeric() {
        assert_eq!(eval_str("cell < 100", "99.5"), "true");
        assert_eq!(eval_str("cell < 100", "1000"), "false");
    }

    #[test]
    fn test_functions() {
        assert_eq!(eval_str("number_format(cell, 2)", "1234567.891"), "1,234,567.89");
        assert_eq!(eval_str(r#"number_format(cell, 1, ",", ".")"#, "1234.56"), "1.234,6");
        assert_eq!(eval_str("number_format(cell)", "999.5"), "1,000");
        assert_eq!(eval_str("round(cell, 1)", "2.45"), "2.5");
        assert_eq!(eval_str("floor(cell)", "-2.5"), "-3");
        assert_eq!(eval_str("max(cell, 10, 3)", "7"), "10");
        assert_eq!(eval_str("upper(cell)", "abc"), "ABC");
        assert_eq!(eval_str("len(cell)", "héllo"), "5");
        assert_eq!(eval_str("substr(cell, 1, 3)", "abcdef"), "bcd");
        assert_eq!(eval_str("substr(cell, -2)", "abcdef"), "ef");
        assert_eq!(eval_str(r#"pad_left(cell, 5, "0")"#, "42"), "00042");
        assert_eq!(eval_str(r##"concat("#", cell, "!")"##, "1"), "#1!");
    }

    #[test]
    fn test_number_format_negative() {
        assert_eq!(number_format(-1234.5, 0, ".", ","), "-1,235");
        assert_eq!(number_format(-0.001, 2, ".", ","), "0.00");
        assert_eq!(number_format(100.0, 0, ".", " "), "100");
    }

    #[test]
    fn test_errors() {
        let text = Value::Text("abc".into());
        assert!(eval_with("cell + 1", text.clone()).unwrap_err().is_expression());
        assert!(eval_with("1 / 0", text.clone()).is_err());
        assert!(eval_with("'missing'", text.clone()).is_err());
        assert!(eval_with("other", text.clone()).is_err());
        assert!(eval_with("exec(cell)", text.clone()).is_err());
        assert!(eval_with("round()", text.clone()).is_err());
        assert!(eval_with("number_format(1, -1)", text).is_err());
    }

    #[test]
    fn test_substr_with_huge_arguments() {
        assert_eq!(eval_str("substr(cell, 1, 1000000000000000000)", "abc"), "bc");
        assert_eq!(eval_str("substr(cell, -100000000000000000000)", "abc"), "abc");
        assert_eq!(eval_str("substr(cell, 100000000000000000000)", "abc"), "");
        let err = eval_with("substr(cell, 1, 100000000000000000000)", Value::Text("abc".into()))
            .unwrap_err();
        assert!(err.is_expression());
    }

    #[test]
    fn test_size_arguments_are_capped() {
        let cell = Value::Text("7".into());
        for source in [
            "pad_left(cell, 1000000000000000)",
            "pad_right(cell, 1025)",
            "number_format(cell, 1000000000)",
            "round(cell, 16)",
            "number_format(cell, 1 / 0.0000000000000000000000000000001)",
        ] {
            let err = eval_with(source, cell.clone()).unwrap_err();
            assert!(err.is_expression(), "{} should be rejected", source);
        }
        assert_eq!(eval_str("len(pad_left(cell, 1024))", "7"), "1024");
        assert_eq!(eval_str("number_format(cell, 15)", "1"), "1.000000000000000");
    }

    #[test]
    fn test_deep_tree_is_rejected() {
        let mut expr = Expr::Var("cell".into());
        for _ in 0..(MAX_DEPTH + 10) {
            expr = Expr::Unary(UnaryOp::Neg, Box::new(expr));
        }
        let scope = TestScope {
            cell: Value::Number(1.0),
            columns: HashMap::new(),
        };
        let err = evaluate(&expr, &scope, "-cell").unwrap_err();
        assert!(err.is_expression());
    }

    #[test]
    fn test_long_operator_chain() {
        let source = format!("{}1", "1 + ".repeat(200));
        assert_eq!(eval_str(&source, ""), "201");
    }
}
