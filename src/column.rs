// Caller-supplied presentation rules, one per data column

use crate::data::display_number;
use crate::error::TableError;
use crate::Result;
use serde::Deserialize;
use serde_json::Value;

/// A textual token that may be written as a JSON string or number.
///
/// Widths and graph bounds are validated on their textual form at render
/// time, so `50` and `"50"` are equivalent while `"5O"` is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "TokenRepr")]
pub struct Token(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum TokenRepr {
    Text(String),
    Number(serde_json::Number),
}

impl From<TokenRepr> for Token {
    fn from(repr: TokenRepr) -> Self {
        match repr {
            TokenRepr::Text(s) => Token(s),
            TokenRepr::Number(n) => Token(n.to_string()),
        }
    }
}

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Token(s.to_string())
    }
}

impl From<String> for Token {
    fn from(s: String) -> Self {
        Token(s)
    }
}

impl From<u32> for Token {
    fn from(n: u32) -> Self {
        Token(n.to_string())
    }
}

impl From<i64> for Token {
    fn from(n: i64) -> Self {
        Token(n.to_string())
    }
}

impl From<f64> for Token {
    fn from(n: f64) -> Self {
        Token(display_number(n))
    }
}

/// Bar-graph rule. Its presence on a column enables the graph; missing
/// bounds are observed from the column values.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GraphSpec {
    pub min: Option<Token>,
    pub max: Option<Token>,
}

impl GraphSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min(mut self, min: impl Into<Token>) -> Self {
        self.min = Some(min.into());
        self
    }

    pub fn max(mut self, max: impl Into<Token>) -> Self {
        self.max = Some(max.into());
        self
    }
}

/// Presentation rules for one column
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnSpec {
    /// Header label; defaults to the column key
    pub header: Option<String>,
    /// `sum`, `avg`, a label, or an expression over quoted column keys
    pub footer: Option<String>,
    /// Expression over `cell` producing the display value
    pub format: Option<String>,
    /// Pixel width, 1-3 digits
    pub width: Option<Token>,
    pub graph: Option<GraphSpec>,
    /// URL template; query values of the form `column[N]` are substituted per row
    pub link: Option<String>,
    #[serde(alias = "class")]
    pub css_class: Option<String>,
}

impl ColumnSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn width(mut self, width: impl Into<Token>) -> Self {
        self.width = Some(width.into());
        self
    }

    pub fn graph(mut self, graph: GraphSpec) -> Self {
        self.graph = Some(graph);
        self
    }

    pub fn link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn css_class(mut self, class: impl Into<String>) -> Self {
        self.css_class = Some(class.into());
        self
    }

    /// Parse a JSON array of column rules. `null` entries mean "no rules".
    pub fn list_from_json(value: &Value) -> Result<Vec<ColumnSpec>> {
        let array = value.as_array().ok_or_else(|| {
            TableError::invalid(None, value.to_string(), "column rules must be an array")
        })?;

        array
            .iter()
            .enumerate()
            .map(|(idx, entry)| match entry {
                Value::Null => Ok(ColumnSpec::default()),
                Value::Object(_) => ColumnSpec::deserialize(entry).map_err(|e| {
                    TableError::invalid(None, format!("entry {}", idx), e.to_string())
                }),
                other => Err(TableError::invalid(
                    None,
                    format!("entry {}: {}", idx, other),
                    "column rule must be an object or null",
                )),
            })
            .collect()
    }

    pub fn list_from_json_str(input: &str) -> Result<Vec<ColumnSpec>> {
        let value: Value = serde_json::from_str(input)?;
        Self::list_from_json(&value)
    }
}
