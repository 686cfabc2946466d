//! Error types for tablegraph

use thiserror::Error;

/// Errors that can occur while configuring or rendering a table
#[derive(Error, Debug)]
pub enum TableError {
    /// Dataset, column rule or token that fails validation
    #[error("invalid input for {}: {reason} (got {value:?})", target(.column))]
    InvalidInput {
        column: Option<String>,
        value: String,
        reason: String,
    },

    /// Format or footer expression that fails to parse or evaluate
    #[error("expression error in {source_text:?}: {reason}")]
    Expression { source_text: String, reason: String },

    /// Malformed CSV input
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Malformed JSON input
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn target(column: &Option<String>) -> String {
    match column {
        Some(key) => format!("column '{}'", key),
        None => "table".to_string(),
    }
}

impl TableError {
    pub(crate) fn invalid(
        column: Option<&str>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        TableError::InvalidInput {
            column: column.map(str::to_string),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn expression(source_text: impl Into<String>, reason: impl Into<String>) -> Self {
        TableError::Expression {
            source_text: source_text.into(),
            reason: reason.into(),
        }
    }

    /// True for shape and token validation failures
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, TableError::InvalidInput { .. })
    }

    /// True for expression parse or evaluation failures
    pub fn is_expression(&self) -> bool {
        matches!(self, TableError::Expression { .. })
    }

    /// Column key the error refers to, if any
    pub fn column(&self) -> Option<&str> {
        match self {
            TableError::InvalidInput { column, .. } => column.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_names_column() {
        let err = TableError::invalid(Some("price"), "bad class!", "css_class must be a single word");
        assert!(err.is_invalid_input());
        assert_eq!(err.column(), Some("price"));
        let msg = err.to_string();
        assert!(msg.contains("column 'price'"));
        assert!(msg.contains("bad class!"));
    }

    #[test]
    fn test_invalid_input_without_column() {
        let err = TableError::invalid(None, "42", "dataset must be an array of rows");
        assert!(err.to_string().starts_with("invalid input for table"));
        assert_eq!(err.column(), None);
    }

    #[test]
    fn test_expression_error() {
        let err = TableError::expression("cell +", "unexpected end of input");
        assert!(err.is_expression());
        assert!(!err.is_invalid_input());
    }
}
