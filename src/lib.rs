// Library exports for tablegraph

pub mod column;
pub mod csv_reader;
pub mod data;
pub mod error;
pub mod eval;
pub mod footer;
pub mod ir;
pub mod markup;
pub mod parser;
pub mod resolve;
pub mod runtime;
pub mod scale;

pub use column::{ColumnSpec, GraphSpec, Token};
pub use data::{Cell, Dataset};
pub use error::TableError;
pub use runtime::{render_table, TableRenderer};

use serde::Deserialize;

/// Result type for tablegraph operations
pub type Result<T> = std::result::Result<T, TableError>;

/// Rendering knobs, loadable from a JSON config file
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderOptions {
    /// Bar width for graph columns that declare no width
    #[serde(default = "default_graph_width")]
    pub graph_width: u32,
    /// Class given to graph cells without an explicit class; the width is appended
    #[serde(default = "default_graph_class_prefix")]
    pub graph_class_prefix: String,
    /// Put each section and row on its own line
    #[serde(default = "default_newlines")]
    pub newlines: bool,
}

fn default_graph_width() -> u32 {
    50
}

fn default_graph_class_prefix() -> String {
    "cellgraph_".to_string()
}

fn default_newlines() -> bool {
    true
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            graph_width: default_graph_width(),
            graph_class_prefix: default_graph_class_prefix(),
            newlines: default_newlines(),
        }
    }
}

impl RenderOptions {
    pub fn from_json_str(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }
}
