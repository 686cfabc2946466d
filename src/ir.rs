use crate::eval::Value;
use crate::parser::ast::{Expr, LinkTemplate};

// =============================================================================
// Render-scoped plans
// =============================================================================
//
// Everything in this module is derived from the configuration at the start of
// a render call and dropped when it returns. The configuration itself is
// never written to.

/// Complete plan for one render call
#[derive(Debug, Clone)]
pub struct RenderPlan {
    /// One entry per data column, in column order
    pub columns: Vec<ColumnPlan>,
    /// Footer values per column, present when any column declares a footer
    pub footer: Option<Vec<Option<Value>>>,
}

/// How one column is rendered
#[derive(Debug, Clone)]
pub struct ColumnPlan {
    pub key: String,
    pub header: String,
    pub format: Option<CompiledExpr>,
    pub css_class: Option<String>,
    pub link: Option<LinkTemplate>,
    /// Header width in pixels: the declared width, or the graph width
    pub width: Option<u32>,
    pub graph: Option<GraphPlan>,
}

/// A parsed expression together with its source text for error messages
#[derive(Debug, Clone)]
pub struct CompiledExpr {
    pub source: String,
    pub expr: Expr,
}

/// Scaling of a column's values onto a bar sprite of `width` pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphPlan {
    pub min: f64,
    pub max: f64,
    pub width: u32,
    /// Pixels per unit; zero when the range is empty
    pub scale: f64,
}

impl GraphPlan {
    pub fn new(min: f64, max: f64, width: u32) -> Self {
        let scale = if max > min {
            width as f64 / (max - min)
        } else {
            0.0
        };
        Self {
            min,
            max,
            width,
            scale,
        }
    }

    /// Background offset for a cell value. Negative: the sprite is shifted
    /// left so that `(value - min) * scale` pixels of the bar stay visible.
    pub fn offset(&self, value: f64) -> i64 {
        ((value - self.min) * self.scale - self.width as f64).floor() as i64
    }
}
