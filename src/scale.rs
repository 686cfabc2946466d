use crate::column::{GraphSpec, Token};
use crate::data::Dataset;
use crate::error::TableError;
use crate::ir::GraphPlan;
use crate::parser::pattern::parse_signed_decimal;
use crate::Result;
use log::{debug, warn};

/// Build the graph plan for one column.
///
/// Declared bounds win; a missing bound is observed from the column values.
/// `width` is the already validated column width, if one was declared.
pub fn build_graph_plan(
    data: &Dataset,
    col: usize,
    graph: &GraphSpec,
    width: Option<u32>,
    default_width: u32,
) -> Result<GraphPlan> {
    let key = data.columns()[col].as_str();

    let declared_min = graph.min.as_ref().map(|t| parse_bound(key, "min", t)).transpose()?;
    let declared_max = graph.max.as_ref().map(|t| parse_bound(key, "max", t)).transpose()?;

    let (min, max) = match (declared_min, declared_max) {
        (Some(min), Some(max)) => (min, max),
        (min, max) => {
            let observed = observed_range(data, col)?;
            (min.unwrap_or(observed.0), max.unwrap_or(observed.1))
        }
    };

    let plan = GraphPlan::new(min, max, width.unwrap_or(default_width));
    if plan.scale == 0.0 {
        warn!(
            "graph on column '{}' has an empty range ({} to {}), bars are constant",
            key, min, max
        );
    }
    debug!(
        "graph plan for column '{}': min={} max={} width={} scale={}",
        key, plan.min, plan.max, plan.width, plan.scale
    );
    Ok(plan)
}

fn parse_bound(key: &str, which: &str, token: &Token) -> Result<f64> {
    parse_signed_decimal(token.as_str()).ok_or_else(|| {
        TableError::invalid(
            Some(key),
            token.as_str(),
            format!("graph {} must be a signed decimal number", which),
        )
    })
}

/// Smallest and largest value of a column
fn observed_range(data: &Dataset, col: usize) -> Result<(f64, f64)> {
    let key = data.columns()[col].as_str();
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for cell in data.column_values(col) {
        let val = cell.as_number().ok_or_else(|| {
            TableError::invalid(Some(key), cell.to_string(), "graph columns need numeric values")
        })?;
        if val < min {
            min = val;
        }
        if val > max {
            max = val;
        }
    }

    // Handle empty case
    if min == f64::INFINITY {
        return Ok((0.0, 0.0));
    }
    Ok((min, max))
}
