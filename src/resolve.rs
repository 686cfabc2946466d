use crate::column::ColumnSpec;
use crate::data::Dataset;
use crate::error::TableError;
use crate::footer::resolve_footer;
use crate::ir::{ColumnPlan, CompiledExpr, RenderPlan};
use crate::parser::pattern::{is_css_class, parse_width};
use crate::parser::{parse_expression, parse_link};
use crate::scale::build_graph_plan;
use crate::{RenderOptions, Result};
use log::debug;

/// Resolve column rules against the dataset into a render-scoped plan.
///
/// `specs`, when given, is already aligned with `data.columns()`.
pub fn build_render_plan(
    data: &Dataset,
    specs: Option<&[ColumnSpec]>,
    options: &RenderOptions,
) -> Result<RenderPlan> {
    let columns = match specs {
        Some(specs) => specs
            .iter()
            .enumerate()
            .map(|(col, spec)| resolve_column(data, col, spec, options))
            .collect::<Result<Vec<_>>>()?,
        None => data
            .columns()
            .iter()
            .map(|key| plain_column(key))
            .collect(),
    };

    let footer = match specs {
        Some(specs) => resolve_footer(data, specs)?,
        None => None,
    };

    Ok(RenderPlan { columns, footer })
}

/// Column without rules: raw key as header, values shown as-is
fn plain_column(key: &str) -> ColumnPlan {
    ColumnPlan {
        key: key.to_string(),
        header: key.to_string(),
        format: None,
        css_class: None,
        link: None,
        width: None,
        graph: None,
    }
}

fn resolve_column(
    data: &Dataset,
    col: usize,
    spec: &ColumnSpec,
    options: &RenderOptions,
) -> Result<ColumnPlan> {
    let key = data.columns()[col].as_str();

    let format = spec
        .format
        .as_ref()
        .map(|source| {
            parse_expression(source).map(|expr| CompiledExpr {
                source: source.clone(),
                expr,
            })
        })
        .transpose()?;

    let css_class = match &spec.css_class {
        Some(class) if is_css_class(class) => Some(class.clone()),
        Some(class) => {
            return Err(TableError::invalid(
                Some(key),
                class.as_str(),
                "css_class must consist of word characters only",
            ))
        }
        None => None,
    };

    let link = spec
        .link
        .as_ref()
        .map(|template| parse_link(key, template, data.column_count()))
        .transpose()?;

    let width = spec
        .width
        .as_ref()
        .map(|token| {
            parse_width(token.as_str()).ok_or_else(|| {
                TableError::invalid(
                    Some(key),
                    token.as_str(),
                    "width must be an integer of 1 to 3 digits",
                )
            })
        })
        .transpose()?;

    let graph = spec
        .graph
        .as_ref()
        .map(|graph| build_graph_plan(data, col, graph, width, options.graph_width))
        .transpose()?;

    let (css_class, width) = match &graph {
        Some(plan) => (
            css_class.or_else(|| Some(format!("{}{}", options.graph_class_prefix, plan.width))),
            Some(plan.width),
        ),
        None => (css_class, width),
    };

    let plan = ColumnPlan {
        key: key.to_string(),
        header: spec.header.clone().unwrap_or_else(|| key.to_string()),
        format,
        css_class,
        link,
        width,
        graph,
    };
    debug!(
        "column '{}': format={:?} class={:?} link={} width={:?} graph={}",
        plan.key,
        plan.format.as_ref().map(|f| f.source.as_str()),
        plan.css_class,
        plan.link.is_some(),
        plan.width,
        plan.graph.is_some()
    );
    Ok(plan)
}
