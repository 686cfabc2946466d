// Table renderer: configuration plus markup emission

use crate::column::ColumnSpec;
use crate::data::{Cell, Dataset};
use crate::error::TableError;
use crate::eval::{evaluate, Scope, Value};
use crate::ir::{ColumnPlan, RenderPlan};
use crate::markup::{attributes, build_href, escape_html};
use crate::resolve::build_render_plan;
use crate::{RenderOptions, Result};
use log::{debug, trace};

/// Render a dataset in one call
pub fn render_table(
    data: Dataset,
    table_attributes: Option<&str>,
    columns: Option<Vec<ColumnSpec>>,
) -> Result<Option<String>> {
    let mut renderer = TableRenderer::new(data);
    if let Some(attrs) = table_attributes {
        renderer.set_attributes(attrs);
    }
    if let Some(columns) = columns {
        renderer.set_columns(columns)?;
    }
    renderer.render()
}

/// Renders a dataset into an HTML table.
///
/// Configuration is validated on every mutation: column rules always match
/// the dataset's column count. `render` borrows the renderer immutably, so
/// the same configuration renders the same markup every time.
#[derive(Debug, Clone)]
pub struct TableRenderer {
    data: Dataset,
    attributes: Option<String>,
    columns: Option<Vec<ColumnSpec>>,
    options: RenderOptions,
}

impl TableRenderer {
    pub fn new(data: Dataset) -> Self {
        Self {
            data,
            attributes: None,
            columns: None,
            options: RenderOptions::default(),
        }
    }

    /// Extra attributes for the opening `<table>` tag, emitted verbatim
    pub fn with_attributes(mut self, attrs: impl Into<String>) -> Self {
        self.set_attributes(attrs);
        self
    }

    pub fn with_columns(mut self, columns: Vec<ColumnSpec>) -> Result<Self> {
        self.set_columns(columns)?;
        Ok(self)
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn set_attributes(&mut self, attrs: impl Into<String>) {
        let attrs = attrs.into();
        self.attributes = if attrs.trim().is_empty() {
            None
        } else {
            Some(attrs)
        };
    }

    /// Replace the dataset. Fails, keeping the old dataset, when column rules
    /// are set and the new column count differs.
    pub fn set_data(&mut self, data: Dataset) -> Result<()> {
        if let Some(columns) = &self.columns {
            check_alignment(&data, columns.len())?;
        }
        self.data = data;
        Ok(())
    }

    /// Set column rules; entry `i` applies to the dataset's `i`-th column
    pub fn set_columns(&mut self, columns: Vec<ColumnSpec>) -> Result<()> {
        check_alignment(&self.data, columns.len())?;
        self.columns = Some(columns);
        Ok(())
    }

    pub fn clear_columns(&mut self) {
        self.columns = None;
    }

    pub fn data(&self) -> &Dataset {
        &self.data
    }

    /// Column keys paired with their rules
    pub fn columns(&self) -> impl Iterator<Item = (&str, Option<&ColumnSpec>)> + '_ {
        self.data
            .columns()
            .iter()
            .enumerate()
            .map(move |(i, key)| (key.as_str(), self.columns.as_ref().map(|c| &c[i])))
    }

    /// Render the table. Returns `None` when the dataset has no rows.
    pub fn render(&self) -> Result<Option<String>> {
        if self.data.is_empty() {
            debug!("dataset has no rows, nothing to render");
            return Ok(None);
        }

        let plan = build_render_plan(&self.data, self.columns.as_deref(), &self.options)?;
        let nl = if self.options.newlines { "\n" } else { "" };
        let keys = self.data.columns();

        let mut out = String::from("<table");
        if let Some(attrs) = &self.attributes {
            out.push(' ');
            out.push_str(attrs);
        }
        out.push('>');
        out.push_str(nl);

        // Header
        out.push_str("<thead>");
        out.push_str(nl);
        out.push_str("<tr>");
        for col in &plan.columns {
            out.push_str(&header_cell(col));
        }
        out.push_str("</tr>");
        out.push_str(nl);
        out.push_str("</thead>");
        out.push_str(nl);

        // Body
        out.push_str("<tbody>");
        out.push_str(nl);
        for (idx, row) in self.data.rows().iter().enumerate() {
            trace!("rendering row {}", idx);
            out.push_str("<tr>");
            for (c, col) in plan.columns.iter().enumerate() {
                out.push_str(&body_cell(col, &row[c], row, keys)?);
            }
            out.push_str("</tr>");
            out.push_str(nl);
        }
        out.push_str("</tbody>");
        out.push_str(nl);

        // Footer
        if let Some(footer) = &plan.footer {
            out.push_str("<tfoot>");
            out.push_str(nl);
            out.push_str(&footer_row(&plan, footer, keys)?);
            out.push_str(nl);
            out.push_str("</tfoot>");
            out.push_str(nl);
        }

        out.push_str("</table>");
        debug!(
            "rendered {} rows x {} columns",
            self.data.row_count(),
            self.data.column_count()
        );
        Ok(Some(out))
    }
}

fn check_alignment(data: &Dataset, rules: usize) -> Result<()> {
    if rules != data.column_count() {
        return Err(TableError::invalid(
            None,
            format!("{} column rules", rules),
            format!(
                "column rules must match the dataset's {} columns",
                data.column_count()
            ),
        ));
    }
    Ok(())
}

fn header_cell(col: &ColumnPlan) -> String {
    let style = col.width.map(|w| format!("width:{}px", w));
    format!(
        "<th{}>{}</th>",
        attributes(&[("style", style)]),
        escape_html(&col.header)
    )
}

fn body_cell(col: &ColumnPlan, cell: &Cell, row: &[Cell], keys: &[String]) -> Result<String> {
    let value = match &col.format {
        Some(format) => {
            let scope = CellScope {
                cell: Value::from(cell),
                keys,
                row: Siblings::Cells(row),
            };
            evaluate(&format.expr, &scope, &format.source)?.to_string()
        }
        None => cell.to_string(),
    };

    let mut content = escape_html(&value);
    if let Some(link) = &col.link {
        content = format!("<a href=\"{}\">{}</a>", build_href(link, row), content);
    }

    let style = match &col.graph {
        Some(graph) => {
            let n = cell.as_number().ok_or_else(|| {
                TableError::invalid(Some(col.key.as_str()), cell.to_string(), "graph columns need numeric values")
            })?;
            Some(format!("background-position:{}px", graph.offset(n)))
        }
        None => None,
    };

    Ok(format!(
        "<td{}>{}</td>",
        attributes(&[("class", col.css_class.clone()), ("style", style)]),
        content
    ))
}

fn footer_row(plan: &RenderPlan, footer: &[Option<Value>], keys: &[String]) -> Result<String> {
    let mut out = String::from("<tr>");
    for (col, value) in plan.columns.iter().zip(footer) {
        let text = match (value, &col.format) {
            (Some(value), Some(format)) => {
                let scope = CellScope {
                    cell: value.clone(),
                    keys,
                    row: Siblings::Footer(footer),
                };
                evaluate(&format.expr, &scope, &format.source)?.to_string()
            }
            (Some(value), None) => value.to_string(),
            (None, _) => String::new(),
        };
        out.push_str("<th>");
        out.push_str(&escape_html(&text));
        out.push_str("</th>");
    }
    out.push_str("</tr>");
    Ok(out)
}

enum Siblings<'a> {
    Cells(&'a [Cell]),
    Footer(&'a [Option<Value>]),
}

/// Scope for `format` expressions: `cell` is the value being formatted,
/// quoted keys name other columns of the same row. A quoted text that is
/// not a column key is a plain string.
struct CellScope<'a> {
    cell: Value,
    keys: &'a [String],
    row: Siblings<'a>,
}

impl Scope for CellScope<'_> {
    fn variable(&self, name: &str) -> Option<Value> {
        (name == "cell").then(|| self.cell.clone())
    }

    fn column(&self, key: &str) -> std::result::Result<Value, String> {
        let Some(idx) = self.keys.iter().position(|k| k == key) else {
            return Ok(Value::Text(key.to_string()));
        };
        match &self.row {
            Siblings::Cells(cells) => Ok(Value::from(&cells[idx])),
            Siblings::Footer(values) => values[idx]
                .clone()
                .ok_or_else(|| format!("column '{}' has no footer value", key)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::GraphSpec;

    fn data() -> Dataset {
        Dataset::from_rows(vec![vec!["AAA", "500"], vec!["BBB", "1000"]]).unwrap()
    }

    fn compact() -> RenderOptions {
        RenderOptions {
            newlines: false,
            ..RenderOptions::default()
        }
    }

    #[test]
    fn test_render_plain() {
        let html = TableRenderer::new(data())
            .with_options(compact())
            .render()
            .unwrap()
            .unwrap();
        assert_eq!(
            html,
            "<table><thead><tr><th>0</th><th>1</th></tr></thead>\
             <tbody><tr><td>AAA</td><td>500</td></tr><tr><td>BBB</td><td>1000</td></tr></tbody>\
             </table>"
        );
    }

    #[test]
    fn test_render_empty_dataset() {
        let renderer = TableRenderer::new(Dataset::default());
        assert!(renderer.render().unwrap().is_none());
    }

    #[test]
    fn test_render_attributes_verbatim() {
        let html = TableRenderer::new(data())
            .with_attributes(r#"class="report" border="1""#)
            .render()
            .unwrap()
            .unwrap();
        assert!(html.starts_with("<table class=\"report\" border=\"1\">\n<thead>"));
    }

    #[test]
    fn test_attributes_keep_their_spacing() {
        let html = TableRenderer::new(data())
            .with_options(compact())
            .with_attributes("  id=\"t\"   class=\"x\" ")
            .render()
            .unwrap()
            .unwrap();
        assert!(html.starts_with("<table   id=\"t\"   class=\"x\" ><thead>"));

        let blank = TableRenderer::new(data())
            .with_options(compact())
            .with_attributes("   ")
            .render()
            .unwrap()
            .unwrap();
        assert!(blank.starts_with("<table><thead>"));
    }

    #[test]
    fn test_set_columns_length_mismatch() {
        let mut renderer = TableRenderer::new(data());
        let err = renderer.set_columns(vec![ColumnSpec::new()]).unwrap_err();
        assert!(err.is_invalid_input());
        assert!(renderer.columns().all(|(_, spec)| spec.is_none()));
    }

    #[test]
    fn test_set_data_revalidates() {
        let mut renderer = TableRenderer::new(data())
            .with_columns(vec![ColumnSpec::new(), ColumnSpec::new().footer("sum")])
            .unwrap();
        let wider = Dataset::from_rows(vec![vec!["a", "b", "c"]]).unwrap();
        assert!(renderer.set_data(wider).unwrap_err().is_invalid_input());
        assert_eq!(renderer.data().column_count(), 2);

        let same_shape = Dataset::from_rows(vec![vec!["x", "7"]]).unwrap();
        renderer.set_data(same_shape).unwrap();
        let html = renderer.render().unwrap().unwrap();
        assert!(html.contains("<tfoot>\n<tr><th></th><th>7</th></tr>"));
    }

    #[test]
    fn test_render_is_repeatable() {
        let renderer = TableRenderer::new(data())
            .with_columns(vec![
                ColumnSpec::new(),
                ColumnSpec::new().graph(GraphSpec::new()).footer("avg"),
            ])
            .unwrap();
        let first = renderer.render().unwrap();
        let second = renderer.render().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_format_can_read_sibling_columns() {
        let renderer = TableRenderer::new(data())
            .with_options(compact())
            .with_columns(vec![
                ColumnSpec::new().format(r#"cell ~ " (" ~ '1' ~ ")""#),
                ColumnSpec::new(),
            ])
            .unwrap();
        let html = renderer.render().unwrap().unwrap();
        assert!(html.contains("<td>AAA (500)</td>"));
        assert!(html.contains("<td>BBB (1000)</td>"));
    }

    #[test]
    fn test_values_are_escaped() {
        let data = Dataset::from_rows(vec![vec!["<b>x</b> & y"]]).unwrap();
        let html = TableRenderer::new(data).render().unwrap().unwrap();
        assert!(html.contains("<td>&lt;b&gt;x&lt;/b&gt; &amp; y</td>"));
    }

    #[test]
    fn test_graph_cell_must_be_numeric() {
        let data = Dataset::from_rows(vec![vec!["1"], vec!["oops"]]).unwrap();
        let renderer = TableRenderer::new(data)
            .with_columns(vec![ColumnSpec::new().graph(GraphSpec::new().min(0i64).max(10i64))])
            .unwrap();
        let err = renderer.render().unwrap_err();
        assert!(err.is_invalid_input());
        assert_eq!(err.column(), Some("0"));
    }
}
