use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tablegraph::{csv_reader, ColumnSpec, Dataset, RenderOptions, TableRenderer};

#[derive(Parser, Debug)]
#[command(name = "tablegraph")]
#[command(about = "Render CSV or JSON rows as an HTML table with footers, links and bar graphs", long_about = None)]
struct Args {
    /// Read the dataset from this file instead of stdin
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Dataset is a JSON array of arrays or objects instead of CSV
    #[arg(long)]
    json: bool,

    /// JSON array of column rules, one entry per column
    #[arg(short, long)]
    columns: Option<PathBuf>,

    /// Extra attributes for the <table> tag, e.g. 'class="report"'
    #[arg(short, long)]
    attrs: Option<String>,

    /// JSON file with render options
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();

    let data = read_dataset(&args)?;
    info!(
        "loaded {} rows x {} columns",
        data.row_count(),
        data.column_count()
    );

    let mut renderer = TableRenderer::new(data);

    if let Some(path) = &args.config {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let options = RenderOptions::from_json_str(&text)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        debug!("render options: {:?}", options);
        renderer = renderer.with_options(options);
    }

    if let Some(path) = &args.columns {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read column rules {}", path.display()))?;
        let columns = ColumnSpec::list_from_json_str(&text)
            .with_context(|| format!("Invalid column rules {}", path.display()))?;
        renderer
            .set_columns(columns)
            .context("Column rules do not match the dataset")?;
    }

    if let Some(attrs) = &args.attrs {
        renderer.set_attributes(attrs.as_str());
    }

    let html = renderer.render().context("Failed to render table")?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Some(html) = html {
        writeln!(handle, "{}", html).context("Failed to write HTML to stdout")?;
    }
    handle.flush().context("Failed to flush stdout")?;

    Ok(())
}

fn read_dataset(args: &Args) -> Result<Dataset> {
    let data = match (&args.data, args.json) {
        (Some(path), true) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Dataset::from_json_str(&text)?
        }
        (None, true) => {
            let mut text = String::new();
            io::Read::read_to_string(&mut io::stdin(), &mut text)
                .context("Failed to read JSON from stdin")?;
            Dataset::from_json_str(&text)?
        }
        (Some(path), false) => {
            let file = fs::File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            Dataset::from_csv(csv_reader::read_csv(file)?)?
        }
        (None, false) => {
            let csv = csv_reader::read_csv_from_stdin().context("Failed to read CSV from stdin")?;
            Dataset::from_csv(csv)?
        }
    };
    Ok(data)
}
