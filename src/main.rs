use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueHint};

use market_sales::data::filter::FilterCriteria;
use market_sales::report::{self, TableOptions};
use market_sales::state::Session;

const DEFAULT_SOURCE: &str = "archive/supermarket_sales new.csv";

/// Market sales dashboard: KPIs, breakdowns and raw rows for a sales CSV
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Sales CSV to load
    #[arg(default_value = DEFAULT_SOURCE, value_hint = ValueHint::FilePath)]
    file: PathBuf,

    /// JSON file with filter criteria; fields left out do not restrict.
    /// Without it every row is shown.
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    criteria: Option<PathBuf>,

    /// Raw-data columns to show, comma separated (default all).
    /// An empty value (`--columns ""`) selects no columns.
    #[arg(long, value_delimiter = ',', num_args = 1)]
    columns: Option<Vec<String>>,

    /// Maximum raw rows to print
    #[arg(long, default_value_t = 20)]
    rows: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut session = Session::new();
    session
        .load(&args.file)
        .with_context(|| format!("loading {}", args.file.display()))?;

    if let Some(path) = &args.criteria {
        session.criteria = read_criteria(path)?;
    }

    let Some(dashboard) = session.recompute() else {
        anyhow::bail!("no dataset loaded");
    };

    let options = TableOptions {
        columns: args.columns.as_ref().map(|cols| {
            cols.iter()
                .map(|c| c.trim())
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect()
        }),
        max_rows: Some(args.rows),
    };
    print!("{}", report::render(&dashboard, &options));
    Ok(())
}

fn read_criteria(path: &Path) -> Result<FilterCriteria> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading criteria {}", path.display()))?;
    let criteria: FilterCriteria =
        serde_json::from_str(&text).with_context(|| format!("parsing criteria {}", path.display()))?;
    log::info!("Using filter criteria from {}", path.display());
    Ok(criteria)
}
