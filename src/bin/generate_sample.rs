use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use clap::Parser;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

/// Write a deterministic supermarket-style sales CSV
#[derive(Parser, Debug)]
#[command(about)]
struct Args {
    /// Output file
    #[arg(short, long, default_value = "sample_sales.csv")]
    output: PathBuf,

    /// Number of transactions
    #[arg(short = 'n', long, default_value_t = 1000)]
    rows: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Leave out Date, Time and Payment so the dashboard synthesizes them
    #[arg(long)]
    minimal: bool,
}

#[derive(Serialize)]
struct FullRow<'a> {
    #[serde(rename = "Invoice ID")]
    invoice_id: String,
    #[serde(rename = "Branch")]
    branch: &'a str,
    #[serde(rename = "City")]
    city: &'a str,
    #[serde(rename = "Customer type")]
    customer_type: &'a str,
    #[serde(rename = "Gender")]
    gender: &'a str,
    #[serde(rename = "Product line")]
    product_line: &'a str,
    #[serde(rename = "Unit price")]
    unit_price: f64,
    #[serde(rename = "Quantity")]
    quantity: u32,
    #[serde(rename = "Tax 5%")]
    tax: f64,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Time")]
    time: String,
    #[serde(rename = "Payment")]
    payment: &'a str,
}

#[derive(Serialize)]
struct MinimalRow<'a> {
    #[serde(rename = "Invoice ID")]
    invoice_id: String,
    #[serde(rename = "City")]
    city: &'a str,
    #[serde(rename = "Customer type")]
    customer_type: &'a str,
    #[serde(rename = "Gender")]
    gender: &'a str,
    #[serde(rename = "Product line")]
    product_line: &'a str,
    #[serde(rename = "Unit price")]
    unit_price: f64,
    #[serde(rename = "Quantity")]
    quantity: u32,
    #[serde(rename = "Tax 5%")]
    tax: f64,
}

const BRANCHES: [(&str, &str); 3] = [("A", "Yangon"), ("B", "Mandalay"), ("C", "Naypyitaw")];
const CUSTOMER_TYPES: [&str; 2] = ["Member", "Normal"];
const GENDERS: [&str; 2] = ["Male", "Female"];
const PRODUCT_LINES: [&str; 6] = [
    "Electronic accessories",
    "Fashion accessories",
    "Food and beverages",
    "Health and beauty",
    "Home and lifestyle",
    "Sports and travel",
];
const PAYMENTS: [&str; 3] = ["Cash", "Credit card", "Ewallet"];

fn pick<'a>(rng: &mut StdRng, options: &[&'a str]) -> &'a str {
    options.choose(rng).copied().unwrap_or_default()
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let mut rng = StdRng::seed_from_u64(args.seed);
    let first_day = NaiveDate::from_ymd_opt(2019, 1, 1).context("invalid start date")?;

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;

    for i in 0..args.rows {
        let invoice_id = format!(
            "{:03}-{:02}-{:04}",
            rng.gen_range(100..1000),
            rng.gen_range(10..100),
            i
        );
        let &(branch, city) = BRANCHES.choose(&mut rng).context("no branches")?;
        let customer_type = pick(&mut rng, &CUSTOMER_TYPES);
        let gender = pick(&mut rng, &GENDERS);
        let product_line = pick(&mut rng, &PRODUCT_LINES);
        let unit_price = round2(rng.gen_range(10.0..100.0));
        let quantity: u32 = rng.gen_range(1..=10);
        let tax = round2(unit_price * f64::from(quantity) * 0.05);

        if args.minimal {
            writer.serialize(MinimalRow {
                invoice_id,
                city,
                customer_type,
                gender,
                product_line,
                unit_price,
                quantity,
                tax,
            })?;
            continue;
        }

        let date = first_day + Duration::days(rng.gen_range(0..90));
        let time = format!("{:02}:{:02}:00", rng.gen_range(10..21), rng.gen_range(0..60));
        writer.serialize(FullRow {
            invoice_id,
            branch,
            city,
            customer_type,
            gender,
            product_line,
            unit_price,
            quantity,
            tax,
            date: date.format("%-m/%-d/%Y").to_string(),
            time,
            payment: pick(&mut rng, &PAYMENTS),
        })?;
    }
    writer.flush().context("flushing CSV")?;

    log::info!("Wrote {} transactions to {}", args.rows, args.output.display());
    println!("Wrote {} transactions to {}", args.rows, args.output.display());
    Ok(())
}
