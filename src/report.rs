//! Plain-text rendering of a [`Dashboard`] for the terminal.

use std::fmt::Write;

use chrono::NaiveTime;

use crate::data::aggregate::{Aggregates, Kpis, QuantityByKey};
use crate::data::dashboard::Dashboard;
use crate::data::model::{
    SalesRecord, COL_BRANCH, COL_CITY, COL_CUSTOMER_TYPE, COL_DATE, COL_GENDER, COL_HOUR,
    COL_INVOICE_ID, COL_MONTH, COL_PAYMENT, COL_PRODUCT_LINE, COL_QUANTITY, COL_TAX, COL_TIME,
    COL_TOTAL_AMOUNT, COL_UNIT_PRICE,
};

pub const NO_DATA: &str = "no data";

/// What part of the raw-data table to print.
#[derive(Debug, Clone, Default)]
pub struct TableOptions {
    /// Columns to show, in order. `None` shows every column.
    pub columns: Option<Vec<String>>,
    /// Maximum number of rows, `None` for all.
    pub max_rows: Option<usize>,
}

/// Full report: warnings, KPIs, the aggregate breakdowns and the raw rows.
pub fn render(dashboard: &Dashboard<'_>, options: &TableOptions) -> String {
    let mut out = String::new();
    for w in &dashboard.warnings {
        let _ = writeln!(out, "warning: {w}");
    }
    if !dashboard.warnings.is_empty() {
        out.push('\n');
    }

    out.push_str(&render_kpis(&dashboard.kpis));
    out.push('\n');
    out.push_str(&render_aggregates(&dashboard.aggregates));
    out.push('\n');

    let _ = writeln!(
        out,
        "### Raw Data ({} of {} rows)",
        dashboard.len(),
        dashboard.table().len()
    );
    let all_columns = &dashboard.table().column_names;
    let columns = options.columns.as_ref().unwrap_or(all_columns);
    out.push_str(&render_rows(dashboard.rows(), columns, options.max_rows));
    out
}

// ---------------------------------------------------------------------------
// KPIs
// ---------------------------------------------------------------------------

pub fn render_kpis(kpis: &Kpis) -> String {
    let avg = match kpis.avg_items_per_transaction() {
        Ok(avg) => format!("{avg:.2}"),
        Err(_) => NO_DATA.to_string(),
    };
    let mut out = String::from("### Key Performance Indicators\n");
    let _ = writeln!(out, "Total Sales (items):          {}", kpis.total_items_sold);
    let _ = writeln!(out, "Total Transactions:           {}", kpis.total_transactions);
    let _ = writeln!(out, "Avg. Sales per Transaction:   {avg}");
    out
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

pub fn render_aggregates(agg: &Aggregates) -> String {
    let mut out = String::from("### Sales Insights\n");
    section(&mut out, "Total Sales by City", string_keys(&agg.by_city));
    section(&mut out, "Total Sales by Product Line", string_keys(&agg.by_product_line));
    section(
        &mut out,
        "Monthly Sales Trend",
        agg.monthly_named()
            .into_iter()
            .map(|(m, q)| (m.to_string(), q))
            .collect(),
    );
    section(
        &mut out,
        "Hourly Sales Trend",
        agg.by_hour.iter().map(|(h, q)| (h.to_string(), *q)).collect(),
    );
    section(&mut out, "Sales by Gender", string_keys(&agg.by_gender));
    section(&mut out, "Sales by Customer Type", string_keys(&agg.by_customer_type));
    out
}

fn string_keys(map: &QuantityByKey<String>) -> Vec<(String, i64)> {
    map.iter().map(|(k, q)| (k.clone(), *q)).collect()
}

fn section(out: &mut String, title: &str, entries: Vec<(String, i64)>) {
    let _ = writeln!(out, "{title}:");
    if entries.is_empty() {
        let _ = writeln!(out, "  ({NO_DATA})");
        return;
    }
    let width = entries.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);
    for (key, qty) in entries {
        let _ = writeln!(out, "  {key:<width$}  {qty:>6}");
    }
}

// ---------------------------------------------------------------------------
// Raw data table
// ---------------------------------------------------------------------------

/// Render rows as an aligned text table. An empty column selection prints
/// a hint instead of a table.
pub fn render_rows<'a, I>(rows: I, columns: &[String], max_rows: Option<usize>) -> String
where
    I: Iterator<Item = &'a SalesRecord>,
{
    if columns.is_empty() {
        return "Please select at least one column to display.\n".to_string();
    }

    let body: Vec<Vec<String>> = rows
        .take(max_rows.unwrap_or(usize::MAX))
        .map(|rec| columns.iter().map(|c| cell_value(rec, c)).collect())
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            body.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(c.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    push_line(&mut out, columns.iter().map(String::as_str), &widths);
    push_line(
        &mut out,
        widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().iter().map(String::as_str),
        &widths,
    );
    for row in &body {
        push_line(&mut out, row.iter().map(String::as_str), &widths);
    }
    out
}

fn push_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let line: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &w)| format!("{cell:<w$}"))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

/// Display text of one cell. Money columns get two decimals with thousands
/// separators and `Time` is shown as `HH:MM`; nulls are empty.
pub fn cell_value(rec: &SalesRecord, column: &str) -> String {
    match column {
        COL_INVOICE_ID => rec.invoice_id.clone(),
        COL_CITY | COL_BRANCH if !rec.extra.contains_key(column) => rec.city.clone(),
        COL_GENDER => rec.gender.clone(),
        COL_CUSTOMER_TYPE => rec.customer_type.clone(),
        COL_PRODUCT_LINE => rec.product_line.clone(),
        COL_PAYMENT => rec.payment.clone(),
        COL_QUANTITY => rec.quantity.to_string(),
        COL_UNIT_PRICE => format_amount(rec.unit_price),
        COL_TAX => format_amount(rec.tax),
        COL_TOTAL_AMOUNT => format_amount(rec.total_amount),
        COL_DATE => rec.date.map(|d| d.to_string()).unwrap_or_default(),
        COL_TIME => format_time(rec.time),
        COL_MONTH => rec.month().map(|m| m.to_string()).unwrap_or_default(),
        COL_HOUR => rec.hour().map(|h| h.to_string()).unwrap_or_default(),
        other => rec.extra.get(other).cloned().unwrap_or_default(),
    }
}

/// `1234.5` → `"1,234.50"`.
pub fn format_amount(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

pub fn format_time(time: Option<NaiveTime>) -> String {
    time.map(|t| t.format("%H:%M").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn record() -> SalesRecord {
        SalesRecord {
            invoice_id: "750-67-8428".to_string(),
            city: "Yangon".to_string(),
            gender: "Female".to_string(),
            customer_type: "Member".to_string(),
            product_line: "Health and beauty".to_string(),
            payment: "Ewallet".to_string(),
            quantity: 7,
            unit_price: 74.69,
            tax: 26.1415,
            total_amount: 7.0 * 74.69 + 26.1415,
            date: chrono::NaiveDate::from_ymd_opt(2019, 1, 5),
            time: NaiveTime::from_hms_opt(13, 8, 0),
            extra: BTreeMap::from([("Rating".to_string(), "9.1".to_string())]),
        }
    }

    #[test]
    fn amounts_get_separators_and_two_decimals() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(12.346), "12.35");
        assert_eq!(format_amount(1234.5), "1,234.50");
        assert_eq!(format_amount(1234567.891), "1,234,567.89");
        assert_eq!(format_amount(-1000.0), "-1,000.00");
    }

    #[test]
    fn cells_use_display_formats() {
        let rec = record();
        assert_eq!(cell_value(&rec, "Time"), "13:08");
        assert_eq!(cell_value(&rec, "Total Amount"), "548.97");
        assert_eq!(cell_value(&rec, "Tax 5%"), "26.14");
        assert_eq!(cell_value(&rec, "Month"), "1");
        assert_eq!(cell_value(&rec, "Hour"), "13");
        assert_eq!(cell_value(&rec, "Rating"), "9.1");
        assert_eq!(cell_value(&rec, "Unknown"), "");
        assert_eq!(format_time(None), "");
    }

    #[test]
    fn zero_transactions_show_no_data() {
        let text = render_kpis(&Kpis::default());
        assert!(text.contains("Avg. Sales per Transaction:   no data"), "{text}");
        assert!(!text.contains("NaN"));
    }

    #[test]
    fn empty_column_selection_prints_hint() {
        let rec = record();
        let text = render_rows(std::iter::once(&rec), &[], None);
        assert!(text.starts_with("Please select at least one column"));
    }

    #[test]
    fn rows_are_aligned_and_limited() {
        let a = record();
        let mut b = record();
        b.invoice_id = "1".to_string();
        let columns = vec!["Invoice ID".to_string(), "Quantity".to_string()];
        let text = render_rows([&a, &b].into_iter(), &columns, Some(1));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Invoice ID   Quantity");
        assert_eq!(lines[2], "750-67-8428  7");
    }
}
