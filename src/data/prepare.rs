use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::error::{DashboardError, Result};
use super::loader::RawTable;
use super::model::{
    SalesRecord, SalesTable, COL_BRANCH, COL_CITY, COL_CUSTOMER_TYPE, COL_DATE, COL_GENDER,
    COL_HOUR, COL_INVOICE_ID, COL_MONTH, COL_PAYMENT, COL_PRODUCT_LINE, COL_QUANTITY, COL_TAX,
    COL_TIME, COL_TOTAL_AMOUNT, COL_UNIT_PRICE, PAYMENT_METHODS,
};

/// Seed for every synthesized column, so the same input always gets the
/// same synthetic values.
pub const SYNTHESIS_SEED: u64 = 42;

/// Formats accepted for a `Date` cell, tried in order.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const TIME_FORMAT: &str = "%H:%M:%S";

// ---------------------------------------------------------------------------
// Random source used to fill in missing columns
// ---------------------------------------------------------------------------

/// Deterministic source of uniform draws.
pub trait RandomSource {
    /// Uniform draw from `[0, bound)`. `bound` is always > 0.
    fn below(&mut self, bound: u32) -> u32;
}

/// The default source: a `StdRng` with a fixed seed.
pub struct SeededSource {
    rng: StdRng,
}

impl SeededSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for SeededSource {
    fn default() -> Self {
        Self::new(SYNTHESIS_SEED)
    }
}

impl RandomSource for SeededSource {
    fn below(&mut self, bound: u32) -> u32 {
        self.rng.gen_range(0..bound)
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Build the canonical table using [`SeededSource`] for missing columns.
pub fn prepare(raw: &RawTable) -> Result<SalesTable> {
    prepare_with(raw, SeededSource::default)
}

/// Build the canonical table from raw CSV rows.
///
/// `new_source` is called once per synthesized column; each column starts
/// its own stream, so the synthetic `Date`, `Time` and `Payment` columns do
/// not depend on one another.
///
/// Fails with [`DashboardError::MissingColumn`] before touching any row if a
/// required column is absent, and with [`DashboardError::InvalidValue`] if
/// a required numeric cell does not parse.
pub fn prepare_with<S, F>(raw: &RawTable, mut new_source: F) -> Result<SalesTable>
where
    S: RandomSource,
    F: FnMut() -> S,
{
    let cols = RequiredColumns::resolve(raw)?;
    let date_idx = raw.column_index(COL_DATE);
    let time_idx = raw.column_index(COL_TIME);
    let payment_idx = raw.column_index(COL_PAYMENT);
    let n = raw.len();

    let synthetic_dates = match date_idx {
        Some(_) => None,
        None => {
            log::info!("No '{COL_DATE}' column, synthesizing {n} dates");
            Some(synthesize_dates(n, &mut new_source()))
        }
    };
    let synthetic_times = match time_idx {
        Some(_) => None,
        None => {
            log::info!("No '{COL_TIME}' column, synthesizing {n} times");
            Some(synthesize_times(n, &mut new_source()))
        }
    };
    let synthetic_payments = match payment_idx {
        Some(_) => None,
        None => {
            log::info!("No '{COL_PAYMENT}' column, synthesizing {n} payment methods");
            Some(synthesize_payments(n, &mut new_source()))
        }
    };

    let consumed: Vec<usize> = cols
        .indices()
        .into_iter()
        .chain(date_idx)
        .chain(time_idx)
        .chain(payment_idx)
        .collect();

    let mut records = Vec::with_capacity(n);
    let mut unparsed_dates = 0usize;
    let mut unparsed_times = 0usize;

    for (row_no, row) in raw.records.iter().enumerate() {
        let cell = |idx: usize| row.get(idx).map(String::as_str).unwrap_or("");

        let quantity = parse_quantity(cell(cols.quantity), row_no)?;
        let unit_price = parse_amount(cell(cols.unit_price), row_no, COL_UNIT_PRICE)?;
        let tax = parse_amount(cell(cols.tax), row_no, COL_TAX)?;

        let date = match (&synthetic_dates, date_idx) {
            (Some(dates), _) => Some(dates[row_no]),
            (None, Some(idx)) => parse_date(cell(idx)),
            (None, None) => None,
        };
        if date.is_none() {
            unparsed_dates += 1;
        }

        let time = match (&synthetic_times, time_idx) {
            (Some(times), _) => times[row_no],
            (None, Some(idx)) => parse_time(cell(idx)),
            (None, None) => None,
        };
        if time.is_none() {
            unparsed_times += 1;
        }

        let payment = match (&synthetic_payments, payment_idx) {
            (Some(payments), _) => payments[row_no].to_string(),
            (None, Some(idx)) => cell(idx).to_string(),
            (None, None) => String::new(),
        };

        let extra: BTreeMap<String, String> = raw
            .headers
            .iter()
            .enumerate()
            .filter(|(i, _)| !consumed.contains(i))
            .map(|(i, h)| (h.clone(), cell(i).to_string()))
            .collect();

        records.push(SalesRecord {
            invoice_id: cell(cols.invoice_id).to_string(),
            city: cell(cols.city).to_string(),
            gender: cell(cols.gender).to_string(),
            customer_type: cell(cols.customer_type).to_string(),
            product_line: cell(cols.product_line).to_string(),
            payment,
            quantity,
            unit_price,
            tax,
            total_amount: quantity as f64 * unit_price + tax,
            date,
            time,
            extra,
        });
    }

    if unparsed_dates > 0 {
        log::warn!("{unparsed_dates} rows have an unparseable '{COL_DATE}'");
    }
    if unparsed_times > 0 {
        log::warn!("{unparsed_times} rows have an unparseable '{COL_TIME}' (expected HH:MM:SS)");
    }

    let column_names = display_columns(
        raw,
        synthetic_dates.is_some(),
        synthetic_times.is_some(),
        synthetic_payments.is_some(),
    );
    Ok(SalesTable::from_records(records, column_names))
}

// ---------------------------------------------------------------------------
// Column resolution
// ---------------------------------------------------------------------------

struct RequiredColumns {
    quantity: usize,
    unit_price: usize,
    tax: usize,
    invoice_id: usize,
    city: usize,
    gender: usize,
    customer_type: usize,
    product_line: usize,
}

impl RequiredColumns {
    fn resolve(raw: &RawTable) -> Result<Self> {
        let require = |name: &str| {
            raw.column_index(name)
                .ok_or_else(|| DashboardError::MissingColumn {
                    column: name.to_string(),
                })
        };
        Ok(Self {
            quantity: require(COL_QUANTITY)?,
            unit_price: require(COL_UNIT_PRICE)?,
            tax: require(COL_TAX)?,
            invoice_id: require(COL_INVOICE_ID)?,
            city: match raw.column_index(COL_CITY) {
                Some(idx) => idx,
                None => require(COL_BRANCH).map_err(|_| DashboardError::MissingColumn {
                    column: COL_CITY.to_string(),
                })?,
            },
            gender: require(COL_GENDER)?,
            customer_type: require(COL_CUSTOMER_TYPE)?,
            product_line: require(COL_PRODUCT_LINE)?,
        })
    }

    fn indices(&self) -> [usize; 8] {
        [
            self.quantity,
            self.unit_price,
            self.tax,
            self.invoice_id,
            self.city,
            self.gender,
            self.customer_type,
            self.product_line,
        ]
    }
}

/// Source headers, then synthesized and derived columns in the order they
/// are added.
fn display_columns(raw: &RawTable, dates: bool, times: bool, payments: bool) -> Vec<String> {
    let mut names = raw.headers.clone();
    names.push(COL_TOTAL_AMOUNT.to_string());
    if dates {
        names.push(COL_DATE.to_string());
    }
    if times {
        names.push(COL_TIME.to_string());
    }
    names.push(COL_MONTH.to_string());
    names.push(COL_HOUR.to_string());
    if payments {
        names.push(COL_PAYMENT.to_string());
    }
    names
}

// ---------------------------------------------------------------------------
// Cell parsing
// ---------------------------------------------------------------------------

/// Quantities are bounded to `u32` so per-dimension sums stay far from
/// `i64` overflow.
fn parse_quantity(s: &str, row: usize) -> Result<i64> {
    s.trim()
        .parse::<u32>()
        .map(i64::from)
        .map_err(|_| invalid(row, COL_QUANTITY, s))
}

fn parse_amount(s: &str, row: usize, column: &str) -> Result<f64> {
    match s.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(invalid(row, column, s)),
    }
}

fn invalid(row: usize, column: &str, value: &str) -> DashboardError {
    DashboardError::InvalidValue {
        row,
        column: column.to_string(),
        value: value.to_string(),
    }
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
                .ok()
                .map(|dt| dt.date())
        })
}

/// Strict `HH:MM:SS`.
pub fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), TIME_FORMAT).ok()
}

// ---------------------------------------------------------------------------
// Synthesis
// ---------------------------------------------------------------------------

/// One date per row, uniform over 2023-01-01 ..= 2023-12-31.
fn synthesize_dates<S: RandomSource>(n: usize, source: &mut S) -> Vec<NaiveDate> {
    let (start, end) = synthetic_date_window();
    let span = (end - start).num_days() as u32 + 1;
    (0..n)
        .map(|_| start + Duration::days(i64::from(source.below(span))))
        .collect()
}

fn synthetic_date_window() -> (NaiveDate, NaiveDate) {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).expect("2023-01-01 is a valid date");
    let end = NaiveDate::from_ymd_opt(2023, 12, 31).expect("2023-12-31 is a valid date");
    (start, end)
}

/// One time per row: hour in [8, 21), minute in [0, 60), drawn in that order.
fn synthesize_times<S: RandomSource>(n: usize, source: &mut S) -> Vec<Option<NaiveTime>> {
    (0..n)
        .map(|_| {
            let hour = 8 + source.below(13);
            let minute = source.below(60);
            NaiveTime::from_hms_opt(hour, minute, 0)
        })
        .collect()
}

fn synthesize_payments<S: RandomSource>(n: usize, source: &mut S) -> Vec<&'static str> {
    let choices = PAYMENT_METHODS.len() as u32;
    (0..n)
        .map(|_| PAYMENT_METHODS[(source.below(choices) % choices) as usize])
        .collect()
}
