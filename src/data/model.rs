use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Column names as they appear in the CSV header
// ---------------------------------------------------------------------------

pub const COL_INVOICE_ID: &str = "Invoice ID";
pub const COL_CITY: &str = "City";
/// Accepted in place of `City` when the file has no `City` column.
pub const COL_BRANCH: &str = "Branch";
pub const COL_GENDER: &str = "Gender";
pub const COL_CUSTOMER_TYPE: &str = "Customer type";
pub const COL_PRODUCT_LINE: &str = "Product line";
pub const COL_QUANTITY: &str = "Quantity";
pub const COL_UNIT_PRICE: &str = "Unit price";
pub const COL_TAX: &str = "Tax 5%";
pub const COL_DATE: &str = "Date";
pub const COL_TIME: &str = "Time";
pub const COL_PAYMENT: &str = "Payment";
pub const COL_TOTAL_AMOUNT: &str = "Total Amount";
pub const COL_MONTH: &str = "Month";
pub const COL_HOUR: &str = "Hour";

pub const PAYMENT_METHODS: [&str; 3] = ["Cash", "Credit Card", "E-Wallet"];

// ---------------------------------------------------------------------------
// Dimension – a categorical column that can be filtered by set membership
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    City,
    Gender,
    CustomerType,
    ProductLine,
    Payment,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::City,
        Dimension::Gender,
        Dimension::CustomerType,
        Dimension::ProductLine,
        Dimension::Payment,
    ];

    /// Header name of the column backing this dimension.
    pub fn column(self) -> &'static str {
        match self {
            Dimension::City => COL_CITY,
            Dimension::Gender => COL_GENDER,
            Dimension::CustomerType => COL_CUSTOMER_TYPE,
            Dimension::ProductLine => COL_PRODUCT_LINE,
            Dimension::Payment => COL_PAYMENT,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

// ---------------------------------------------------------------------------
// TimeOfDay – coarse hour buckets
// ---------------------------------------------------------------------------

/// Hour buckets, inclusive on both ends. Adjacent buckets share their
/// boundary hour (12 is Morning and Afternoon, 17 is Afternoon and Evening).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    #[default]
    All,
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    /// Inclusive hour bounds, `None` for `All`.
    pub fn hours(self) -> Option<(u32, u32)> {
        match self {
            TimeOfDay::All => None,
            TimeOfDay::Morning => Some((8, 12)),
            TimeOfDay::Afternoon => Some((12, 17)),
            TimeOfDay::Evening => Some((17, 21)),
        }
    }

    pub fn contains(self, hour: u32) -> bool {
        match self.hours() {
            None => true,
            Some((start, end)) => (start..=end).contains(&hour),
        }
    }
}

// ---------------------------------------------------------------------------
// InclusiveRange – (min, max) bounds for numeric and date filters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InclusiveRange<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd> InclusiveRange<T> {
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: &T) -> bool {
        *value >= self.min && *value <= self.max
    }

    /// `min > max`: nothing can match, but the range is still applied as given.
    pub fn is_inverted(&self) -> bool {
        self.min > self.max
    }
}

// ---------------------------------------------------------------------------
// SalesRecord – one transaction row
// ---------------------------------------------------------------------------

/// One prepared transaction (a row of the canonical table).
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    pub invoice_id: String,
    pub city: String,
    pub gender: String,
    pub customer_type: String,
    pub product_line: String,
    pub payment: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub tax: f64,
    /// `quantity × unit_price + tax`.
    pub total_amount: f64,
    /// Null when the source value did not parse.
    pub date: Option<NaiveDate>,
    /// Null when the source value did not parse as `HH:MM:SS`.
    pub time: Option<NaiveTime>,
    /// Columns the pipeline does not interpret, kept for the raw-data view.
    pub extra: BTreeMap<String, String>,
}

impl SalesRecord {
    pub fn month(&self) -> Option<u32> {
        self.date.map(|d| d.month())
    }

    pub fn hour(&self) -> Option<u32> {
        self.time.map(|t| t.hour())
    }

    pub fn weekday(&self) -> Option<Weekday> {
        self.date.map(|d| d.weekday())
    }

    /// Value of a categorical dimension.
    pub fn dimension(&self, dim: Dimension) -> &str {
        match dim {
            Dimension::City => &self.city,
            Dimension::Gender => &self.gender,
            Dimension::CustomerType => &self.customer_type,
            Dimension::ProductLine => &self.product_line,
            Dimension::Payment => &self.payment,
        }
    }
}

// ---------------------------------------------------------------------------
// SalesTable – the canonical, immutable dataset
// ---------------------------------------------------------------------------

/// The fully prepared dataset with pre-computed option indices.
#[derive(Debug, Clone)]
pub struct SalesTable {
    /// All records, in source order.
    pub records: Vec<SalesRecord>,
    /// Column names in display order: source header order, then any
    /// synthesized and derived columns.
    pub column_names: Vec<String>,
    /// For each dimension the sorted set of unique values.
    pub unique_values: BTreeMap<Dimension, BTreeSet<String>>,
}

impl SalesTable {
    /// Build option indices from the prepared records.
    pub fn from_records(records: Vec<SalesRecord>, column_names: Vec<String>) -> Self {
        let mut unique_values: BTreeMap<Dimension, BTreeSet<String>> = Dimension::ALL
            .iter()
            .map(|&dim| (dim, BTreeSet::new()))
            .collect();

        for rec in &records {
            for dim in Dimension::ALL {
                unique_values
                    .entry(dim)
                    .or_default()
                    .insert(rec.dimension(dim).to_string());
            }
        }

        SalesTable {
            records,
            column_names,
            unique_values,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn quantity_bounds(&self) -> Option<InclusiveRange<i64>> {
        let min = self.records.iter().map(|r| r.quantity).min()?;
        let max = self.records.iter().map(|r| r.quantity).max()?;
        Some(InclusiveRange::new(min, max))
    }

    pub fn total_bounds(&self) -> Option<InclusiveRange<f64>> {
        let mut totals = self.records.iter().map(|r| r.total_amount);
        let first = totals.next()?;
        let (min, max) = totals.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
        Some(InclusiveRange::new(min, max))
    }

    /// Earliest and latest non-null date.
    pub fn date_bounds(&self) -> Option<InclusiveRange<NaiveDate>> {
        let min = self.records.iter().filter_map(|r| r.date).min()?;
        let max = self.records.iter().filter_map(|r| r.date).max()?;
        Some(InclusiveRange::new(min, max))
    }
}

/// English month name for a month number (1–12).
pub fn month_name(month: u32) -> &'static str {
    const NAMES: [&str; 12] = [
        "January", "February", "March", "April", "May", "June", "July", "August", "September",
        "October", "November", "December",
    ];
    month
        .checked_sub(1)
        .and_then(|i| NAMES.get(i as usize))
        .copied()
        .unwrap_or("Unknown")
}
