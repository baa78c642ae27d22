use std::collections::{BTreeSet, HashSet};

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::model::{Dimension, InclusiveRange, SalesRecord, SalesTable, TimeOfDay};

// ---------------------------------------------------------------------------
// Filter criteria: one complete set of user selections
// ---------------------------------------------------------------------------

/// Every constraint applied in one filtering pass.
///
/// For each field `None` means "no restriction". A set that is present but
/// empty means the user deselected everything and matches no rows; the
/// presentation layer starts from [`default_criteria`] so that "nothing
/// configured" and "everything deselected" stay distinguishable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterCriteria {
    pub cities: Option<BTreeSet<String>>,
    pub genders: Option<BTreeSet<String>>,
    pub customer_types: Option<BTreeSet<String>>,
    pub product_lines: Option<BTreeSet<String>>,
    pub payment_methods: Option<BTreeSet<String>>,
    pub quantity_range: Option<InclusiveRange<i64>>,
    pub total_range: Option<InclusiveRange<f64>>,
    pub date_range: Option<InclusiveRange<NaiveDate>>,
    pub weekdays: Option<HashSet<Weekday>>,
    pub time_of_day: TimeOfDay,
}

impl FilterCriteria {
    /// Selected values for a categorical dimension.
    pub fn selection(&self, dim: Dimension) -> Option<&BTreeSet<String>> {
        match dim {
            Dimension::City => self.cities.as_ref(),
            Dimension::Gender => self.genders.as_ref(),
            Dimension::CustomerType => self.customer_types.as_ref(),
            Dimension::ProductLine => self.product_lines.as_ref(),
            Dimension::Payment => self.payment_methods.as_ref(),
        }
    }

    pub fn selection_mut(&mut self, dim: Dimension) -> &mut Option<BTreeSet<String>> {
        match dim {
            Dimension::City => &mut self.cities,
            Dimension::Gender => &mut self.genders,
            Dimension::CustomerType => &mut self.customer_types,
            Dimension::ProductLine => &mut self.product_lines,
            Dimension::Payment => &mut self.payment_methods,
        }
    }

    /// Whether any filter that looks at the time of day is in effect.
    pub fn is_time_based(&self) -> bool {
        self.weekdays.is_some() || self.time_of_day != TimeOfDay::All
    }

    /// Check a single record against every active predicate.
    ///
    /// A null `Date` fails the date range and weekday filters; a null `Hour`
    /// fails every time-based filter.
    pub fn matches(&self, rec: &SalesRecord) -> bool {
        for dim in Dimension::ALL {
            if let Some(selected) = self.selection(dim) {
                if !selected.contains(rec.dimension(dim)) {
                    return false;
                }
            }
        }

        if let Some(range) = &self.quantity_range {
            if !range.contains(&rec.quantity) {
                return false;
            }
        }
        if let Some(range) = &self.total_range {
            if !range.contains(&rec.total_amount) {
                return false;
            }
        }
        if let Some(range) = &self.date_range {
            match rec.date {
                Some(date) if range.contains(&date) => {}
                _ => return false,
            }
        }
        if let Some(days) = &self.weekdays {
            match rec.weekday() {
                Some(day) if days.contains(&day) => {}
                _ => return false,
            }
        }
        if self.is_time_based() {
            match rec.hour() {
                Some(hour) if self.time_of_day.contains(hour) => {}
                _ => return false,
            }
        }
        true
    }

    /// Ranges whose start lies after their end. These are applied as given
    /// (and match nothing); the caller only reports them.
    pub fn range_warnings(&self) -> Vec<RangeWarning> {
        let mut warnings = Vec::new();
        if let Some(r) = self.date_range.filter(|r| r.is_inverted()) {
            warnings.push(RangeWarning::Date { start: r.min, end: r.max });
        }
        if let Some(r) = self.quantity_range.filter(|r| r.is_inverted()) {
            warnings.push(RangeWarning::Quantity { min: r.min, max: r.max });
        }
        if let Some(r) = self.total_range.filter(|r| r.is_inverted()) {
            warnings.push(RangeWarning::Total { min: r.min, max: r.max });
        }
        warnings
    }
}

// ---------------------------------------------------------------------------
// Non-fatal range warnings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum RangeWarning {
    Date { start: NaiveDate, end: NaiveDate },
    Quantity { min: i64, max: i64 },
    Total { min: f64, max: f64 },
}

impl std::fmt::Display for RangeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RangeWarning::Date { start, end } => {
                write!(f, "Start Date ({start}) cannot be after End Date ({end}).")
            }
            RangeWarning::Quantity { min, max } => {
                write!(f, "Minimum quantity ({min}) is above the maximum ({max}).")
            }
            RangeWarning::Total { min, max } => {
                write!(f, "Minimum invoice total ({min:.2}) is above the maximum ({max:.2}).")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults and evaluation
// ---------------------------------------------------------------------------

/// Criteria that select the whole table: every multiselect holds its full
/// option set and every range spans the observed bounds.
///
/// The total range is widened to whole numbers so that slider-style inputs
/// starting from it never cut off the extreme rows. Weekdays are left unset.
pub fn default_criteria(table: &SalesTable) -> FilterCriteria {
    let mut criteria = FilterCriteria::default();
    for dim in Dimension::ALL {
        *criteria.selection_mut(dim) = table.unique_values.get(&dim).cloned();
    }
    criteria.quantity_range = table.quantity_bounds();
    criteria.total_range = table
        .total_bounds()
        .map(|r| InclusiveRange::new(r.min.floor(), r.max.ceil()));
    criteria.date_range = table.date_bounds();
    criteria
}

/// Return indices of records that pass all active filters, in table order.
pub fn filtered_indices(table: &SalesTable, criteria: &FilterCriteria) -> Vec<usize> {
    table
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| criteria.matches(rec))
        .map(|(i, _)| i)
        .collect()
}
