use super::aggregate::{Aggregates, Kpis};
use super::filter::{filtered_indices, FilterCriteria, RangeWarning};
use super::model::{SalesRecord, SalesTable};

/// Everything the presentation layer needs after one filtering pass.
///
/// Borrows the canonical table; the filtered view is a list of row indices
/// into it, in table order.
#[derive(Debug, Clone)]
pub struct Dashboard<'a> {
    table: &'a SalesTable,
    pub indices: Vec<usize>,
    pub aggregates: Aggregates,
    pub kpis: Kpis,
    pub warnings: Vec<RangeWarning>,
}

impl<'a> Dashboard<'a> {
    /// Filtered rows, in table order.
    pub fn rows(&self) -> impl Iterator<Item = &'a SalesRecord> + Clone + '_ {
        let table = self.table;
        self.indices.iter().map(move |&i| &table.records[i])
    }

    pub fn table(&self) -> &'a SalesTable {
        self.table
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Filter the table and derive aggregates and KPIs. Pure: the table is not
/// touched and nothing is cached between calls.
pub fn recompute<'a>(table: &'a SalesTable, criteria: &FilterCriteria) -> Dashboard<'a> {
    let warnings = criteria.range_warnings();
    for w in &warnings {
        log::warn!("{w}");
    }

    let indices = filtered_indices(table, criteria);
    let rows = indices.iter().map(|&i| &table.records[i]);
    let aggregates = Aggregates::compute(rows.clone());
    let kpis = Kpis::compute(rows);

    log::debug!(
        "Filtered {} of {} rows, {} items in {} transactions",
        indices.len(),
        table.len(),
        kpis.total_items_sold,
        kpis.total_transactions
    );

    Dashboard {
        table,
        indices,
        aggregates,
        kpis,
        warnings,
    }
}
