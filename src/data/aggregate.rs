use std::collections::{BTreeMap, HashSet};

use super::error::{DashboardError, Result};
use super::model::{month_name, Dimension, SalesRecord};

// ---------------------------------------------------------------------------
// Group-by-sum of Quantity
// ---------------------------------------------------------------------------

/// Sum of `Quantity` per key. Keys with no rows never appear.
pub type QuantityByKey<K> = BTreeMap<K, i64>;

/// Sum `Quantity` grouped by `key`. Rows for which `key` returns `None` are
/// left out of every group.
pub fn sum_quantity_by<'a, K, I, F>(records: I, key: F) -> QuantityByKey<K>
where
    K: Ord,
    I: IntoIterator<Item = &'a SalesRecord>,
    F: Fn(&SalesRecord) -> Option<K>,
{
    let mut sums = BTreeMap::new();
    for rec in records {
        if let Some(k) = key(rec) {
            *sums.entry(k).or_insert(0) += rec.quantity;
        }
    }
    sums
}

/// The per-dimension breakdowns shown next to the KPIs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregates {
    pub by_city: QuantityByKey<String>,
    pub by_product_line: QuantityByKey<String>,
    /// Keyed by month number so iteration runs January → December.
    pub by_month: QuantityByKey<u32>,
    pub by_hour: QuantityByKey<u32>,
    pub by_gender: QuantityByKey<String>,
    pub by_customer_type: QuantityByKey<String>,
}

impl Aggregates {
    pub fn compute<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a SalesRecord> + Clone,
    {
        let by_dim = |dim: Dimension| {
            sum_quantity_by(records.clone(), move |r| Some(r.dimension(dim).to_string()))
        };
        Aggregates {
            by_city: by_dim(Dimension::City),
            by_product_line: by_dim(Dimension::ProductLine),
            by_month: sum_quantity_by(records.clone(), SalesRecord::month),
            by_hour: sum_quantity_by(records.clone(), SalesRecord::hour),
            by_gender: by_dim(Dimension::Gender),
            by_customer_type: by_dim(Dimension::CustomerType),
        }
    }

    /// Monthly sums with month numbers replaced by names, in calendar order.
    pub fn monthly_named(&self) -> Vec<(&'static str, i64)> {
        self.by_month
            .iter()
            .map(|(&m, &q)| (month_name(m), q))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.by_city.is_empty()
            && self.by_product_line.is_empty()
            && self.by_month.is_empty()
            && self.by_hour.is_empty()
            && self.by_gender.is_empty()
            && self.by_customer_type.is_empty()
    }
}

// ---------------------------------------------------------------------------
// KPIs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Kpis {
    pub total_items_sold: i64,
    /// Distinct `Invoice ID`s.
    pub total_transactions: usize,
}

impl Kpis {
    pub fn compute<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a SalesRecord>,
    {
        let mut total_items_sold = 0;
        let mut invoices: HashSet<&str> = HashSet::new();
        for rec in records {
            total_items_sold += rec.quantity;
            invoices.insert(rec.invoice_id.as_str());
        }
        Kpis {
            total_items_sold,
            total_transactions: invoices.len(),
        }
    }

    /// Items per transaction; [`DashboardError::NoTransactions`] when nothing
    /// matched.
    pub fn avg_items_per_transaction(&self) -> Result<f64> {
        if self.total_transactions == 0 {
            return Err(DashboardError::NoTransactions);
        }
        Ok(self.total_items_sold as f64 / self.total_transactions as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn rec(invoice: &str, city: &str, quantity: i64, month: Option<u32>, hour: Option<u32>) -> SalesRecord {
        SalesRecord {
            invoice_id: invoice.to_string(),
            city: city.to_string(),
            gender: if quantity % 2 == 0 { "Male" } else { "Female" }.to_string(),
            customer_type: "Normal".to_string(),
            product_line: "Sports and travel".to_string(),
            payment: "Cash".to_string(),
            quantity,
            unit_price: 1.0,
            tax: 0.0,
            total_amount: quantity as f64,
            date: month.and_then(|m| NaiveDate::from_ymd_opt(2023, m, 1)),
            time: hour.and_then(|h| NaiveTime::from_hms_opt(h, 0, 0)),
            extra: Default::default(),
        }
    }

    #[test]
    fn group_sums_omit_absent_keys() {
        let rows = [
            rec("1", "A", 1, Some(3), Some(9)),
            rec("2", "A", 2, Some(1), Some(9)),
            rec("3", "B", 3, None, None),
        ];
        let agg = Aggregates::compute(&rows);
        assert_eq!(agg.by_city, BTreeMap::from([("A".to_string(), 3), ("B".to_string(), 3)]));
        assert_eq!(agg.by_month, BTreeMap::from([(1, 2), (3, 1)]));
        assert_eq!(agg.by_hour, BTreeMap::from([(9, 3)]));
        assert_eq!(agg.monthly_named(), vec![("January", 2), ("March", 1)]);
        assert_eq!(agg.by_gender.values().sum::<i64>(), 6);
    }

    #[test]
    fn kpis_count_distinct_invoices() {
        let rows = [
            rec("1", "A", 4, None, None),
            rec("1", "A", 2, None, None),
            rec("2", "B", 3, None, None),
        ];
        let kpis = Kpis::compute(&rows);
        assert_eq!(kpis.total_items_sold, 9);
        assert_eq!(kpis.total_transactions, 2);
        assert!((kpis.avg_items_per_transaction().unwrap() - 4.5).abs() < 1e-12);
    }

    #[test]
    fn zero_transactions_is_an_error_not_nan() {
        let kpis = Kpis::compute(std::iter::empty::<&SalesRecord>());
        assert!(matches!(
            kpis.avg_items_per_transaction(),
            Err(DashboardError::NoTransactions)
        ));
        assert!(Aggregates::compute(std::iter::empty::<&SalesRecord>()).is_empty());
    }
}
