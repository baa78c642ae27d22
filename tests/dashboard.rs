use std::collections::BTreeSet;
use std::io::Write;

use market_sales::data::dashboard::recompute;
use market_sales::data::error::DashboardError;
use market_sales::data::filter::{default_criteria, FilterCriteria};
use market_sales::data::loader::{load_file, load_reader};
use market_sales::data::model::{InclusiveRange, SalesTable, TimeOfDay};
use market_sales::data::prepare::prepare;
use market_sales::report::{self, TableOptions};
use market_sales::state::Session;

const HEADER: &str = "Invoice ID,City,Gender,Customer type,Product line,Unit price,Quantity,Tax 5%";

fn table_from(csv: &str) -> SalesTable {
    let raw = load_reader(csv.as_bytes(), "inline").expect("csv");
    prepare(&raw).expect("prepare")
}

fn set(values: &[&str]) -> Option<BTreeSet<String>> {
    Some(values.iter().map(|v| v.to_string()).collect())
}

fn four_rows() -> SalesTable {
    table_from(&format!(
        "{HEADER}\n\
         inv-1,A,Male,Member,Food,10.0,1,0.5\n\
         inv-2,A,Female,Normal,Food,10.0,2,1.0\n\
         inv-3,B,Male,Normal,Sports,10.0,3,1.5\n\
         inv-4,B,Female,Member,Sports,10.0,4,2.0\n"
    ))
}

#[test]
fn filtering_to_one_city() {
    let table = four_rows();
    let criteria = FilterCriteria {
        cities: set(&["A"]),
        ..Default::default()
    };
    let dash = recompute(&table, &criteria);

    let quantities: Vec<i64> = dash.rows().map(|r| r.quantity).collect();
    assert_eq!(quantities, vec![1, 2]);
    assert_eq!(dash.aggregates.by_city.len(), 1);
    assert_eq!(dash.aggregates.by_city.get("A"), Some(&3));
    assert_eq!(dash.kpis.total_items_sold, 3);
    assert_eq!(dash.kpis.total_transactions, 2);
    assert!((dash.kpis.avg_items_per_transaction().unwrap() - 1.5).abs() < 1e-12);
}

#[test]
fn deselecting_every_city_empties_everything() {
    let table = four_rows();
    let mut criteria = default_criteria(&table);
    criteria.cities = Some(BTreeSet::new());
    let dash = recompute(&table, &criteria);

    assert!(dash.is_empty());
    assert!(dash.aggregates.is_empty());
    assert_eq!(dash.kpis.total_items_sold, 0);
    assert!(matches!(
        dash.kpis.avg_items_per_transaction(),
        Err(DashboardError::NoTransactions)
    ));

    let text = report::render(&dash, &TableOptions::default());
    assert!(text.contains("no data"));
}

#[test]
fn defaults_show_the_whole_table() {
    let table = four_rows();
    let dash = recompute(&table, &default_criteria(&table));
    assert_eq!(dash.len(), 4);
    assert_eq!(dash.kpis.total_items_sold, 10);
}

#[test]
fn aggregates_sum_to_total_items() {
    let table = four_rows();
    let criteria = FilterCriteria {
        quantity_range: Some(InclusiveRange::new(2, 4)),
        ..Default::default()
    };
    let dash = recompute(&table, &criteria);
    let total = dash.kpis.total_items_sold;
    let agg = &dash.aggregates;
    assert_eq!(total, 9);
    assert_eq!(agg.by_city.values().sum::<i64>(), total);
    assert_eq!(agg.by_product_line.values().sum::<i64>(), total);
    assert_eq!(agg.by_gender.values().sum::<i64>(), total);
    assert_eq!(agg.by_customer_type.values().sum::<i64>(), total);
    // Synthesized dates and times are never null.
    assert_eq!(agg.by_month.values().sum::<i64>(), total);
    assert_eq!(agg.by_hour.values().sum::<i64>(), total);
}

#[test]
fn narrowing_criteria_is_monotonic() {
    let table = four_rows();
    let mut criteria = default_criteria(&table);
    let mut last = recompute(&table, &criteria).len();
    for max in (0..4).rev() {
        criteria.quantity_range = Some(InclusiveRange::new(1, max));
        let n = recompute(&table, &criteria).len();
        assert!(n <= last, "{n} > {last}");
        last = n;
    }
    criteria.genders = set(&["Male"]);
    assert!(recompute(&table, &criteria).len() <= last);
}

#[test]
fn unparseable_time_is_excluded_from_time_filters_and_hourly() {
    let table = table_from(&format!(
        "{HEADER},Date,Time\n\
         inv-1,A,Male,Member,Food,10.0,1,0.5,2023-06-05,12:00:00\n\
         inv-2,A,Male,Member,Food,10.0,5,0.5,2023-06-05,noon\n"
    ));
    assert_eq!(table.records[1].hour(), None);

    let everything = recompute(&table, &FilterCriteria::default());
    assert_eq!(everything.len(), 2);
    assert_eq!(everything.aggregates.by_hour.values().sum::<i64>(), 1);

    for tod in [TimeOfDay::Morning, TimeOfDay::Afternoon] {
        let criteria = FilterCriteria {
            time_of_day: tod,
            ..Default::default()
        };
        let dash = recompute(&table, &criteria);
        // Hour 12 belongs to both buckets.
        assert_eq!(dash.indices, vec![0], "{tod:?}");
    }

    let weekdays = FilterCriteria {
        weekdays: Some([chrono::Weekday::Mon].into_iter().collect()),
        ..Default::default()
    };
    assert_eq!(recompute(&table, &weekdays).indices, vec![0]);
}

#[test]
fn inverted_date_range_warns_and_matches_nothing() {
    let table = table_from(&format!(
        "{HEADER},Date\n\
         inv-1,A,Male,Member,Food,10.0,1,0.5,2023-02-01\n\
         inv-2,B,Female,Normal,Food,10.0,2,1.0,2023-08-15\n"
    ));
    let mut criteria = default_criteria(&table);
    let bounds = criteria.date_range.expect("dates");
    assert_eq!(bounds.min.to_string(), "2023-02-01");
    assert_eq!(bounds.max.to_string(), "2023-08-15");
    criteria.date_range = Some(InclusiveRange::new(bounds.max, bounds.min));

    let dash = recompute(&table, &criteria);
    assert_eq!(dash.warnings.len(), 1);
    assert!(dash.is_empty());

    let text = report::render(&dash, &TableOptions::default());
    assert!(text.starts_with("warning: Start Date (2023-08-15)"), "{text}");
}

#[test]
fn largest_quantities_sum_without_overflow() {
    let max = u32::MAX;
    let table = table_from(&format!(
        "{HEADER}\n\
         inv-1,A,Male,Member,Food,1.0,{max},0.0\n\
         inv-2,A,Male,Member,Food,1.0,{max},0.0\n"
    ));
    let dash = recompute(&table, &FilterCriteria::default());
    let expected = 2 * i64::from(max);
    assert_eq!(dash.kpis.total_items_sold, expected);
    assert_eq!(dash.aggregates.by_city.get("A"), Some(&expected));
}

#[test]
fn synthesized_columns_are_identical_across_loads() {
    let csv = format!(
        "{HEADER}\n\
         a,A,Male,Member,Food,1.0,1,0.0\n\
         b,B,Male,Member,Food,1.0,1,0.0\n\
         c,C,Male,Member,Food,1.0,1,0.0\n"
    );
    let first = table_from(&csv);
    let second = table_from(&csv);
    assert_eq!(first.records, second.records);
}

#[test]
fn session_reloads_from_disk_and_reports_missing_columns() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "Invoice ID,City,Quantity\n1,A,3\n").unwrap();
    file.flush().unwrap();

    let err = prepare(&load_file(file.path()).unwrap()).unwrap_err();
    assert!(matches!(err, DashboardError::MissingColumn { ref column } if column == "Unit price"));

    let mut session = Session::new();
    assert!(session.load(file.path()).is_err());
    assert!(session.table().is_none());
    assert!(session.recompute().is_none());
}
