/// Data layer: core types, loading, preparation, filtering and aggregation.
///
/// Architecture:
/// ```text
///        .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  read file → RawTable (headers + string records)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  prepare  │  derive Total/Month/Hour, synthesize Date/Time/Payment
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ SalesTable│  Vec<SalesRecord>, unique values per dimension
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  apply FilterCriteria → filtered indices
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  group-by-sum of Quantity, KPIs
///   └───────────┘
/// ```

pub mod aggregate;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod prepare;
