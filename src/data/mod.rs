/// Data layer: core types, loading, pruning and aggregation.
///
/// Architecture:
/// ```text
///  train.csv / test.csv / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset (all columns, row order kept)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  drop spectral columns + unrecognized rows → working copy
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  per-gender sums / counts / distinct speakers → Summary
///   └───────────┘
/// ```

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
