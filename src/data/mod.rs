/// Data layer: core types, harmonization, matching and aggregation.
///
/// Architecture:
/// ```text
///  TAP CSV / .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  rows → ObsCoreTable → Vec<SpectralWindow>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  window × SiO table → Vec<SpwMatch>
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  group by MOUS id → Vec<MousSummary>
///   └───────────┘
/// ```

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
pub mod transitions;
