//! Data layer: core types, loading, filtering and the derived views.
//!
//! Architecture:
//! ```text
//!  .xlsx / .csv / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse first sheet → RawTable → ShipmentDataset
//!   └──────────┘      (delay_mins, Month derived once; cached process-wide)
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  FilterSelection → Subset (row indices)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌─────────────────────────────┐
//!   │ summary · charts · export    │  pure functions of the Subset
//!   └─────────────────────────────┘
//! ```
//! `pipeline::recompute` runs filter → summary → charts → export in one pass.

pub mod cache;
pub mod charts;
pub mod error;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod summary;
