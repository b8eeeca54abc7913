/// Data layer: core types, table construction, and scenario backends.
///
/// Architecture:
/// ```text
///  .parquet / .csv / .json        in-memory tables
///        │                              │
///        ▼                              ▼
///   ┌──────────────┐            ┌───────────────┐
///   │ FileScenario  │            │ MemoryScenario │   impl Scenario
///   └──────────────┘            └───────────────┘
///        │                              │
///        └──────────────┬───────────────┘
///                       ▼
///              ┌────────────────┐
///              │  QuantityData   │  RecordBatch or scalar record
///              └────────────────┘
///                       │
///                       ▼
///              ┌────────────────┐
///              │  LabeledArray   │  ndarray + dims, coords, attrs
///              └────────────────┘
/// ```

pub mod loader;
pub mod model;
pub mod source;
pub mod table;
