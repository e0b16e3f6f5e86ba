/// Data layer: gather model, loading, and display conditioning.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Gather
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Gather   │  Vec<Trace>, sampling rate, start time
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ display   │  demean / clip / normalise → wiggle geometry
///   └──────────┘
/// ```

pub mod display;
pub mod loader;
pub mod model;
