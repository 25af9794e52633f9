/// Data layer: scan types and raw measurement normalisation.
///
/// Architecture:
/// ```text
///  (potential, current) pairs from an instrument export
///        │
///        ▼
///   ┌──────────┐
///   │ prepare  │  drop zero current, sort, flip sign
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ SampleSeries │  aligned potential / signal vectors
///   └──────────────┘
///        │
///        ▼
///   processing::pipeline → Peak, ExclusionZone
/// ```

pub mod model;
pub mod prepare;
