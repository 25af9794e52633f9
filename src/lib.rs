//! Baseline-corrected peak extraction for square-wave voltammetry (SWV).
//!
//! A scan is smoothed, a first peak estimate is taken, the slow instrumental
//! drift under it is fitted by iteratively reweighted penalized least squares
//! with the peak region masked out, and the peak is located again on the
//! drift-free signal.
//!
//! ```
//! use swv_peak::{analyze, PipelineConfig};
//! use swv_peak::synthetic::SyntheticScan;
//!
//! let scan = SyntheticScan::default();
//! let result = analyze(&scan.potential(), &scan.signal(), &PipelineConfig::default()).unwrap();
//! assert!((result.peak().voltage - 0.5).abs() <= 0.01);
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod processing;
pub mod synthetic;

pub use config::{BaselineConfig, PeakSearchConfig, PipelineConfig, SmoothingConfig};
pub use data::model::{ExclusionZone, Peak, SampleSeries};
pub use error::{AnalysisError, PipelineError, Stage};
pub use processing::peak::{Detection, PeakLocation};
pub use processing::pipeline::{analyze, analyze_series, AnalysisResult, AnalysisSummary};
