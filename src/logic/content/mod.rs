//! Content Module - page-structure phishing heuristics
//!
//! ## Structure
//! - `snapshot`: `PageStructure` accessor trait + owned `PageSnapshot`
//! - `detectors`: the six sub-detectors
//! - `patterns`: script obfuscation pattern table
//! - `aggregate`: sub-score aggregation strategies (logistic, weighted average)
//! - `scorer`: `PageStructureScorer`

pub mod aggregate;
pub mod detectors;
pub mod patterns;
pub mod scorer;
pub mod snapshot;


pub use aggregate::{sigmoid, ContentAggregation, SUB_DETECTOR_COUNT};
pub use detectors::SubDetectorResult;
pub use scorer::{AggregateContentResult, PageStructureScorer, SUB_DETECTOR_NAMES};
pub use snapshot::{
    AnchorElement, FormElement, ImageElement, InputElement, PageSnapshot, PageStructure,
    ScriptElement,
};
