//! Phish Shield
//!
//! Phishing verdicts from two signals: a lexical URL classifier and a
//! page-structure scorer, fused by a stacked logistic model.

pub mod api;
pub mod config;
pub mod constants;
pub mod error;
pub mod logic;

pub use error::{ConfigError, PipelineError, PipelineResult};
