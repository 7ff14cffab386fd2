//! URL Features Module - lexical feature extraction
//!
//! - `layout`: versioned feature order (the classifier contract)
//! - `vector`: `FeatureVector`, the classifier input
//! - `host`: hostname helpers (parsing, IPv4, base domain)
//! - `extractor`: `UrlFeatureExtractor`

pub mod extractor;
pub mod host;
pub mod layout;
pub mod vector;

pub use extractor::UrlFeatureExtractor;
pub use layout::{
    layout_hash, LayoutInfo, LayoutMismatchError, URL_FEATURE_COUNT, URL_FEATURE_LAYOUT,
    URL_FEATURE_VERSION,
};
pub use vector::FeatureVector;
