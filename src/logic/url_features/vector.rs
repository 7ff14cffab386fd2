//! URL Feature Vector - classifier input
//!
//! Carries its layout version and hash so a vector built under one
//! layout is never fed to a model trained on another.

use serde::{Deserialize, Serialize};

use super::layout::{
    feature_index, layout_hash, validate_layout, LayoutMismatchError, URL_FEATURE_COUNT,
    URL_FEATURE_LAYOUT, URL_FEATURE_VERSION,
};

/// Versioned, fixed-order URL feature vector.
///
/// Built once per URL by the extractor and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub version: u8,
    pub layout_hash: u32,
    pub values: [f32; URL_FEATURE_COUNT],
}

impl FeatureVector {
    pub fn from_values(values: [f32; URL_FEATURE_COUNT]) -> Self {
        Self {
            version: URL_FEATURE_VERSION,
            layout_hash: layout_hash(),
            values,
        }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<f32> {
        self.values.get(index).copied()
    }

    pub fn get_by_name(&self, name: &str) -> Option<f32> {
        feature_index(name).and_then(|i| self.get(i))
    }

    pub fn validate(&self) -> Result<(), LayoutMismatchError> {
        validate_layout(self.version, self.layout_hash)
    }

    /// `(name, value)` pairs in layout order
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f32)> + '_ {
        URL_FEATURE_LAYOUT.iter().copied().zip(self.values.iter().copied())
    }

    /// JSON form for debug logging
    pub fn to_log_entry(&self) -> serde_json::Value {
        serde_json::json!({
            "feature_version": self.version,
            "layout_hash": self.layout_hash,
            "named_values": self
                .named()
                .map(|(name, value)| (name.to_string(), serde_json::json!(value)))
                .collect::<serde_json::Map<_, _>>(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_values_is_current_layout() {
        let vector = FeatureVector::from_values([0.0; URL_FEATURE_COUNT]);
        assert_eq!(vector.version, URL_FEATURE_VERSION);
        assert!(vector.validate().is_ok());
    }

    #[test]
    fn test_get_by_name() {
        let mut values = [0.0; URL_FEATURE_COUNT];
        values[6] = 1.0;
        let vector = FeatureVector::from_values(values);

        assert_eq!(vector.get_by_name("isHttps"), Some(1.0));
        assert_eq!(vector.get_by_name("urlLength"), Some(0.0));
        assert_eq!(vector.get_by_name("nope"), None);
    }

    #[test]
    fn test_stale_vector_fails_validation() {
        let mut vector = FeatureVector::from_values([0.0; URL_FEATURE_COUNT]);
        vector.version = 0;
        assert!(vector.validate().is_err());
    }

    #[test]
    fn test_to_log_entry() {
        let vector = FeatureVector::from_values([2.0; URL_FEATURE_COUNT]);
        let log = vector.to_log_entry();
        assert_eq!(log["feature_version"], URL_FEATURE_VERSION);
        assert_eq!(log["named_values"]["tokenCount"], 2.0);
    }
}
