//! URL Feature Layout - Centralized Feature Definition
//!
//! **This file controls the classifier input schema.**
//!
//! The URL model was trained on vectors in exactly this order. Adding,
//! removing or reordering a feature means a new `URL_FEATURE_VERSION`
//! and a retrained model.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
pub const URL_FEATURE_VERSION: u8 = 1;

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

/// Feature names in the order they appear in the vector
pub const URL_FEATURE_LAYOUT: &[&str] = &[
    "urlLength",            // 0
    "subdomainLength",      // 1
    "mainDomainLength",     // 2
    "dotCount",             // 3: hostname only
    "hyphenCount",          // 4: hostname only
    "pathLength",           // 5
    "isHttps",              // 6
    "queryLength",          // 7
    "hasRedirection",       // 8
    "urlPathDepth",         // 9
    "digitCount",           // 10
    "tokenCount",           // 11
    "encodedCharCount",     // 12
    "hasShorteningService", // 13
    "hasIpAddress",         // 14
    "subdomainCount",       // 15
    "uncommonTld",          // 16
    "hasSuspiciousWords",   // 17
    "containsBrandName",    // 18
];

/// Total number of features
/// Must match URL_FEATURE_LAYOUT.len()
pub const URL_FEATURE_COUNT: usize = 19;

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// CRC32 over the version byte and the ordered feature names
pub fn layout_hash() -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&[URL_FEATURE_VERSION]);

    for name in URL_FEATURE_LAYOUT {
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
    }

    hasher.finalize()
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Layout description, served to clients that build vectors themselves
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: URL_FEATURE_VERSION,
            hash: layout_hash(),
            feature_count: URL_FEATURE_COUNT,
            feature_names: URL_FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect(),
        }
    }
}

// ============================================================================
// LAYOUT VALIDATION
// ============================================================================

/// Vector produced under a different layout than the running one
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error(
    "URL feature layout mismatch: expected v{expected_version} (hash {expected_hash:08x}), got v{actual_version} (hash {actual_hash:08x})"
)]
pub struct LayoutMismatchError {
    pub expected_version: u8,
    pub expected_hash: u32,
    pub actual_version: u8,
    pub actual_hash: u32,
}

pub fn validate_layout(version: u8, hash: u32) -> Result<(), LayoutMismatchError> {
    let current_hash = layout_hash();

    if version != URL_FEATURE_VERSION || hash != current_hash {
        return Err(LayoutMismatchError {
            expected_version: URL_FEATURE_VERSION,
            expected_hash: current_hash,
            actual_version: version,
            actual_hash: hash,
        });
    }

    Ok(())
}

/// Get feature index by name
pub fn feature_index(name: &str) -> Option<usize> {
    URL_FEATURE_LAYOUT.iter().position(|&n| n == name)
}
