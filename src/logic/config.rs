//! Detector Configuration
//!
//! Thresholds, fixed model parameters and lookup tables for the whole
//! decision pipeline. Loaded once at start-up (defaults or a JSON file)
//! and read-only afterwards.

use serde::{Deserialize, Serialize};

use crate::config::ServerConfig;
use crate::constants::{DEFAULT_CLASSIFIER_TIMEOUT_MS, DEFAULT_MODEL_PATH};
use crate::error::ConfigError;

use super::content::aggregate::ContentAggregation;
use super::content::patterns::{default_script_patterns, ScriptPattern};

// ============================================================================
// TOP-LEVEL CONFIG
// ============================================================================

/// Everything the pipeline needs, in one serde-loadable struct.
///
/// Every section falls back to its default, so a config file only has to
/// name what it overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectorConfig {
    pub thresholds: SignalThresholds,
    pub stacking: StackingParameters,
    pub content_model: ContentAggregation,
    pub scorer: ScorerOptions,
    pub tables: DetectorTables,
    pub classifier: ClassifierConfig,
}

impl DetectorConfig {
    /// Parse a JSON document (partial documents allowed)
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: DetectorConfig = serde_json::from_str(json)?;
        Ok(config.normalized())
    }

    /// Load from a JSON file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        log::info!("Detector config loaded from {}", path);
        Ok(config)
    }

    /// Environment settings win over the file
    pub fn with_server_overrides(mut self, server: &ServerConfig) -> Self {
        if let Some(path) = &server.model_path {
            self.classifier.model_path = path.clone();
        }
        if let Some(sha) = &server.model_sha256 {
            self.classifier.model_sha256 = Some(sha.clone());
        }
        if let Some(timeout) = server.classifier_timeout_ms {
            self.classifier.timeout_ms = timeout;
        }
        self
    }

    fn normalized(mut self) -> Self {
        self.tables = self.tables.normalized();
        self
    }
}

// ============================================================================
// THRESHOLDS & PARAMETERS
// ============================================================================

/// Per-signal decision thresholds (`score > threshold` means phishing)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SignalThresholds {
    pub url: f64,
    pub content: f64,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            url: 0.5,
            content: 0.5,
        }
    }
}

/// Stacking combiner: logistic regression over `[url_score, content_score]`.
///
/// Fitted offline, never updated at runtime.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StackingParameters {
    /// `[w_url, w_content]`
    pub weights: [f64; 2],
    pub bias: f64,
    pub threshold: f64,
}

/// Parameter set shipped with the browser extension build
pub const STACKING_WEIGHTS: [f64; 2] = [5.6314, 4.6967];
pub const STACKING_BIAS: f64 = -3.2016;
pub const STACKING_THRESHOLD: f64 = 0.4766;

impl Default for StackingParameters {
    fn default() -> Self {
        Self {
            weights: STACKING_WEIGHTS,
            bias: STACKING_BIAS,
            threshold: STACKING_THRESHOLD,
        }
    }
}

/// Optional outputs of the page scorer. Never affect the score.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScorerOptions {
    pub include_reasons: bool,
    pub include_features: bool,
}

impl ScorerOptions {
    pub fn verbose() -> Self {
        Self {
            include_reasons: true,
            include_features: true,
        }
    }
}

/// URL classifier (ONNX) settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassifierConfig {
    pub model_path: String,
    /// Hex SHA-256 of the model file; verified before loading when set
    pub model_sha256: Option<String>,
    /// Default bound on one classifier call
    pub timeout_ms: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_path: DEFAULT_MODEL_PATH.to_string(),
            model_sha256: None,
            timeout_ms: DEFAULT_CLASSIFIER_TIMEOUT_MS,
        }
    }
}

// ============================================================================
// LOOKUP TABLES
// ============================================================================

/// Read-only keyword / domain tables used by the extractor and the scorer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectorTables {
    /// URL shortening services (exact host or parent domain)
    pub shorteners: Vec<String>,
    /// Phishing keywords looked for anywhere in the URL
    pub suspicious_words: Vec<String>,
    /// TLDs abused by free registrars (matched with `ends_with`)
    pub uncommon_tlds: Vec<String>,
    /// Brand names commonly impersonated
    pub brands: Vec<String>,
    /// Public suffixes used to find the registrable domain
    pub public_suffixes: Vec<String>,
    /// Keywords in a form action that point at credential harvesting
    pub credential_keywords: Vec<String>,
    /// Call-to-action link texts that say nothing about the target
    pub vague_link_texts: Vec<String>,
    /// Image hosts a logo may legitimately come from; `*.` prefix = any subdomain
    pub cdn_allowlist: Vec<String>,
    /// Obfuscation patterns scanned in inline scripts
    pub script_patterns: Vec<ScriptPattern>,
    /// Input count above which a page is flagged
    pub max_input_fields: usize,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn lowered(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl DetectorTables {
    /// Lower-case and trim every entry; empty entries are dropped
    pub fn normalized(self) -> Self {
        Self {
            shorteners: lowered(self.shorteners),
            suspicious_words: lowered(self.suspicious_words),
            uncommon_tlds: lowered(self.uncommon_tlds),
            brands: lowered(self.brands),
            public_suffixes: lowered(self.public_suffixes),
            credential_keywords: lowered(self.credential_keywords),
            vague_link_texts: lowered(self.vague_link_texts),
            cdn_allowlist: lowered(self.cdn_allowlist),
            script_patterns: self.script_patterns,
            max_input_fields: self.max_input_fields,
        }
    }
}

impl Default for DetectorTables {
    fn default() -> Self {
        Self {
            shorteners: strings(&[
                "bit.ly", "tinyurl.com", "goo.gl", "ow.ly", "t.co", "is.gd", "bitly.com",
                "vzturl.com", "qr.net", "1url.com", "tweez.me", "v.gd", "tr.im",
                "link.zip.net", "filoops.info",
            ]),
            suspicious_words: strings(&[
                "login", "verify", "account", "password", "bank", "secure", "free", "lucky",
                "service", "bonus", "ebayisapi", "webscr", "paypal", "signin", "update",
            ]),
            uncommon_tlds: strings(&[".tk", ".ml", ".ga", ".cf", ".gq"]),
            brands: strings(&[
                "paypal", "visa", "mastercard", "stripe", "square", "bankofamerica", "google",
                "gmail", "youtube", "android", "chrome", "facebook", "instagram", "whatsapp",
                "meta", "apple", "icloud", "mac", "itunes", "amazon", "aws", "microsoft",
                "office365", "outlook", "live", "onedrive", "windows", "github", "gitlab",
                "bitbucket", "dropbox", "twitter", "x.com", "tiktok", "snapchat", "linkedin",
                "slack", "zoom", "netflix", "hulu", "disney", "spotify", "steam", "epicgames",
                "ebay", "etsy", "shopify", "alibaba", "yahoo", "proton", "adobe",
            ]),
            public_suffixes: strings(&[
                // Multi-label suffixes
                "co.uk", "org.uk", "ac.uk", "gov.uk", "me.uk", "net.uk", "ltd.uk", "plc.uk",
                "com.au", "net.au", "org.au", "edu.au", "gov.au",
                "co.nz", "org.nz", "co.jp", "ne.jp", "or.jp", "ac.jp",
                "co.in", "net.in", "org.in", "co.za", "org.za", "co.kr", "or.kr",
                "com.br", "net.br", "org.br", "com.cn", "net.cn", "org.cn",
                "com.mx", "com.tr", "com.sg", "com.hk", "com.tw", "com.ar", "com.co",
                "com.pl", "com.ua", "com.vn", "com.my", "com.ph", "com.pk", "com.ng",
                "co.id", "co.il", "co.th",
                // Single-label suffixes
                "com", "org", "net", "edu", "gov", "mil", "int", "info", "biz", "io", "co",
                "me", "app", "dev", "xyz", "online", "site", "top", "club", "shop", "store",
                "uk", "us", "ca", "de", "fr", "it", "es", "nl", "be", "ch", "at", "se",
                "no", "dk", "fi", "pl", "cz", "ru", "ua", "tr", "gr", "pt", "ie", "jp",
                "cn", "kr", "in", "au", "nz", "br", "mx", "ar", "za", "sg", "hk", "tw",
                "vn", "id", "my", "ph", "th", "il", "ir", "eu", "tv", "cc", "ws",
                "tk", "ml", "ga", "cf", "gq",
            ]),
            credential_keywords: strings(&["login", "auth", "secure", "verify", "bank", "account"]),
            vague_link_texts: strings(&[
                "click here", "login", "log in", "sign in", "verify", "update", "go", "submit",
                "continue",
            ]),
            cdn_allowlist: strings(&[
                "*.amazonaws.com", "*.cloudfront.net", "*.akamaihd.net", "*.akamaized.net",
                "*.fastly.net", "*.azureedge.net", "*.googleusercontent.com", "*.gstatic.com",
                "*.ggpht.com", "cdnjs.cloudflare.com", "cdn.jsdelivr.net", "unpkg.com",
                "*.wp.com", "*.shopify.com", "*.squarespace-cdn.com", "*.wixstatic.com",
            ]),
            script_patterns: default_script_patterns(),
            max_input_fields: 10,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
