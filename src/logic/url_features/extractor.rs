//! URL Feature Extractor
//!
//! Turns a raw URL string into the 19-float vector the URL classifier was
//! trained on. Pure function of the input and the (read-only) tables.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::PipelineResult;
use crate::logic::config::DetectorTables;

use super::host::{hostname, is_ipv4, is_same_or_subdomain, parse_with_fallback};
use super::layout::URL_FEATURE_COUNT;
use super::vector::FeatureVector;

/// Separators for `tokenCount`
const TOKEN_SEPARATORS: &[char] = &['/', '-', '.', '=', '?', '&', '%', '_', '@'];

pub struct UrlFeatureExtractor {
    tables: Arc<DetectorTables>,
    public_suffixes: HashSet<String>,
}

impl UrlFeatureExtractor {
    pub fn new(tables: Arc<DetectorTables>) -> Self {
        let public_suffixes = tables.public_suffixes.iter().cloned().collect();
        Self {
            tables,
            public_suffixes,
        }
    }

    /// Extract the full vector, in `URL_FEATURE_LAYOUT` order.
    ///
    /// Fails with `InvalidUrl` when the string is not a URL even after the
    /// `http://` fallback.
    pub fn extract_all_features(&self, raw: &str) -> PipelineResult<FeatureVector> {
        let url = parse_with_fallback(raw)?;
        let host = hostname(&url);
        let is_ip = is_ipv4(&host);
        let raw_lower = raw.to_lowercase();

        let path = url.path();
        let query_length = match url.query() {
            Some(q) if !q.is_empty() => q.chars().count() + 1,
            _ => 0,
        };

        let labels = host_labels(&host);

        let values: [f32; URL_FEATURE_COUNT] = [
            raw.chars().count() as f32,
            if is_ip { 0.0 } else { subdomain_length(&host) as f32 },
            if is_ip { 0.0 } else { self.main_domain_length(&labels) as f32 },
            count_char(&host, '.') as f32,
            count_char(&host, '-') as f32,
            path.chars().count() as f32,
            flag(url.scheme() == "https"),
            query_length as f32,
            flag(has_redirection(raw)),
            path.split('/').filter(|s| !s.is_empty()).count() as f32,
            raw.chars().filter(|c| c.is_ascii_digit()).count() as f32,
            raw.split(TOKEN_SEPARATORS).filter(|t| !t.is_empty()).count() as f32,
            count_char(raw, '%') as f32,
            flag(self.is_shortener(&host)),
            flag(is_ip),
            if is_ip { 0.0 } else { host.split('.').count().saturating_sub(2) as f32 },
            flag(self.tables.uncommon_tlds.iter().any(|tld| host.ends_with(tld.as_str()))),
            flag(self.tables.suspicious_words.iter().any(|w| raw_lower.contains(w.as_str()))),
            flag(self.tables.brands.iter().any(|b| raw_lower.contains(b.as_str()))),
        ];

        Ok(FeatureVector::from_values(values))
    }

    fn is_shortener(&self, host: &str) -> bool {
        self.tables
            .shorteners
            .iter()
            .any(|service| is_same_or_subdomain(host, service))
    }

    /// Length of the label left of the longest matching public suffix.
    ///
    /// Scanning starts at the leftmost split so `co.uk` is tried before `uk`.
    fn main_domain_length(&self, labels: &[&str]) -> usize {
        for i in 1..labels.len() {
            let suffix = labels[i..].join(".");
            if self.public_suffixes.contains(&suffix) {
                return labels[i - 1].len();
            }
        }

        match labels.len() {
            0 => 0,
            1 => labels[0].len(),
            n => labels[n - 2].len(),
        }
    }
}

/// Hostname labels with a leading `www` removed
fn host_labels(host: &str) -> Vec<&str> {
    let mut labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    if labels.first() == Some(&"www") {
        labels.remove(0);
    }
    labels
}

/// Sum of all label lengths except the last, leading `www` removed.
///
/// Empty labels are kept: a trailing-dot FQDN ends in an empty last label,
/// so every named label counts.
fn subdomain_length(host: &str) -> usize {
    let mut labels: Vec<&str> = host.split('.').collect();
    if labels.first() == Some(&"www") {
        labels.remove(0);
    }
    match labels.split_last() {
        Some((_, rest)) => rest.iter().map(|l| l.len()).sum(),
        None => 0,
    }
}

fn has_redirection(raw: &str) -> bool {
    let stripped = raw
        .strip_prefix("https://")
        .or_else(|| raw.strip_prefix("http://"))
        .unwrap_or(raw);
    stripped.contains("//")
}

fn count_char(s: &str, c: char) -> usize {
    s.chars().filter(|&ch| ch == c).count()
}

fn flag(value: bool) -> f32 {
    if value {
        1.0
    } else {
        0.0
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    fn extractor() -> UrlFeatureExtractor {
        UrlFeatureExtractor::new(Arc::new(DetectorTables::default()))
    }

    fn feature(url: &str, name: &str) -> f32 {
        extractor()
            .extract_all_features(url)
            .unwrap()
            .get_by_name(name)
            .unwrap()
    }

    #[test]
    fn test_url_length_is_raw_length() {
        for url in [
            "http://a.com",
            "example.com/path?x=1",
            "https://sub.domain.example.co.uk/a/b/c?q=%20&r=2#frag",
        ] {
            assert_eq!(feature(url, "urlLength"), url.chars().count() as f32);
        }
    }

    #[test]
    fn test_dots_and_hyphens_count_hostname_only() {
        let url = "http://my-site.example.com/a.b-c/d.e?x=a-b.c";
        assert_eq!(feature(url, "dotCount"), 2.0);
        assert_eq!(feature(url, "hyphenCount"), 1.0);
    }

    #[test]
    fn test_main_domain_skips_multi_label_suffix() {
        assert_eq!(feature("http://www.example.co.uk/x", "mainDomainLength"), 7.0);
        assert_eq!(feature("https://login.paypal.com", "mainDomainLength"), 6.0);
        // Unknown TLD falls back to the second-to-last label
        assert_eq!(feature("http://foo.barbaz.unknowntld", "mainDomainLength"), 6.0);
    }

    #[test]
    fn test_ip_host_zeroes_subdomain_features() {
        let vector = extractor().extract_all_features("http://1.2.3.4/path").unwrap();
        assert_eq!(vector.get_by_name("hasIpAddress"), Some(1.0));
        assert_eq!(vector.get_by_name("subdomainCount"), Some(0.0));
        assert_eq!(vector.get_by_name("subdomainLength"), Some(0.0));
        assert_eq!(vector.get_by_name("mainDomainLength"), Some(0.0));
    }

    #[test]
    fn test_subdomain_features() {
        // www stripped, TLD excluded: "secure" + "login" + "example"
        let url = "http://www.secure.login.example.com/";
        assert_eq!(feature(url, "subdomainLength"), 18.0);
        // Count uses all labels, www included
        assert_eq!(feature(url, "subdomainCount"), 3.0);
        assert_eq!(feature("http://example.com", "subdomainCount"), 0.0);
    }

    #[test]
    fn test_trailing_dot_host_keeps_empty_label() {
        let vector = extractor().extract_all_features("http://example.com./").unwrap();
        // "example" + "com", the empty last label is the one dropped
        assert_eq!(vector.get_by_name("subdomainLength"), Some(10.0));
        assert_eq!(vector.get_by_name("subdomainCount"), Some(1.0));
        assert_eq!(vector.get_by_name("dotCount"), Some(2.0));

        assert_eq!(feature("http://www.example.com", "subdomainLength"), 7.0);
    }

    #[test]
    fn test_path_and_query() {
        let url = "https://example.com/a/b//c?x=1&y=2";
        assert_eq!(feature(url, "pathLength"), 7.0);
        assert_eq!(feature(url, "urlPathDepth"), 3.0);
        assert_eq!(feature(url, "queryLength"), 8.0);
        assert_eq!(feature(url, "isHttps"), 1.0);

        assert_eq!(feature("example.com", "pathLength"), 1.0);
        assert_eq!(feature("example.com", "queryLength"), 0.0);
        assert_eq!(feature("example.com", "isHttps"), 0.0);
    }

    #[test]
    fn test_redirection() {
        assert_eq!(feature("http://example.com//evil.com", "hasRedirection"), 1.0);
        assert_eq!(feature("https://example.com/a/b", "hasRedirection"), 0.0);
        assert_eq!(
            feature("https://example.com/r?u=http://evil.com", "hasRedirection"),
            1.0
        );
    }

    #[test]
    fn test_lexical_counts() {
        let url = "http://ex-1.com/a_b@c%20d=2";
        assert_eq!(feature(url, "digitCount"), 4.0);
        assert_eq!(feature(url, "encodedCharCount"), 1.0);
        // http: | ex | 1 | com | a | b | c | 20d | 2
        assert_eq!(feature(url, "tokenCount"), 9.0);
    }

    #[test]
    fn test_table_lookups() {
        assert_eq!(feature("https://bit.ly/abc", "hasShorteningService"), 1.0);
        assert_eq!(feature("https://x.bit.ly/abc", "hasShorteningService"), 1.0);
        assert_eq!(feature("https://rabbit.ly/abc", "hasShorteningService"), 0.0);

        assert_eq!(feature("http://free-prize.tk", "uncommonTld"), 1.0);
        assert_eq!(feature("http://example.com", "uncommonTld"), 0.0);

        assert_eq!(feature("http://example.com/LOGIN", "hasSuspiciousWords"), 1.0);
        assert_eq!(feature("http://example.com/", "hasSuspiciousWords"), 0.0);

        assert_eq!(feature("http://PayPal-help.example", "containsBrandName"), 1.0);
        assert_eq!(feature("http://qqq.example", "containsBrandName"), 0.0);
    }

    #[test]
    fn test_hostname_comparisons_are_case_insensitive() {
        assert_eq!(feature("HTTP://BIT.LY/x", "hasShorteningService"), 1.0);
        assert_eq!(feature("http://EXAMPLE.TK", "uncommonTld"), 1.0);
    }

    #[test]
    fn test_invalid_url() {
        let err = extractor().extract_all_features("http://").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidUrl { .. }));
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let e = extractor();
        let url = "https://www.secure-paypal.com.verify.tk/login?id=123%20";
        let a = e.extract_all_features(url).unwrap();
        let b = e.extract_all_features(url).unwrap();
        assert_eq!(a, b);
        assert!(a.validate().is_ok());
    }
}
