//! Page Sub-Detectors
//!
//! Six independent heuristics, each returning a score in [0, 1].
//! Elements that cannot be interpreted (malformed URLs, hostless targets)
//! are skipped; they never fail the detector.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::error::{PipelineError, PipelineResult};
use crate::logic::config::DetectorTables;
use crate::logic::url_features::host::{
    base_domain, hostname, is_ipv4, is_same_or_subdomain, parse_with_fallback, strip_www,
};

use super::patterns::CompiledPattern;
use super::snapshot::{AnchorElement, FormElement, ImageElement, InputElement, ScriptElement};

static DOMAIN_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[a-z0-9.-]+\.[a-z]{2,}\b").expect("static regex"));

static LOGO: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)logo").expect("static regex"));

const CROSS_DOMAIN_FORM: f64 = 0.6;
const SIBLING_SUBDOMAIN_FORM: f64 = 0.2;
const CREDENTIAL_KEYWORD_FORM: f64 = 0.2;

// ============================================================================
// RESULT + CONTEXT
// ============================================================================

/// Output of one sub-detector
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubDetectorResult {
    pub score: f64,
    pub reasons: Vec<String>,
}

/// Reason collector that is a no-op unless reasons were requested
struct Reasons {
    enabled: bool,
    items: Vec<String>,
}

impl Reasons {
    fn new(enabled: bool) -> Self {
        Self {
            enabled,
            items: Vec::new(),
        }
    }

    fn push(&mut self, reason: impl FnOnce() -> String) {
        if self.enabled {
            self.items.push(reason());
        }
    }

    fn finish(self, score: f64) -> SubDetectorResult {
        SubDetectorResult {
            score,
            reasons: self.items,
        }
    }
}

/// The page being scored, parsed once
#[derive(Debug, Clone)]
pub struct PageContext {
    pub url: Url,
    /// Lower-cased hostname as served
    pub full_host: String,
    /// Hostname without a leading `www.`
    pub host: String,
}

impl PageContext {
    pub fn parse(page_url: &str) -> PipelineResult<Self> {
        let url = parse_with_fallback(page_url).map_err(|e| {
            PipelineError::StructureAccess(format!("page URL is not usable: {}", e))
        })?;
        let full_host = hostname(&url);
        let host = strip_www(&full_host).to_string();
        Ok(Self {
            url,
            full_host,
            host,
        })
    }

    pub fn is_https(&self) -> bool {
        self.url.scheme() == "https"
    }

    /// Resolve a (possibly relative) reference against the page
    fn resolve(&self, reference: &str) -> Option<Url> {
        match self.url.join(reference) {
            Ok(url) => Some(url),
            Err(e) => {
                log::debug!("Skipping unresolvable reference '{}': {}", reference, e);
                None
            }
        }
    }
}

fn ratio(count: usize, total: usize) -> f64 {
    (count as f64 / total.max(1) as f64).min(1.0)
}

// ============================================================================
// 1. SUSPICIOUS FORMS
// ============================================================================

/// Form actions posting off-site, to a sibling subdomain, or to a
/// credential-looking endpoint. Contributions add up per form, capped at 1.
pub fn suspicious_forms(
    page: &PageContext,
    forms: &[FormElement],
    tables: &DetectorTables,
    collect_reasons: bool,
) -> SubDetectorResult {
    let mut reasons = Reasons::new(collect_reasons);
    let mut score = 0.0;

    for form in forms {
        let Some(action) = form.action.as_deref().map(str::trim).filter(|a| !a.is_empty()) else {
            continue;
        };
        let Some(action_url) = page.resolve(action) else {
            continue;
        };

        let action_full_host = hostname(&action_url);
        if action_full_host.is_empty() {
            continue;
        }
        let action_host = strip_www(&action_full_host);

        let cross_domain = action_host != page.host;
        let sibling_subdomain =
            action_host != page.host && base_domain(action_host) == base_domain(&page.host);
        let href = action_url.as_str().to_lowercase();
        let credential_keyword = tables
            .credential_keywords
            .iter()
            .any(|k| href.contains(k.as_str()));

        if cross_domain {
            score += CROSS_DOMAIN_FORM;
            reasons.push(|| format!("Form action points to different domain: {}", action_host));
        }
        if sibling_subdomain {
            score += SIBLING_SUBDOMAIN_FORM;
            reasons.push(|| format!("Suspicious subdomain in form action: {}", action_host));
        }
        if credential_keyword {
            score += CREDENTIAL_KEYWORD_FORM;
            reasons.push(|| "Form action contains phishing-related keyword(s)".to_string());
        }
    }

    reasons.finish(f64::min(score, 1.0))
}

// ============================================================================
// 2. MISMATCHED LINK TEXT
// ============================================================================

/// Links whose visible text lies about, or hides, where they go.
/// Each link counts at most once (first matching rule). Anchors without an
/// `href` attribute are not links and stay out of the denominator.
pub fn mismatched_link_text(
    page: &PageContext,
    links: &[AnchorElement],
    tables: &DetectorTables,
    collect_reasons: bool,
) -> SubDetectorResult {
    let mut reasons = Reasons::new(collect_reasons);
    let mut suspicious = 0usize;
    let mut total = 0usize;

    for link in links.iter().filter(|l| l.href.is_some()) {
        total += 1;
        let text = link.text.trim().to_lowercase();
        let href = link
            .href
            .as_deref()
            .map(|h| h.trim().to_lowercase())
            .unwrap_or_default();
        if text.is_empty() || href.is_empty() {
            continue;
        }
        let Some(href_url) = page.resolve(&href) else {
            continue;
        };
        let href_host = hostname(&href_url);

        // Visible domain differs from the real target
        if let Some(shown) = DOMAIN_TOKEN.find(&text) {
            if !href.contains(shown.as_str()) && !text.contains('<') {
                suspicious += 1;
                reasons.push(|| format!("Domain mismatch: text \"{}\" vs href \"{}\"", text, href));
                continue;
            }
        }

        // "Click here" style text leaving the site
        if href_host != page.full_host && tables.vague_link_texts.iter().any(|v| *v == text) {
            suspicious += 1;
            reasons.push(|| {
                format!("Vague CTA \"{}\" points to external domain \"{}\"", text, href_host)
            });
            continue;
        }

        if tables.shorteners.iter().any(|s| *s == href_host) {
            suspicious += 1;
            reasons.push(|| format!("Shortened URL detected: \"{}\"", href_host));
            continue;
        }

        if is_ipv4(&href_host) {
            suspicious += 1;
            reasons.push(|| format!("Link uses IP address instead of domain: \"{}\"", href_host));
        }
    }

    reasons.finish(ratio(suspicious, total))
}

// ============================================================================
// 3. EXTERNAL LOGOS
// ============================================================================

/// Logo images pulled from a foreign host that is not a known CDN
pub fn external_logos(
    page: &PageContext,
    images: &[ImageElement],
    tables: &DetectorTables,
    collect_reasons: bool,
) -> SubDetectorResult {
    let mut reasons = Reasons::new(collect_reasons);

    let is_logo = |img: &&ImageElement| {
        img.src.as_deref().map_or(false, |s| LOGO.is_match(s))
            || img.alt.as_deref().map_or(false, |a| LOGO.is_match(a))
    };
    let logos: Vec<&ImageElement> = images.iter().filter(is_logo).collect();
    if logos.is_empty() {
        return reasons.finish(0.0);
    }

    let mut flagged = 0usize;
    for img in &logos {
        let Some(src) = img.src.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            continue;
        };
        let Some(src_url) = page.resolve(src) else {
            continue;
        };
        let full_host = hostname(&src_url);
        let img_host = strip_www(&full_host);

        // data: URIs and other hostless sources are inline
        if img_host.is_empty() || img_host == page.host || is_allowed_cdn(img_host, tables) {
            continue;
        }

        flagged += 1;
        reasons.push(|| format!("Logo image loaded from different domain: {}", img_host));
    }

    reasons.finish(ratio(flagged, logos.len()))
}

/// Exact entry, or `*.domain` matching the domain and any subdomain
fn is_allowed_cdn(host: &str, tables: &DetectorTables) -> bool {
    tables.cdn_allowlist.iter().any(|entry| match entry.strip_prefix("*.") {
        Some(domain) => is_same_or_subdomain(host, domain),
        None => host == entry,
    })
}

// ============================================================================
// 4. PASSWORD FIELD WITHOUT HTTPS
// ============================================================================

/// Binary: any password input on a non-https page
pub fn password_without_https(
    page: &PageContext,
    inputs: &[InputElement],
    collect_reasons: bool,
) -> SubDetectorResult {
    let mut reasons = Reasons::new(collect_reasons);

    if !page.is_https() && inputs.iter().any(InputElement::is_password) {
        reasons.push(|| "Page contains password field but is not served over HTTPS".to_string());
        return reasons.finish(1.0);
    }

    reasons.finish(0.0)
}

// ============================================================================
// 5. OBFUSCATED SCRIPT
// ============================================================================

/// Triggered obfuscation patterns over all inline script text, normalized
/// by the number of script elements
pub fn obfuscated_script(
    scripts: &[ScriptElement],
    patterns: &[CompiledPattern],
    collect_reasons: bool,
) -> SubDetectorResult {
    let mut reasons = Reasons::new(collect_reasons);

    let text = scripts
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    let mut triggered = 0usize;
    for pattern in patterns {
        if pattern.triggers(&text) {
            triggered += 1;
            reasons.push(|| pattern.description.clone());
        }
    }

    reasons.finish(ratio(triggered, scripts.len()))
}

// ============================================================================
// 6. EXCESS INPUT FIELDS
// ============================================================================

/// Binary: more inputs than a normal login page needs
pub fn excess_input_fields(
    inputs: &[InputElement],
    max_inputs: usize,
    collect_reasons: bool,
) -> SubDetectorResult {
    let mut reasons = Reasons::new(collect_reasons);

    if inputs.len() > max_inputs {
        reasons.push(|| format!("Page contains unusually many input fields ({})", inputs.len()));
        return reasons.finish(1.0);
    }

    reasons.finish(0.0)
}

// ============================================================================
// TESTS
// ============================================================================
