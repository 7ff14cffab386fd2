//! Hostname helpers shared by the URL extractor and the page detectors.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::error::PipelineError;

static HTTP_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^https?://").expect("static regex"));

static IPV4_HOST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\d{1,3}\.){3}\d{1,3}$").expect("static regex"));

/// Parse a user-supplied URL, prepending `http://` when it carries no
/// http(s) scheme. Hostless results are rejected.
pub fn parse_with_fallback(raw: &str) -> Result<Url, PipelineError> {
    let candidate = if HTTP_SCHEME.is_match(raw) {
        raw.to_string()
    } else {
        format!("http://{}", raw)
    };

    let url = Url::parse(&candidate).map_err(|e| PipelineError::invalid_url(raw, e))?;

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(PipelineError::invalid_url(raw, "URL has no host")),
    }
}

/// Lower-cased hostname, empty if the URL has none
pub fn hostname(url: &Url) -> String {
    url.host_str().unwrap_or_default().to_ascii_lowercase()
}

pub fn is_ipv4(host: &str) -> bool {
    IPV4_HOST.is_match(host)
}

/// Drop one leading `www.`
pub fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Last two labels, e.g. `login.example.com` -> `example.com`
pub fn base_domain(host: &str) -> String {
    let labels: Vec<&str> = host.split('.').collect();
    let start = labels.len().saturating_sub(2);
    labels[start..].join(".")
}

/// Host equals `domain` or is one of its subdomains
pub fn is_same_or_subdomain(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .map_or(false, |prefix| prefix.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_fallback() {
        let url = parse_with_fallback("example.com/login").unwrap();
        assert_eq!(url.scheme(), "http");
        assert_eq!(url.host_str(), Some("example.com"));

        let url = parse_with_fallback("HTTPS://Example.COM/a").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(hostname(&url), "example.com");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_with_fallback("http://"),
            Err(PipelineError::InvalidUrl { .. })
        ));
        assert!(matches!(
            parse_with_fallback("http://exa mple.com"),
            Err(PipelineError::InvalidUrl { .. })
        ));
        assert!(parse_with_fallback("").is_err());
    }

    #[test]
    fn test_ipv4() {
        assert!(is_ipv4("1.2.3.4"));
        assert!(is_ipv4("192.168.100.254"));
        assert!(!is_ipv4("1.2.3"));
        assert!(!is_ipv4("example.com"));
        assert!(!is_ipv4("1.2.3.4.5"));
    }

    #[test]
    fn test_base_domain_and_www() {
        assert_eq!(base_domain("login.example.com"), "example.com");
        assert_eq!(base_domain("example.com"), "example.com");
        assert_eq!(base_domain("localhost"), "localhost");
        assert_eq!(strip_www("www.example.com"), "example.com");
        assert_eq!(strip_www("wwwexample.com"), "wwwexample.com");
    }

    #[test]
    fn test_same_or_subdomain() {
        assert!(is_same_or_subdomain("bit.ly", "bit.ly"));
        assert!(is_same_or_subdomain("my.bit.ly", "bit.ly"));
        assert!(!is_same_or_subdomain("notbit.ly", "bit.ly"));
        assert!(!is_same_or_subdomain("bit.ly.evil.com", "bit.ly"));
    }
}
