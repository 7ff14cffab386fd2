//! Script obfuscation patterns
//!
//! Each pattern triggers when its match count in the concatenated script
//! text exceeds `max_occurrences` (0 = any occurrence).

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Pattern as it appears in configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptPattern {
    pub name: String,
    /// Regular expression (`regex` crate syntax)
    pub pattern: String,
    #[serde(default)]
    pub max_occurrences: usize,
    /// Reason text reported when the pattern triggers
    #[serde(default)]
    pub description: String,
}

impl ScriptPattern {
    fn new(name: &str, pattern: &str, max_occurrences: usize, description: &str) -> Self {
        Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
            max_occurrences,
            description: description.to_string(),
        }
    }
}

pub fn default_script_patterns() -> Vec<ScriptPattern> {
    vec![
        ScriptPattern::new("eval", r"\beval\s*\(", 0, "Use of eval() detected in inline JavaScript"),
        ScriptPattern::new(
            "document_write",
            r"\bdocument\.write(?:ln)?\s*\(",
            0,
            "Use of document.write() detected in script",
        ),
        ScriptPattern::new(
            "function_constructor",
            r"\bnew\s+Function\s*\(",
            0,
            "Dynamic code construction with new Function()",
        ),
        ScriptPattern::new("base64_decode", r"\batob\s*\(", 0, "Base64 decoding with atob()"),
        ScriptPattern::new("base64_encode", r"\bbtoa\s*\(", 0, "Base64 encoding with btoa()"),
        ScriptPattern::new(
            "timer_string_injection",
            r#"\bset(?:Timeout|Interval)\s*\(\s*["'`]"#,
            0,
            "Timer called with a code string",
        ),
        ScriptPattern::new(
            "char_code_building",
            r"\bString\.fromCharCode\s*\(",
            2,
            "Repeated String.fromCharCode() string building",
        ),
        ScriptPattern::new(
            "script_tag_regex",
            r#"(?i)(?:RegExp\s*\(\s*["'`]|/)\s*<\\?/?\s*script"#,
            0,
            "Regular expression targeting <script> tags",
        ),
        ScriptPattern::new(
            "string_concatenation",
            r#"["']\s*\+\s*["']"#,
            20,
            "Excessive string concatenation",
        ),
    ]
}

/// Pattern compiled once at scorer construction
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub name: String,
    pub description: String,
    pub max_occurrences: usize,
    regex: Regex,
}

impl CompiledPattern {
    pub fn compile(pattern: &ScriptPattern) -> Result<Self, ConfigError> {
        let regex = Regex::new(&pattern.pattern).map_err(|source| ConfigError::InvalidPattern {
            name: pattern.name.clone(),
            source,
        })?;

        let description = if pattern.description.is_empty() {
            format!("Suspicious script pattern: {}", pattern.name)
        } else {
            pattern.description.clone()
        };

        Ok(Self {
            name: pattern.name.clone(),
            description,
            max_occurrences: pattern.max_occurrences,
            regex,
        })
    }

    pub fn occurrences(&self, text: &str) -> usize {
        self.regex.find_iter(text).count()
    }

    pub fn triggers(&self, text: &str) -> bool {
        self.occurrences(text) > self.max_occurrences
    }
}

pub fn compile_all(patterns: &[ScriptPattern]) -> Result<Vec<CompiledPattern>, ConfigError> {
    patterns.iter().map(CompiledPattern::compile).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compiled(name: &str) -> CompiledPattern {
        let pattern = default_script_patterns()
            .into_iter()
            .find(|p| p.name == name)
            .unwrap();
        CompiledPattern::compile(&pattern).unwrap()
    }

    #[test]
    fn test_defaults_compile() {
        let patterns = compile_all(&default_script_patterns()).unwrap();
        assert_eq!(patterns.len(), default_script_patterns().len());
    }

    #[test]
    fn test_presence_patterns() {
        assert!(compiled("eval").triggers("var x = eval ('1+1');"));
        assert!(!compiled("eval").triggers("var medieval = 1;"));
        assert!(compiled("document_write").triggers("document.writeln('<p>')"));
        assert!(compiled("function_constructor").triggers("new Function('return 1')()"));
        assert!(compiled("base64_decode").triggers("var s = atob(payload);"));
        assert!(compiled("timer_string_injection").triggers("setTimeout(\"go()\", 10)"));
        assert!(!compiled("timer_string_injection").triggers("setTimeout(go, 10)"));
        assert!(compiled("script_tag_regex").triggers(r"html.replace(/<script[^>]*>/g, '')"));
        assert!(compiled("script_tag_regex").triggers(r#"new RegExp("<\/script>")"#));
    }

    #[test]
    fn test_count_threshold() {
        let concat = compiled("string_concatenation");
        let twenty = "'a' + 'b';".repeat(20);
        let twenty_one = "'a' + 'b';".repeat(21);
        assert_eq!(concat.occurrences(&twenty), 20);
        assert!(!concat.triggers(&twenty));
        assert!(concat.triggers(&twenty_one));
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let bad = ScriptPattern::new("broken", r"(unclosed", 0, "");
        let err = CompiledPattern::compile(&bad).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { ref name, .. } if name == "broken"));
    }

    #[test]
    fn test_missing_description_gets_default() {
        let p = CompiledPattern::compile(&ScriptPattern::new("x", "x", 0, "")).unwrap();
        assert_eq!(p.description, "Suspicious script pattern: x");
    }
}
