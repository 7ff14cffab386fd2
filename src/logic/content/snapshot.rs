//! Page Structure - read-only view of the page being scored
//!
//! `PageStructure` is what the scorer reads from. `PageSnapshot` is the
//! owned implementation: deserialized from a request, or built from raw
//! HTML with `scraper`.

use std::borrow::Cow;

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

// ============================================================================
// ELEMENTS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormElement {
    #[serde(default)]
    pub action: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnchorElement {
    #[serde(default)]
    pub href: Option<String>,
    /// Visible text content
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageElement {
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptElement {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputElement {
    #[serde(default = "default_input_type", rename = "type")]
    pub input_type: String,
}

fn default_input_type() -> String {
    "text".to_string()
}

impl InputElement {
    pub fn new(input_type: &str) -> Self {
        Self {
            input_type: input_type.to_string(),
        }
    }

    pub fn is_password(&self) -> bool {
        self.input_type.trim().eq_ignore_ascii_case("password")
    }
}

// ============================================================================
// ACCESSOR TRAIT
// ============================================================================

/// Read-only accessor for the structural elements of a page.
///
/// Implementations backed by a live document return `StructureAccess`
/// when the document is gone; `ensure_valid` is checked once more after
/// everything has been read.
pub trait PageStructure {
    fn page_url(&self) -> PipelineResult<Cow<'_, str>>;
    fn html_length(&self) -> PipelineResult<usize>;
    fn forms(&self) -> PipelineResult<Cow<'_, [FormElement]>>;
    fn links(&self) -> PipelineResult<Cow<'_, [AnchorElement]>>;
    fn images(&self) -> PipelineResult<Cow<'_, [ImageElement]>>;
    fn scripts(&self) -> PipelineResult<Cow<'_, [ScriptElement]>>;
    fn inputs(&self) -> PipelineResult<Cow<'_, [InputElement]>>;

    fn ensure_valid(&self) -> PipelineResult<()> {
        Ok(())
    }
}

// ============================================================================
// SNAPSHOT
// ============================================================================

/// Owned, immutable page snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    #[serde(default)]
    pub page_url: String,
    /// Raw serialized size of the document
    #[serde(default)]
    pub html_length: usize,
    #[serde(default)]
    pub forms: Vec<FormElement>,
    #[serde(default)]
    pub links: Vec<AnchorElement>,
    #[serde(default)]
    pub images: Vec<ImageElement>,
    #[serde(default)]
    pub scripts: Vec<ScriptElement>,
    #[serde(default)]
    pub inputs: Vec<InputElement>,
}

impl PageSnapshot {
    pub fn new(page_url: &str) -> Self {
        Self {
            page_url: page_url.to_string(),
            ..Default::default()
        }
    }

    /// Collect forms, links, images, scripts and inputs from raw HTML
    pub fn from_html(page_url: &str, html: &str) -> PipelineResult<Self> {
        let document = Html::parse_document(html);

        let forms = select(&document, "form")?
            .map(|el| FormElement {
                action: attr(&el, "action"),
            })
            .collect();

        let links = select(&document, "a[href]")?
            .map(|el| AnchorElement {
                href: attr(&el, "href"),
                text: el.text().collect::<String>().trim().to_string(),
            })
            .collect();

        let images = select(&document, "img")?
            .map(|el| ImageElement {
                src: attr(&el, "src"),
                alt: attr(&el, "alt"),
            })
            .collect();

        let scripts = select(&document, "script")?
            .map(|el| ScriptElement {
                text: el.text().collect(),
            })
            .collect();

        let inputs = select(&document, "input")?
            .map(|el| InputElement {
                input_type: attr(&el, "type").unwrap_or_else(default_input_type),
            })
            .collect();

        Ok(Self {
            page_url: page_url.to_string(),
            html_length: html.len(),
            forms,
            links,
            images,
            scripts,
            inputs,
        })
    }

    /// Fill in the page URL when the snapshot came without one
    pub fn with_default_url(mut self, page_url: &str) -> Self {
        if self.page_url.trim().is_empty() {
            self.page_url = page_url.to_string();
        }
        self
    }
}

fn select<'a>(
    document: &'a Html,
    css: &str,
) -> PipelineResult<impl Iterator<Item = ElementRef<'a>> + 'a> {
    let selector = Selector::parse(css)
        .map_err(|e| PipelineError::StructureAccess(format!("selector '{}': {:?}", css, e)))?;
    Ok(document.select(&selector).collect::<Vec<_>>().into_iter())
}

fn attr(el: &ElementRef<'_>, name: &str) -> Option<String> {
    el.value().attr(name).map(|v| v.to_string())
}

impl PageStructure for PageSnapshot {
    fn page_url(&self) -> PipelineResult<Cow<'_, str>> {
        Ok(Cow::Borrowed(&self.page_url))
    }

    fn html_length(&self) -> PipelineResult<usize> {
        Ok(self.html_length)
    }

    fn forms(&self) -> PipelineResult<Cow<'_, [FormElement]>> {
        Ok(Cow::Borrowed(&self.forms))
    }

    fn links(&self) -> PipelineResult<Cow<'_, [AnchorElement]>> {
        Ok(Cow::Borrowed(&self.links))
    }

    fn images(&self) -> PipelineResult<Cow<'_, [ImageElement]>> {
        Ok(Cow::Borrowed(&self.images))
    }

    fn scripts(&self) -> PipelineResult<Cow<'_, [ScriptElement]>> {
        Ok(Cow::Borrowed(&self.scripts))
    }

    fn inputs(&self) -> PipelineResult<Cow<'_, [InputElement]>> {
        Ok(Cow::Borrowed(&self.inputs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><head><script>var a = 1;</script></head>
        <body>
            <img src="/img/logo.png" alt="Company logo">
            <img src="https://cdn.example.net/banner.jpg">
            <form action="https://collect.evil.tk/login">
                <input type="email" name="user">
                <input type="password" name="pass">
                <input name="untyped">
            </form>
            <a href="https://bit.ly/x">  Click here </a>
            <a href="/about">About <b>us</b></a>
            <a name="no-href">anchor</a>
            <script>eval("x")</script>
        </body></html>
    "#;

    #[test]
    fn test_from_html_collects_elements() {
        let snapshot = PageSnapshot::from_html("http://example.com/", PAGE).unwrap();

        assert_eq!(snapshot.page_url, "http://example.com/");
        assert_eq!(snapshot.html_length, PAGE.len());
        assert_eq!(snapshot.forms.len(), 1);
        assert_eq!(
            snapshot.forms[0].action.as_deref(),
            Some("https://collect.evil.tk/login")
        );

        // Anchors without href are not links
        assert_eq!(snapshot.links.len(), 2);
        assert_eq!(snapshot.links[0].text, "Click here");
        assert_eq!(snapshot.links[1].text, "About us");

        assert_eq!(snapshot.images.len(), 2);
        assert_eq!(snapshot.images[0].alt.as_deref(), Some("Company logo"));
        assert_eq!(snapshot.images[1].alt, None);

        assert_eq!(snapshot.scripts.len(), 2);
        assert_eq!(snapshot.scripts[1].text, "eval(\"x\")");

        assert_eq!(snapshot.inputs.len(), 3);
        assert!(snapshot.inputs[1].is_password());
        assert_eq!(snapshot.inputs[2].input_type, "text");
    }

    #[test]
    fn test_snapshot_json_defaults() {
        let snapshot: PageSnapshot = serde_json::from_str(
            r#"{ "pageUrl": "https://a.com", "inputs": [{}, {"type": "PASSWORD"}] }"#,
        )
        .unwrap();

        assert!(snapshot.forms.is_empty());
        assert_eq!(snapshot.inputs[0].input_type, "text");
        assert!(snapshot.inputs[1].is_password());
    }

    #[test]
    fn test_with_default_url() {
        let snapshot = PageSnapshot::default().with_default_url("https://a.com");
        assert_eq!(snapshot.page_url, "https://a.com");

        let snapshot = PageSnapshot::new("https://b.com").with_default_url("https://a.com");
        assert_eq!(snapshot.page_url, "https://b.com");
    }
}
