//! HTTP article fetcher with HTML cleanup.
//!
//! Fetches a page with a browser-ish user agent, strips script/style blocks
//! and remaining markup, and collapses whitespace to single spaces. Any
//! failure is logged and surfaces as None, never as an error.

use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use tracing::error;

use super::ArticleSource;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; Feedcast/1.0)";
const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Article source backed by plain HTTP GET.
pub struct HttpArticleSource {
    client: reqwest::Client,
}

impl HttpArticleSource {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build article HTTP client")?;
        Ok(Self { client })
    }

    async fn fetch_inner(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?
            .error_for_status()
            .with_context(|| format!("HTTP error fetching {}", url))?;

        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read body of {}", url))?;

        Ok(extract_text(&body))
    }
}

#[async_trait]
impl ArticleSource for HttpArticleSource {
    async fn fetch(&self, url: &str) -> Option<String> {
        match self.fetch_inner(url).await {
            Ok(text) => Some(text),
            Err(e) => {
                error!(url, error = %e, "failed to fetch article text");
                None
            }
        }
    }
}

fn script_style_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)>")
            .expect("valid script/style regex")
    })
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"))
}

/// Strip script/style blocks and markup from HTML, decode the common
/// entities, and collapse all whitespace runs to single spaces.
pub fn extract_text(html: &str) -> String {
    let without_blocks = script_style_re().replace_all(html, " ");
    let without_tags = tag_re().replace_all(&without_blocks, " ");

    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text_strips_tags() {
        let html = "<html><body><h1>Title</h1><p>Some <b>bold</b> text.</p></body></html>";
        assert_eq!(extract_text(html), "Title Some bold text.");
    }

    #[test]
    fn test_extract_text_removes_script_and_style() {
        let html = r#"<p>Visible</p><script>var hidden = "no";</script><style>p { color: red }</style><p>Also visible</p>"#;
        assert_eq!(extract_text(html), "Visible Also visible");
    }

    #[test]
    fn test_extract_text_collapses_whitespace() {
        let html = "<p>Spread\n\n   across\t\tlines</p>";
        assert_eq!(extract_text(html), "Spread across lines");
    }

    #[test]
    fn test_extract_text_decodes_entities() {
        let html = "<p>Fish &amp; chips &lt;3</p>";
        assert_eq!(extract_text(html), "Fish & chips <3");
    }

    #[test]
    fn test_multiline_script_block() {
        let html = "<script>\nline one\nline two\n</script><p>kept</p>";
        assert_eq!(extract_text(html), "kept");
    }
}
