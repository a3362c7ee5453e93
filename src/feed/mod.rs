//! Source feed fetching and parsing.
//!
//! Feeds are fetched with a browser-ish user agent and parsed as RSS 2.0
//! first, falling back to Atom. Entries keep only what the pipeline needs:
//! a stable identifier (id, falling back to link), title, link and summary.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; Feedcast/1.0)";
const FEED_TIMEOUT: Duration = Duration::from_secs(15);

/// One entry from a source feed, in feed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    /// Feed-supplied identifier (guid / atom id), if any.
    pub id: Option<String>,

    /// Entry link, if any.
    pub link: Option<String>,

    /// Entry title.
    pub title: String,

    /// Entry summary/description, used as article-text fallback.
    pub summary: Option<String>,
}

impl FeedEntry {
    /// The stable processing identifier: entry id, falling back to link.
    /// Never recomputed once chosen.
    pub fn item_id(&self) -> Option<&str> {
        self.id.as_deref().or(self.link.as_deref())
    }
}

/// Build the HTTP client used for feed fetching.
pub fn feed_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(FEED_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build feed HTTP client")
}

/// Fetch and parse a feed URL into ordered entries.
pub async fn fetch_entries(client: &reqwest::Client, url: &str) -> Result<Vec<FeedEntry>> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch feed {}", url))?
        .error_for_status()
        .with_context(|| format!("HTTP error fetching feed {}", url))?;

    let content = response
        .text()
        .await
        .with_context(|| format!("Failed to read feed body {}", url))?;

    parse_entries(&content)
        .with_context(|| format!("Failed to parse feed {}", url))
}

/// Parse feed content, trying RSS first and Atom second.
pub fn parse_entries(content: &str) -> Result<Vec<FeedEntry>> {
    match parse_as_rss(content) {
        Ok(entries) => {
            debug!(entries = entries.len(), "parsed feed as RSS");
            Ok(entries)
        }
        Err(rss_err) => match parse_as_atom(content) {
            Ok(entries) => {
                debug!(entries = entries.len(), "parsed feed as Atom");
                Ok(entries)
            }
            Err(atom_err) => anyhow::bail!(
                "not parseable as RSS ({}) or Atom ({})",
                rss_err,
                atom_err
            ),
        },
    }
}

fn parse_as_rss(content: &str) -> Result<Vec<FeedEntry>> {
    let channel = content
        .parse::<rss::Channel>()
        .context("RSS parse error")?;

    Ok(channel
        .items()
        .iter()
        .map(|item| FeedEntry {
            id: item.guid().map(|g| g.value().to_string()),
            link: item.link().map(|l| l.to_string()),
            title: item.title().unwrap_or("").to_string(),
            summary: item.description().map(|d| d.to_string()),
        })
        .collect())
}

fn parse_as_atom(content: &str) -> Result<Vec<FeedEntry>> {
    let feed = atom_syndication::Feed::read_from(content.as_bytes())
        .context("Atom parse error")?;

    Ok(feed
        .entries()
        .iter()
        .map(|entry| FeedEntry {
            id: Some(entry.id().to_string()),
            link: entry.links().first().map(|l| l.href().to_string()),
            title: entry.title().to_string(),
            summary: entry.summary().map(|s| s.to_string()),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example Blog</title>
    <link>https://example.com</link>
    <description>Sample</description>
    <item>
      <title>First Post</title>
      <link>https://example.com/first</link>
      <guid isPermaLink="false">post-1</guid>
      <description>Summary of the first post</description>
    </item>
    <item>
      <title>Second Post</title>
      <link>https://example.com/second</link>
    </item>
  </channel>
</rss>"#;

    const ATOM_SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Example Atom</title>
  <id>urn:uuid:feed</id>
  <updated>2024-06-01T00:00:00Z</updated>
  <entry>
    <title>Atom Post</title>
    <id>urn:uuid:entry-1</id>
    <link href="https://example.com/atom-post"/>
    <updated>2024-06-01T00:00:00Z</updated>
    <summary>Atom summary</summary>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_rss_entries_in_order() {
        let entries = parse_entries(RSS_SAMPLE).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "First Post");
        assert_eq!(entries[0].id.as_deref(), Some("post-1"));
        assert_eq!(
            entries[0].summary.as_deref(),
            Some("Summary of the first post")
        );
        assert_eq!(entries[1].title, "Second Post");
        assert_eq!(entries[1].id, None);
    }

    #[test]
    fn test_parse_atom_fallback() {
        let entries = parse_entries(ATOM_SAMPLE).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id.as_deref(), Some("urn:uuid:entry-1"));
        assert_eq!(
            entries[0].link.as_deref(),
            Some("https://example.com/atom-post")
        );
        assert_eq!(entries[0].summary.as_deref(), Some("Atom summary"));
    }

    #[test]
    fn test_unparseable_content_errors() {
        assert!(parse_entries("this is not a feed").is_err());
    }

    #[test]
    fn test_item_id_falls_back_to_link() {
        let entries = parse_entries(RSS_SAMPLE).unwrap();
        assert_eq!(entries[0].item_id(), Some("post-1"));
        assert_eq!(entries[1].item_id(), Some("https://example.com/second"));

        let orphan = FeedEntry {
            id: None,
            link: None,
            title: "No identity".to_string(),
            summary: None,
        };
        assert_eq!(orphan.item_id(), None);
    }
}
