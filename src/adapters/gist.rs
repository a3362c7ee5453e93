//! GitHub Gist mirror for the published feed document.
//!
//! Active only when both a token and a gist id are configured; republishing
//! pushes the exact feed XML under the feed's filename.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::FeedMirror;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = "feedcast";

/// Gist-backed feed mirror.
pub struct GistMirror {
    token: String,
    gist_id: String,
    client: reqwest::Client,
}

impl GistMirror {
    pub fn new(token: String, gist_id: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build Gist HTTP client")?;
        Ok(Self {
            token,
            gist_id,
            client,
        })
    }

    fn api_url(&self) -> String {
        format!("https://api.github.com/gists/{}", self.gist_id)
    }
}

#[async_trait]
impl FeedMirror for GistMirror {
    async fn push(&self, filename: &str, content: &str) -> Result<()> {
        let body = serde_json::json!({
            "description": "Feedcast podcast feed",
            "files": {
                filename: { "content": content }
            }
        });

        let response = self
            .client
            .patch(self.api_url())
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .json(&body)
            .send()
            .await
            .context("Failed to send Gist update")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("Gist API error {}: {}", status, detail.trim());
        }

        Ok(())
    }
}
