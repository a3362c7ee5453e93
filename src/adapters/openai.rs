//! OpenAI speech-synthesis client.
//!
//! Response audio is streamed chunk-by-chunk to the caller's file path so a
//! clip never has to fit in memory.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use super::SpeechSynthesizer;

const API_URL: &str = "https://api.openai.com/v1/audio/speech";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// OpenAI TTS client.
pub struct OpenAiSpeechClient {
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
}

impl OpenAiSpeechClient {
    pub fn new(api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build OpenAI HTTP client")?;
        Ok(Self { api_key, client })
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSpeechClient {
    async fn synthesize(
        &self,
        model: &str,
        voice: &str,
        text: &str,
        out_path: &Path,
    ) -> Result<()> {
        let body = SpeechRequest {
            model,
            voice,
            input: text,
        };

        let mut response = self
            .client
            .post(API_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to send speech request")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("Speech API error {}: {}", status, detail.trim());
        }

        let mut file = tokio::fs::File::create(out_path)
            .await
            .with_context(|| format!("Failed to create clip file: {}", out_path.display()))?;

        while let Some(chunk) = response
            .chunk()
            .await
            .context("Failed to read speech response chunk")?
        {
            file.write_all(&chunk)
                .await
                .context("Failed to write clip data")?;
        }

        file.flush().await.context("Failed to flush clip file")?;

        Ok(())
    }
}
