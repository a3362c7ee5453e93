//! Google Drive v3 client for episode storage and feed hosting.
//!
//! Uploads use the multipart variant (JSON metadata part + media part);
//! listings follow `nextPageToken` until exhausted. Authentication is a
//! bearer access token supplied by the environment; obtaining/refreshing
//! that token is out of scope here.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use super::{EpisodeStore, StoredObject};

const FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const PAGE_SIZE: u32 = 100;

/// Drive-backed episode store.
pub struct DriveStore {
    access_token: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct FileResource {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(rename = "createdTime")]
    created_time: Option<String>,
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<FileResource>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

impl DriveStore {
    pub fn new(access_token: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build Drive HTTP client")?;
        Ok(Self {
            access_token,
            client,
        })
    }

    async fn multipart_create(
        &self,
        content: Vec<u8>,
        folder_id: &str,
        name: &str,
        mime: &str,
    ) -> Result<String> {
        let metadata = serde_json::json!({
            "name": name,
            "parents": [folder_id],
        });

        let metadata_part = Part::text(metadata.to_string()).mime_str("application/json")?;
        let media_part = Part::bytes(content).mime_str(mime)?;

        let form = Form::new()
            .part("metadata", metadata_part)
            .part("media", media_part);

        let response = self
            .client
            .post(format!("{}?uploadType=multipart&fields=id", UPLOAD_URL))
            .bearer_auth(&self.access_token)
            .multipart(form)
            .send()
            .await
            .context("Failed to send Drive upload")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("Drive upload error {}: {}", status, detail.trim());
        }

        let created: FileResource = response
            .json()
            .await
            .context("Failed to parse Drive upload response")?;

        Ok(created.id)
    }

    async fn list_page(
        &self,
        query: &str,
        fields: &str,
        order_by: &str,
        page_token: Option<&str>,
    ) -> Result<FileList> {
        let mut request = self
            .client
            .get(FILES_URL)
            .bearer_auth(&self.access_token)
            .query(&[
                ("q", query),
                ("fields", fields),
                ("orderBy", order_by),
                ("pageSize", &PAGE_SIZE.to_string()),
            ]);

        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request.send().await.context("Failed to list Drive files")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("Drive list error {}: {}", status, detail.trim());
        }

        response
            .json()
            .await
            .context("Failed to parse Drive list response")
    }

    /// Fetch all matching files, following nextPageToken pagination.
    async fn list_all(&self, query: &str, fields: &str, order_by: &str) -> Result<Vec<FileResource>> {
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .list_page(query, fields, order_by, page_token.as_deref())
                .await?;
            files.extend(page.files);

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(files)
    }
}

#[async_trait]
impl EpisodeStore for DriveStore {
    async fn upload(&self, file: &Path, folder_id: &str, name: &str) -> Result<String> {
        let content = tokio::fs::read(file)
            .await
            .with_context(|| format!("Failed to read upload file: {}", file.display()))?;
        self.multipart_create(content, folder_id, name, "audio/mpeg")
            .await
    }

    async fn set_public(&self, id: &str) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/{}/permissions", FILES_URL, id))
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({
                "type": "anyone",
                "role": "reader",
            }))
            .send()
            .await
            .context("Failed to send Drive permission request")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("Drive permission error {}: {}", status, detail.trim());
        }

        Ok(())
    }

    async fn list_audio(&self, folder_id: &str) -> Result<Vec<StoredObject>> {
        let query = format!(
            "'{}' in parents and mimeType = 'audio/mpeg' and trashed = false",
            folder_id
        );
        let files = self
            .list_all(
                &query,
                "nextPageToken, files(id, name, createdTime, size)",
                "createdTime desc",
            )
            .await?;

        Ok(files
            .into_iter()
            .map(|f| StoredObject {
                id: f.id,
                name: f.name,
                created_time: f
                    .created_time
                    .as_deref()
                    .and_then(parse_drive_timestamp),
                size: f.size.as_deref().and_then(|s| s.parse().ok()),
            })
            .collect())
    }

    async fn find_by_name(&self, folder_id: &str, name: &str) -> Result<Option<String>> {
        let escaped = name.replace('\'', "\\'");
        let query = format!(
            "'{}' in parents and name = '{}' and trashed = false",
            folder_id, escaped
        );
        let files = self
            .list_all(&query, "nextPageToken, files(id)", "createdTime desc")
            .await?;
        Ok(files.into_iter().next().map(|f| f.id))
    }

    async fn upload_bytes(
        &self,
        content: &[u8],
        folder_id: &str,
        name: &str,
        mime: &str,
    ) -> Result<String> {
        self.multipart_create(content.to_vec(), folder_id, name, mime)
            .await
    }

    async fn update_bytes(&self, id: &str, content: &[u8], mime: &str) -> Result<()> {
        let response = self
            .client
            .patch(format!("{}/{}?uploadType=media", UPLOAD_URL, id))
            .bearer_auth(&self.access_token)
            .header(reqwest::header::CONTENT_TYPE, mime)
            .body(content.to_vec())
            .send()
            .await
            .context("Failed to send Drive update")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("Drive update error {}: {}", status, detail.trim());
        }

        Ok(())
    }

    fn public_url(&self, id: &str) -> String {
        format!("https://docs.google.com/uc?export=download&id={}", id)
    }
}

/// Parse a Drive `createdTime` (RFC 3339 with fractional seconds).
fn parse_drive_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_drive_timestamp() {
        let dt = parse_drive_timestamp("2024-06-01T12:30:45.123Z").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-06-01T12:30:45.123+00:00");

        assert!(parse_drive_timestamp("not a date").is_none());
    }

    #[test]
    fn test_file_list_parsing() {
        let raw = r#"{
            "nextPageToken": "tok",
            "files": [
                {"id": "f1", "name": "ep1.mp3", "createdTime": "2024-06-01T00:00:00.000Z", "size": "12345"}
            ]
        }"#;
        let list: FileList = serde_json::from_str(raw).unwrap();
        assert_eq!(list.next_page_token.as_deref(), Some("tok"));
        assert_eq!(list.files[0].id, "f1");
        assert_eq!(list.files[0].size.as_deref(), Some("12345"));
    }
}
