//! Adapter interfaces for external systems.
//!
//! Each remote collaborator is behind a trait so the orchestrator can be
//! exercised against fakes. Production impls wrap HTTP APIs (Anthropic,
//! OpenAI, Google Drive, GitHub) or a subprocess (ffmpeg).

pub mod anthropic;
pub mod article;
pub mod drive;
pub mod ffmpeg;
pub mod gist;
pub mod openai;

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::EpisodeTags;

pub use anthropic::AnthropicClient;
pub use article::HttpArticleSource;
pub use drive::DriveStore;
pub use ffmpeg::FfmpegStitcher;
pub use gist::GistMirror;
pub use openai::OpenAiSpeechClient;

/// Source of full article text for a feed entry.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Fetch and clean the article at `url`. Returns None (never errors)
    /// when the page cannot be fetched or yields no text.
    async fn fetch(&self, url: &str) -> Option<String>;
}

/// A single text-generation request.
#[derive(Debug, Clone)]
pub struct ScriptRequest {
    /// Model identifier.
    pub model: String,

    /// System instruction establishing the two personas.
    pub system: String,

    /// Output token bound.
    pub max_tokens: u32,

    /// The (possibly truncated) article text.
    pub user_text: String,
}

/// Remote text-generation endpoint.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Execute one generation request, returning the response text blob.
    async fn complete(&self, request: &ScriptRequest) -> Result<String>;
}

/// Remote speech-synthesis endpoint.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` with the given model/voice, streaming the audio
    /// to `out_path`.
    async fn synthesize(&self, model: &str, voice: &str, text: &str, out_path: &Path)
        -> Result<()>;
}

/// Audio concatenation and export.
#[async_trait]
pub trait AudioStitcher: Send + Sync {
    /// Concatenate `clips` in order into `output`, exporting at the
    /// episode bitrate with the given tags embedded.
    async fn stitch(&self, clips: &[std::path::PathBuf], output: &Path, tags: &EpisodeTags)
        -> Result<()>;
}

/// Metadata for one object in the episode store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub id: String,
    pub name: String,
    pub created_time: Option<DateTime<Utc>>,
    pub size: Option<u64>,
}

/// Object storage hosting published episodes and the feed document.
#[async_trait]
pub trait EpisodeStore: Send + Sync {
    /// Upload a local file into `folder_id` under `name`; returns the
    /// object id.
    async fn upload(&self, file: &Path, folder_id: &str, name: &str) -> Result<String>;

    /// Make an object publicly readable.
    async fn set_public(&self, id: &str) -> Result<()>;

    /// List audio objects in a folder, newest first, following pagination
    /// until exhausted.
    async fn list_audio(&self, folder_id: &str) -> Result<Vec<StoredObject>>;

    /// Find an object id by exact name within a folder.
    async fn find_by_name(&self, folder_id: &str, name: &str) -> Result<Option<String>>;

    /// Create an object from in-memory content; returns the object id.
    async fn upload_bytes(
        &self,
        content: &[u8],
        folder_id: &str,
        name: &str,
        mime: &str,
    ) -> Result<String>;

    /// Replace an existing object's content in place.
    async fn update_bytes(&self, id: &str, content: &[u8], mime: &str) -> Result<()>;

    /// Public download URL for an object id.
    fn public_url(&self, id: &str) -> String;
}

/// Optional secondary mirror for the feed document.
#[async_trait]
pub trait FeedMirror: Send + Sync {
    /// Push the feed document content under the given filename.
    async fn push(&self, filename: &str, content: &str) -> Result<()>;
}
