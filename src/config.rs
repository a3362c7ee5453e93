//! Configuration for feedcast.
//!
//! Two sources, both validated fail-fast at startup:
//! 1. `config.yaml`: shows, feeds, generation/audio defaults, publish targets
//! 2. Environment variables (optionally via `.env`): API credentials
//!
//! Generation and audio settings are layered: global defaults at the top of
//! the file, overridden per-show via explicit field-by-field merge.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Shortest article text (after trimming) worth summarizing.
pub const MIN_ARTICLE_CHARS: usize = 100;

/// Top-level configuration file schema.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Path to the processed-items ledger database.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Global generation defaults.
    #[serde(default)]
    pub generation: GenerationSettings,

    /// Global audio defaults.
    #[serde(default)]
    pub audio: AudioSettings,

    /// Global processing knobs.
    #[serde(default)]
    pub processing: ProcessingSettings,

    /// Configured shows.
    #[serde(default)]
    pub shows: Vec<ShowConfig>,
}

fn default_database_path() -> String {
    "feedcast.db".to_string()
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse config YAML")
    }

    /// Validate the configuration (fail fast before any feed is touched).
    pub fn validate(&self) -> Result<()> {
        if self.shows.is_empty() {
            anyhow::bail!("Config must define at least one show");
        }
        for show in &self.shows {
            if show.id.is_empty() {
                anyhow::bail!("Show '{}' has an empty id", show.name);
            }
            if show.feeds.is_empty() {
                anyhow::bail!("Show '{}' has no feeds", show.name);
            }
            for feed in &show.feeds {
                if feed.url.is_empty() {
                    anyhow::bail!("Show '{}' has a feed with an empty url", show.name);
                }
            }
            if show.drive.folder_id.is_empty() {
                anyhow::bail!("Show '{}' has no Drive folder id", show.name);
            }
        }
        Ok(())
    }
}

/// Script generation settings (global defaults, overridable per show).
/// Each field defaults independently so a partial section is valid.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenerationSettings {
    /// Text model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Target episode length in minutes (scales the word-count hint).
    #[serde(default = "default_target_length_minutes")]
    pub target_length_minutes: u32,
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}
fn default_target_length_minutes() -> u32 {
    5
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            target_length_minutes: default_target_length_minutes(),
        }
    }
}

impl GenerationSettings {
    /// Apply a per-show override on top of these defaults, field by field.
    pub fn merged(&self, overrides: Option<&GenerationOverrides>) -> Self {
        let Some(o) = overrides else {
            return self.clone();
        };
        Self {
            model: o.model.clone().unwrap_or_else(|| self.model.clone()),
            target_length_minutes: o
                .target_length_minutes
                .unwrap_or(self.target_length_minutes),
        }
    }
}

/// Per-show generation overrides; absent fields fall back to the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationOverrides {
    pub model: Option<String>,
    pub target_length_minutes: Option<u32>,
}

/// Speech synthesis settings (global defaults, overridable per show).
/// Each field defaults independently so a partial section is valid.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AudioSettings {
    /// TTS model identifier.
    #[serde(default = "default_tts_model")]
    pub tts_model: String,

    /// Voice identity for the explainer host.
    #[serde(default = "default_host_a_voice")]
    pub host_a_voice: String,

    /// Voice identity for the skeptic host.
    #[serde(default = "default_host_b_voice")]
    pub host_b_voice: String,
}

fn default_tts_model() -> String {
    "tts-1".to_string()
}
fn default_host_a_voice() -> String {
    "onyx".to_string()
}
fn default_host_b_voice() -> String {
    "nova".to_string()
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            tts_model: default_tts_model(),
            host_a_voice: default_host_a_voice(),
            host_b_voice: default_host_b_voice(),
        }
    }
}

impl AudioSettings {
    /// Apply a per-show override on top of these defaults, field by field.
    pub fn merged(&self, overrides: Option<&AudioOverrides>) -> Self {
        let Some(o) = overrides else {
            return self.clone();
        };
        Self {
            tts_model: o.tts_model.clone().unwrap_or_else(|| self.tts_model.clone()),
            host_a_voice: o
                .host_a_voice
                .clone()
                .unwrap_or_else(|| self.host_a_voice.clone()),
            host_b_voice: o
                .host_b_voice
                .clone()
                .unwrap_or_else(|| self.host_b_voice.clone()),
        }
    }
}

/// Per-show audio overrides; absent fields fall back to the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AudioOverrides {
    pub tts_model: Option<String>,
    pub host_a_voice: Option<String>,
    pub host_b_voice: Option<String>,
}

/// Global processing knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessingSettings {
    /// Successfully completed entries per feed per run. Skipped entries do
    /// not count against this cap.
    #[serde(default = "default_max_items")]
    pub max_items_per_feed: usize,
}

fn default_max_items() -> usize {
    1
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            max_items_per_feed: default_max_items(),
        }
    }
}

/// One configured show: source feeds plus publish target.
#[derive(Debug, Clone, Deserialize)]
pub struct ShowConfig {
    /// Stable show identifier (ledger key component).
    pub id: String,

    /// Human-readable show name.
    pub name: String,

    /// Source feeds to poll.
    pub feeds: Vec<FeedConfig>,

    /// Per-show generation overrides.
    #[serde(default)]
    pub generation: Option<GenerationOverrides>,

    /// Per-show audio overrides.
    #[serde(default)]
    pub audio: Option<AudioOverrides>,

    /// Publish target on Google Drive.
    pub drive: DriveTarget,

    /// Channel metadata for the published feed.
    #[serde(default)]
    pub podcast: PodcastInfo,

    /// Optional Gist mirror for the feed document.
    #[serde(default)]
    pub gist: Option<GistTarget>,
}

/// One source feed within a show.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub url: String,
    pub name: String,
}

/// Where episodes and the feed document are uploaded.
#[derive(Debug, Clone, Deserialize)]
pub struct DriveTarget {
    pub folder_id: String,
}

/// Channel-level metadata for the published podcast feed.
#[derive(Debug, Clone, Deserialize)]
pub struct PodcastInfo {
    #[serde(default = "default_podcast_title")]
    pub title: String,

    #[serde(default = "default_podcast_description")]
    pub description: String,

    #[serde(default = "default_podcast_email")]
    pub email: String,

    #[serde(default = "default_rss_filename")]
    pub rss_filename: String,
}

fn default_podcast_title() -> String {
    "My Feedcast Feed".to_string()
}
fn default_podcast_description() -> String {
    "AI-generated article discussions.".to_string()
}
fn default_podcast_email() -> String {
    "podcast@example.com".to_string()
}
fn default_rss_filename() -> String {
    "podcast.xml".to_string()
}

impl Default for PodcastInfo {
    fn default() -> Self {
        Self {
            title: default_podcast_title(),
            description: default_podcast_description(),
            email: default_podcast_email(),
            rss_filename: default_rss_filename(),
        }
    }
}

/// Gist mirror target. The mirror is active only when a GITHUB_TOKEN is
/// also present in the environment.
#[derive(Debug, Clone, Deserialize)]
pub struct GistTarget {
    pub gist_id: String,
}

/// API credentials resolved from the environment.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub anthropic_api_key: String,
    pub openai_api_key: String,
    pub drive_access_token: String,
    pub github_token: Option<String>,
}

impl Credentials {
    /// Resolve credentials, failing fast on anything required.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            openai_api_key: require_env("OPENAI_API_KEY")?,
            drive_access_token: require_env("DRIVE_ACCESS_TOKEN")?,
            github_token: std::env::var("GITHUB_TOKEN").ok(),
        })
    }
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("Required environment variable {} is not set", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_CONFIG_YAML: &str = r#"
database_path: test.db

generation:
  model: claude-sonnet-4-20250514
  target_length_minutes: 5

audio:
  tts_model: tts-1
  host_a_voice: onyx
  host_b_voice: nova

processing:
  max_items_per_feed: 2

shows:
  - id: tech
    name: Tech Digest
    feeds:
      - url: https://example.com/feed.xml
        name: Example Blog
    generation:
      target_length_minutes: 8
    drive:
      folder_id: abc123
    podcast:
      title: Tech Digest Podcast
      email: me@example.com
    gist:
      gist_id: deadbeef
"#;

    #[test]
    fn test_config_parsing() {
        let config = Config::from_yaml(TEST_CONFIG_YAML).unwrap();

        assert_eq!(config.database_path, "test.db");
        assert_eq!(config.processing.max_items_per_feed, 2);
        assert_eq!(config.shows.len(), 1);

        let show = &config.shows[0];
        assert_eq!(show.id, "tech");
        assert_eq!(show.feeds[0].name, "Example Blog");
        assert_eq!(show.drive.folder_id, "abc123");
        assert_eq!(show.podcast.title, "Tech Digest Podcast");
        assert_eq!(show.podcast.rss_filename, "podcast.xml");
        assert_eq!(show.gist.as_ref().unwrap().gist_id, "deadbeef");
    }

    #[test]
    fn test_config_validation() {
        let config = Config::from_yaml(TEST_CONFIG_YAML).unwrap();
        assert!(config.validate().is_ok());

        let empty = Config::from_yaml("shows: []").unwrap();
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_generation_override_merge() {
        let config = Config::from_yaml(TEST_CONFIG_YAML).unwrap();
        let show = &config.shows[0];

        let merged = config.generation.merged(show.generation.as_ref());

        // Overridden field takes the show value, others keep the default
        assert_eq!(merged.target_length_minutes, 8);
        assert_eq!(merged.model, "claude-sonnet-4-20250514");
    }

    #[test]
    fn test_audio_merge_without_overrides() {
        let config = Config::from_yaml(TEST_CONFIG_YAML).unwrap();
        let merged = config.audio.merged(None);
        assert_eq!(merged, config.audio);
    }

    #[test]
    fn test_partial_global_sections_parse() {
        let config = Config::from_yaml(
            "generation:\n  model: custom-model\naudio:\n  host_b_voice: alloy\nshows: []",
        )
        .unwrap();

        // Unspecified fields fall back per key, not per section
        assert_eq!(config.generation.model, "custom-model");
        assert_eq!(config.generation.target_length_minutes, 5);
        assert_eq!(config.audio.tts_model, "tts-1");
        assert_eq!(config.audio.host_b_voice, "alloy");
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let config = Config::from_yaml("shows: []").unwrap();
        assert_eq!(config.database_path, "feedcast.db");
        assert_eq!(config.processing.max_items_per_feed, 1);
        assert_eq!(config.generation.target_length_minutes, 5);
        assert_eq!(config.audio.host_a_voice, "onyx");
    }
}
