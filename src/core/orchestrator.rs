//! Pipeline orchestration.
//!
//! One run walks every configured show and feed, driving each entry through
//! a fixed stage sequence: identify, dedupe, fetch, script, voice, stitch,
//! publish, persist. Every stage either advances or resolves the entry as
//! Skipped/Failed; a failure never aborts the feed loop. The ledger is
//! written only after the full chain succeeds, so a crash mid-entry means
//! the entry is retried whole on the next run.

use std::sync::Arc;

use anyhow::Result;
use chrono::Local;
use tempfile::TempDir;
use tracing::{error, info, instrument, warn};

use crate::adapters::{ArticleSource, AudioStitcher, SpeechSynthesizer, TextGenerator};
use crate::config::{
    AudioSettings, Config, FeedConfig, GenerationSettings, ShowConfig, MIN_ARTICLE_CHARS,
};
use crate::domain::{
    episode_filename, safe_filename, truncate_title, DialogueTurn, EntryOutcome, EpisodeTags,
    RunSummary, SkipReason, Speaker,
};
use crate::feed::{self, FeedEntry};
use crate::publish::Publisher;

use super::audio::{render_turns, stitch_episode};
use super::ledger::Ledger;
use super::retry::RetryPolicy;
use super::script::{generate_script, parse_script};

/// External collaborators the pipeline drives, all behind traits.
pub struct Collaborators {
    pub articles: Arc<dyn ArticleSource>,
    pub generator: Arc<dyn TextGenerator>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub stitcher: Arc<dyn AudioStitcher>,
}

/// Drives the whole feed-to-episode pipeline.
pub struct Orchestrator {
    collaborators: Collaborators,
    publisher: Publisher,
    ledger: Ledger,
    retry: RetryPolicy,
    feed_client: reqwest::Client,
}

/// Per-entry settings resolved from global defaults plus show overrides.
struct ShowContext<'a> {
    show: &'a ShowConfig,
    generation: GenerationSettings,
    audio: AudioSettings,
}

impl Orchestrator {
    pub fn new(
        collaborators: Collaborators,
        publisher: Publisher,
        ledger: Ledger,
        retry: RetryPolicy,
    ) -> Result<Self> {
        Ok(Self {
            collaborators,
            publisher,
            ledger,
            retry,
            feed_client: feed::feed_client()?,
        })
    }

    /// Process every configured show once. Infrastructure errors inside an
    /// entry are contained; only setup errors (unreadable config, broken
    /// ledger) escape.
    pub async fn run(&self, config: &Config) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        let cap = config.processing.max_items_per_feed;

        for show in &config.shows {
            let ctx = ShowContext {
                show,
                generation: config.generation.merged(show.generation.as_ref()),
                audio: config.audio.merged(show.audio.as_ref()),
            };

            info!(show = %show.name, feeds = show.feeds.len(), "processing show");

            for feed_config in &show.feeds {
                self.process_feed(&ctx, feed_config, cap, &mut summary).await;
            }
        }

        info!(
            completed = summary.completed,
            skipped = summary.skipped,
            failed = summary.failed,
            "run finished"
        );
        Ok(summary)
    }

    /// Process one feed until the per-feed completion cap is reached or the
    /// feed is exhausted. Only completed entries count against the cap.
    #[instrument(skip(self, ctx, summary), fields(feed = %feed_config.name))]
    async fn process_feed(
        &self,
        ctx: &ShowContext<'_>,
        feed_config: &FeedConfig,
        cap: usize,
        summary: &mut RunSummary,
    ) {
        let entries = match feed::fetch_entries(&self.feed_client, &feed_config.url).await {
            Ok(entries) => entries,
            Err(err) => {
                error!(url = %feed_config.url, error = %err, "failed to fetch feed");
                return;
            }
        };

        info!(entries = entries.len(), "feed fetched");

        let mut completed = 0;
        for entry in &entries {
            if completed >= cap {
                break;
            }

            let outcome = self.process_entry(ctx, feed_config, entry).await;
            match &outcome {
                EntryOutcome::Completed => {
                    completed += 1;
                    info!(title = %entry.title, "entry completed");
                }
                EntryOutcome::Skipped(reason) => {
                    info!(title = %entry.title, %reason, "entry skipped");
                }
                EntryOutcome::Failed(message) => {
                    error!(title = %entry.title, error = %message, "entry failed");
                }
            }
            summary.record(&outcome);
        }
    }

    /// Run one entry through the full stage sequence.
    ///
    /// Anything that escapes the stages as an error is caught here and
    /// resolved as Failed so the caller's loop keeps moving.
    async fn process_entry(
        &self,
        ctx: &ShowContext<'_>,
        feed_config: &FeedConfig,
        entry: &FeedEntry,
    ) -> EntryOutcome {
        match self.run_stages(ctx, feed_config, entry).await {
            Ok(outcome) => outcome,
            Err(err) => EntryOutcome::Failed(format!("{:#}", err)),
        }
    }

    async fn run_stages(
        &self,
        ctx: &ShowContext<'_>,
        feed_config: &FeedConfig,
        entry: &FeedEntry,
    ) -> Result<EntryOutcome> {
        let show = ctx.show;

        // Identify. An entry with neither id nor link has no stable key.
        let Some(item_id) = entry.item_id() else {
            return Ok(EntryOutcome::Skipped(SkipReason::MissingItemId));
        };

        // Dedupe before any remote work.
        if self.ledger.is_processed(&show.id, item_id)? {
            return Ok(EntryOutcome::Skipped(SkipReason::AlreadyProcessed));
        }

        // Fetch article text, falling back to the feed summary.
        let article_text = self.resolve_article_text(entry, &feed_config.url).await;
        let article_text = article_text.trim();
        if article_text.chars().count() < MIN_ARTICLE_CHARS {
            return Ok(EntryOutcome::Skipped(SkipReason::ArticleTooShort));
        }

        // Script.
        let Some(raw_script) = generate_script(
            self.collaborators.generator.as_ref(),
            &self.retry,
            &ctx.generation.model,
            article_text,
            ctx.generation.target_length_minutes,
        )
        .await
        else {
            return Ok(EntryOutcome::Skipped(SkipReason::ScriptGenerationFailed));
        };

        let mut turns = parse_script(&raw_script);
        if turns.is_empty() {
            warn!(title = %entry.title, "generated script contained no dialogue lines");
            return Ok(EntryOutcome::Skipped(SkipReason::EmptyDialogue));
        }
        turns.insert(0, intro_turn(&entry.title, &feed_config.name));

        // Voice each turn into a scratch workspace that cleans itself up.
        let workspace = TempDir::new()?;
        let clips = render_turns(
            self.collaborators.speech.as_ref(),
            &self.retry,
            &turns,
            &ctx.audio,
            workspace.path(),
        )
        .await?;
        if clips.is_empty() {
            return Ok(EntryOutcome::Skipped(SkipReason::NoAudioRendered));
        }

        // Stitch into the final episode file.
        let safe_title = truncate_title(&safe_filename(&entry.title));
        let safe_feed = safe_filename(&feed_config.name);
        let tags = EpisodeTags::for_episode(&safe_title, &safe_feed);
        let date = Local::now().format("%Y-%m-%d").to_string();
        let episode_name = episode_filename(&feed_config.name, &entry.title, &date);
        let episode_path = workspace.path().join(&episode_name);

        if !stitch_episode(
            self.collaborators.stitcher.as_ref(),
            &clips,
            &episode_path,
            &tags,
        )
        .await
        {
            return Ok(EntryOutcome::Skipped(SkipReason::StitchFailed));
        }

        // Publish.
        if let Err(err) = self
            .publisher
            .upload_episode(&episode_path, &show.drive.folder_id, &episode_name)
            .await
        {
            error!(title = %entry.title, error = %format!("{:#}", err), "episode upload failed");
            return Ok(EntryOutcome::Skipped(SkipReason::UploadFailed));
        }

        // The feed is rebuilt from a full listing, so a failed republish
        // only delays the new episode until the next successful one.
        if let Err(err) = self.publisher.republish_feed(show).await {
            warn!(show = %show.name, error = %err, "feed republish failed");
        }

        // Persist only now, after everything downstream succeeded.
        self.ledger.mark_processed(
            &show.id,
            item_id,
            Some(&entry.title),
            Some(&feed_config.name),
        )?;

        Ok(EntryOutcome::Completed)
    }

    /// Full article text fetched from the entry link (or the feed URL when
    /// the entry carries no link), falling back to the feed summary when
    /// the page yields no usable text. A fetch that succeeds but produces
    /// only whitespace counts as no text, same as a failed fetch.
    async fn resolve_article_text(&self, entry: &FeedEntry, feed_url: &str) -> String {
        let url = entry.link.as_deref().unwrap_or(feed_url);
        let fetched = self
            .collaborators
            .articles
            .fetch(url)
            .await
            .filter(|text| !text.trim().is_empty());
        if let Some(text) = fetched {
            return text;
        }
        warn!(url, "article fetch yielded no text, falling back to feed summary");
        entry.summary.clone().unwrap_or_default()
    }
}

/// The spoken introduction prepended to every episode.
fn intro_turn(title: &str, feed_name: &str) -> DialogueTurn {
    DialogueTurn::new(
        Speaker::HostA,
        format!(
            "Welcome to today's summary. We are discussing the article '{}' from {}.",
            title, feed_name
        ),
    )
}
