//! Command-line interface for feedcast.
//!
//! Provides commands for running the pipeline, inspecting the ledger,
//! migrating legacy state, and previewing feeds.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::adapters::{
    AnthropicClient, DriveStore, FeedMirror, FfmpegStitcher, GistMirror, HttpArticleSource,
    OpenAiSpeechClient,
};
use crate::config::{Config, Credentials};
use crate::core::{migrate_legacy_file, Collaborators, Ledger, Orchestrator, RetryPolicy};
use crate::feed;
use crate::publish::Publisher;

/// feedcast - turns article feeds into two-host podcast episodes
#[derive(Parser, Debug)]
#[command(name = "feedcast")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.yaml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process all configured shows once
    Run,

    /// Show processed-item counts from the ledger
    Stats,

    /// Migrate a legacy processed.json file into the ledger
    Migrate {
        /// Path to the legacy file
        #[arg(default_value = "processed.json")]
        file: PathBuf,
    },

    /// Fetch a feed URL and print its entries (no processing)
    InspectFeed {
        /// Feed URL to fetch
        url: String,
    },
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Run => run_pipeline(&self.config).await,
            Commands::Stats => show_stats(&self.config),
            Commands::Migrate { file } => migrate(&self.config, &file),
            Commands::InspectFeed { url } => inspect_feed(&url).await,
        }
    }
}

/// Load config, resolve credentials, wire the production adapters and run
/// every show once.
async fn run_pipeline(config_path: &Path) -> Result<()> {
    let config = Config::from_file(config_path)?;
    config.validate()?;

    // Fail fast on credentials before any feed is touched.
    let credentials = Credentials::from_env()?;

    let ledger = Ledger::open(Path::new(&config.database_path))
        .with_context(|| format!("Failed to open ledger at {}", config.database_path))?;

    let collaborators = Collaborators {
        articles: Arc::new(HttpArticleSource::new()?),
        generator: Arc::new(AnthropicClient::new(credentials.anthropic_api_key.clone())?),
        speech: Arc::new(OpenAiSpeechClient::new(credentials.openai_api_key.clone())?),
        stitcher: Arc::new(FfmpegStitcher::new()),
    };

    let store = Arc::new(DriveStore::new(credentials.drive_access_token.clone())?);
    let publisher = Publisher::new(store, build_mirrors(&config, &credentials)?, RetryPolicy::default());

    let orchestrator = Orchestrator::new(collaborators, publisher, ledger, RetryPolicy::default())?;
    let summary = orchestrator.run(&config).await?;

    println!(
        "Run complete: {} completed, {} skipped, {} failed",
        summary.completed, summary.skipped, summary.failed
    );
    Ok(())
}

/// One mirror per show that configures a gist, active only when a GitHub
/// token is present in the environment.
fn build_mirrors(
    config: &Config,
    credentials: &Credentials,
) -> Result<HashMap<String, Arc<dyn FeedMirror>>> {
    let mut mirrors: HashMap<String, Arc<dyn FeedMirror>> = HashMap::new();
    let Some(token) = &credentials.github_token else {
        return Ok(mirrors);
    };
    for show in &config.shows {
        if let Some(gist) = &show.gist {
            let mirror = GistMirror::new(token.clone(), gist.gist_id.clone())?;
            mirrors.insert(show.id.clone(), Arc::new(mirror));
        }
    }
    Ok(mirrors)
}

/// Print processed-item counts, overall and per show.
fn show_stats(config_path: &Path) -> Result<()> {
    let config = Config::from_file(config_path)?;
    let ledger = Ledger::open(Path::new(&config.database_path))
        .with_context(|| format!("Failed to open ledger at {}", config.database_path))?;

    let total = ledger.processed_count(None)?;
    println!("Processed items: {}", total);
    for (show_id, count) in ledger.counts_by_show()? {
        println!("  {}: {}", show_id, count);
    }
    Ok(())
}

/// Migrate a legacy processed.json file into the ledger.
fn migrate(config_path: &Path, file: &Path) -> Result<()> {
    let config = Config::from_file(config_path)?;
    let ledger = Ledger::open(Path::new(&config.database_path))
        .with_context(|| format!("Failed to open ledger at {}", config.database_path))?;

    let migrated = migrate_legacy_file(&ledger, file)?;
    println!("Migrated {} legacy items", migrated);
    Ok(())
}

/// Fetch and print a feed's entries without processing anything.
async fn inspect_feed(url: &str) -> Result<()> {
    let client = feed::feed_client()?;
    let entries = feed::fetch_entries(&client, url).await?;

    println!("{} entries:", entries.len());
    for entry in &entries {
        println!(
            "  {} [{}]",
            entry.title,
            entry.item_id().unwrap_or("<no id>")
        );
    }
    Ok(())
}
