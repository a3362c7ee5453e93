//! feedcast - RSS-to-podcast pipeline
//!
//! Polls configured article feeds, turns each new entry into a two-host
//! conversational script, voices the script line by line, stitches the
//! clips into one episode, and publishes it to a Google Drive folder with
//! a regenerated RSS 2.0 podcast feed.
//!
//! # Architecture
//!
//! The pipeline runs each entry through a fixed stage sequence; every
//! stage either advances or resolves the entry as skipped/failed, and an
//! entry is recorded in the idempotency ledger only after its full chain
//! succeeds. Re-runs are therefore always safe.
//!
//! # Modules
//!
//! - `adapters`: External system integrations (Anthropic, OpenAI, Drive,
//!   GitHub, ffmpeg)
//! - `core`: Pipeline logic (Orchestrator, Ledger, retries, script, audio)
//! - `domain`: Data structures (DialogueTurn, EntryOutcome, filenames)
//! - `feed`: Source feed fetching and parsing
//! - `publish`: Episode upload and podcast feed publication
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Process all configured shows once
//! feedcast run
//!
//! # Ledger counts
//! feedcast stats
//!
//! # Preview a feed without processing
//! feedcast inspect-feed https://example.com/feed.xml
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod feed;
pub mod publish;

// Re-export main types at crate root for convenience
pub use config::{Config, Credentials};
pub use core::{Collaborators, Ledger, Orchestrator, RetryPolicy};
pub use domain::{DialogueTurn, EntryOutcome, RunSummary, SkipReason, Speaker};
pub use publish::Publisher;
