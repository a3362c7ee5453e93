//! Domain types for the podcast pipeline.
//!
//! This module contains the core data structures:
//! - Dialogue: Speakers and ordered dialogue turns
//! - Episode: Tags and filename conventions for published audio
//! - Outcome: Per-entry processing results and run summaries

pub mod dialogue;
pub mod episode;
pub mod outcome;

// Re-export commonly used types
pub use dialogue::{DialogueTurn, Speaker};
pub use episode::{episode_filename, safe_filename, truncate_title, EpisodeTags};
pub use outcome::{EntryOutcome, RunSummary, SkipReason};
