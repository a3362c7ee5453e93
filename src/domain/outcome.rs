//! Per-entry processing outcomes.
//!
//! Every entry ends in exactly one of three terminal states. Skips are
//! expected control flow, not errors; failures are unexpected errors caught
//! at the entry boundary so one bad entry never aborts the whole run.

use std::fmt;

/// Terminal state of processing one feed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    /// Every stage succeeded and the entry was marked processed.
    Completed,

    /// The entry was intentionally skipped before persistence.
    Skipped(SkipReason),

    /// An unexpected error escaped a stage; the entry stays unprocessed.
    Failed(String),
}

impl EntryOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, EntryOutcome::Completed)
    }
}

/// Why an entry was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The entry has neither an id nor a link to key on.
    MissingItemId,

    /// The (show, item) pair is already in the ledger.
    AlreadyProcessed,

    /// Fetched text (or summary fallback) was under the minimum length.
    ArticleTooShort,

    /// Script generation returned nothing after exhausted retries.
    ScriptGenerationFailed,

    /// The generated script contained no recognizable dialogue lines.
    EmptyDialogue,

    /// No audio clips were produced for the dialogue.
    NoAudioRendered,

    /// Concatenation/export of the episode audio failed.
    StitchFailed,

    /// Uploading the stitched episode failed after retries.
    UploadFailed,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipReason::MissingItemId => "entry has no usable identifier",
            SkipReason::AlreadyProcessed => "already processed",
            SkipReason::ArticleTooShort => "article text too short",
            SkipReason::ScriptGenerationFailed => "script generation failed",
            SkipReason::EmptyDialogue => "no dialogue lines parsed",
            SkipReason::NoAudioRendered => "no audio clips rendered",
            SkipReason::StitchFailed => "audio stitching failed",
            SkipReason::UploadFailed => "episode upload failed",
        };
        f.write_str(s)
    }
}

/// Aggregate counts for one full run across all shows and feeds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    /// Fold one entry outcome into the summary.
    pub fn record(&mut self, outcome: &EntryOutcome) {
        match outcome {
            EntryOutcome::Completed => self.completed += 1,
            EntryOutcome::Skipped(_) => self.skipped += 1,
            EntryOutcome::Failed(_) => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.completed + self.skipped + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_record() {
        let mut summary = RunSummary::default();
        summary.record(&EntryOutcome::Completed);
        summary.record(&EntryOutcome::Skipped(SkipReason::AlreadyProcessed));
        summary.record(&EntryOutcome::Skipped(SkipReason::ArticleTooShort));
        summary.record(&EntryOutcome::Failed("boom".to_string()));

        assert_eq!(summary.completed, 1);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total(), 4);
    }

    #[test]
    fn test_is_completed() {
        assert!(EntryOutcome::Completed.is_completed());
        assert!(!EntryOutcome::Skipped(SkipReason::EmptyDialogue).is_completed());
    }
}
