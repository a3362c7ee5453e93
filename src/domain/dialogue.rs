//! Speakers and dialogue turns.
//!
//! A generated script is an ordered sequence of turns, each attributed to
//! one of the two fixed host personas. Order is playback order.

use serde::{Deserialize, Serialize};

/// One of the two fixed podcast hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    /// The explainer: synthesizes and contextualizes the article.
    HostA,

    /// The skeptic: pushes back and asks clarifying questions.
    HostB,
}

impl Speaker {
    /// The literal tag used in script line prefixes and clip filenames.
    pub fn tag(&self) -> &'static str {
        match self {
            Speaker::HostA => "HOST_A",
            Speaker::HostB => "HOST_B",
        }
    }
}

/// A single line of dialogue attributed to one speaker.
///
/// Immutable once produced by parsing; the renderer consumes turns in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueTurn {
    pub speaker: Speaker,
    pub text: String,
}

impl DialogueTurn {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }
}
