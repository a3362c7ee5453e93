//! Script generation and parsing.
//!
//! `generate_script` drives the remote text generator with a fixed
//! two-persona prompt and converts exhausted retries into None; the
//! orchestrator treats that as a skip, not a failure. `parse_script` turns
//! the raw response into ordered dialogue turns, tolerating whatever
//! preamble or commentary the generator wraps around them.

use tracing::debug;

use crate::adapters::{ScriptRequest, TextGenerator};
use crate::domain::{DialogueTurn, Speaker};

use super::retry::{run_with_retry, RetryPolicy};

/// Character budget for article text sent to the generator. Longer articles
/// are truncated, not rejected.
pub const MAX_ARTICLE_CHARS: usize = 20_000;

/// Output token bound for one generation request.
const MAX_OUTPUT_TOKENS: u32 = 4096;

/// Word-count heuristic: spoken dialogue runs about this many words per
/// minute.
const WORDS_PER_MINUTE: u32 = 150;

/// Build the fixed system instruction for the two-host script.
fn build_system_prompt(target_length_minutes: u32) -> String {
    format!(
        "You are writing a conversational podcast script for two hosts based on the provided article. \
         Host A is the explainer - synthesizes and contextualizes from the article. \
         Host B is the skeptic/questioner - pushes back, asks clarifying questions, highlights tension. \
         The script should NOT read the article aloud. It should discuss, argue, and synthesize. \
         Quotes from the original should be paraphrased unless a short exact quote meaningfully adds to the conversation. \
         Lines MUST be prefixed strictly with 'HOST_A:' or 'HOST_B:'. Do not include sound effects or other staging instructions. \
         The target length for this podcast is approximately {} minutes, so aim for a proportional word count (around {} words).",
        target_length_minutes,
        target_length_minutes * WORDS_PER_MINUTE
    )
}

/// Truncate to at most `max` characters on a char boundary.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Generate a raw dialogue script for an article.
///
/// Retried per policy; returns None once retries are exhausted so the
/// caller can skip the entry instead of failing the run.
pub async fn generate_script(
    generator: &dyn TextGenerator,
    policy: &RetryPolicy,
    model: &str,
    article_text: &str,
    target_length_minutes: u32,
) -> Option<String> {
    let truncated = truncate_chars(article_text, MAX_ARTICLE_CHARS);
    if truncated.len() < article_text.len() {
        debug!(
            original_chars = article_text.chars().count(),
            budget = MAX_ARTICLE_CHARS,
            "article text truncated before generation"
        );
    }

    let request = ScriptRequest {
        model: model.to_string(),
        system: build_system_prompt(target_length_minutes),
        max_tokens: MAX_OUTPUT_TOKENS,
        user_text: format!("Here is the article text:\n\n{}", truncated),
    };

    run_with_retry(policy, "generate_script", || generator.complete(&request))
        .await
        .ok()
}

/// Parse raw script text into ordered dialogue turns.
///
/// Recognizes four literal line prefixes: `HOST_A:`, `HOST_B:` and their
/// bold-markdown variants. Blank lines and anything else are dropped
/// silently; an empty result is the caller's skip signal.
pub fn parse_script(script_text: &str) -> Vec<DialogueTurn> {
    const PREFIXES: [(&str, Speaker); 4] = [
        ("HOST_A:", Speaker::HostA),
        ("HOST_B:", Speaker::HostB),
        ("**HOST_A:**", Speaker::HostA),
        ("**HOST_B:**", Speaker::HostB),
    ];

    script_text
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            PREFIXES.iter().find_map(|(prefix, speaker)| {
                line.strip_prefix(prefix)
                    .map(|rest| DialogueTurn::new(*speaker, rest.trim()))
            })
        })
        .collect()
}
