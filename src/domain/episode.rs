//! Episode tags and filename conventions.
//!
//! Published filenames follow `"{feed} - {title} - {date}.mp3"` with both
//! names sanitized for the filesystem and the title capped at 50 characters.

/// Maximum sanitized title length in a published filename.
const MAX_TITLE_LEN: usize = 50;

/// Descriptive metadata embedded into the stitched episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeTags {
    pub title: String,
    pub artist: String,
    pub album: String,
}

impl EpisodeTags {
    /// Standard tags for an episode: sanitized title, fixed artist,
    /// album = the source feed's sanitized name.
    pub fn for_episode(safe_title: &str, safe_feed_name: &str) -> Self {
        Self {
            title: safe_title.to_string(),
            artist: "Feedcast".to_string(),
            album: safe_feed_name.to_string(),
        }
    }
}

/// Sanitize a string for use as a filename.
///
/// Keeps alphanumerics plus space, dot, underscore and hyphen; everything
/// else is dropped. Trailing whitespace is trimmed.
pub fn safe_filename(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '.' | '_' | '-'))
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Truncate a sanitized title to the filename cap, marking truncation
/// with an ellipsis.
pub fn truncate_title(title: &str) -> String {
    if title.chars().count() > MAX_TITLE_LEN {
        let head: String = title.chars().take(MAX_TITLE_LEN - 3).collect();
        format!("{}...", head)
    } else {
        title.to_string()
    }
}

/// Build the published episode filename for one entry.
///
/// `date` is expected in `YYYY-MM-DD` form; `feed_name` and `title` are raw
/// (unsanitized) values.
pub fn episode_filename(feed_name: &str, title: &str, date: &str) -> String {
    let safe_feed = safe_filename(feed_name);
    let safe_title = truncate_title(&safe_filename(title));
    format!("{} - {} - {}.mp3", safe_feed, safe_title, date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_filename_strips_special_characters() {
        assert_eq!(
            safe_filename("Title with / Special @ Characters!"),
            "Title with  Special  Characters"
        );
    }

    #[test]
    fn test_safe_filename_keeps_allowed_punctuation() {
        assert_eq!(safe_filename("v1.2_final-draft"), "v1.2_final-draft");
    }

    #[test]
    fn test_safe_filename_trims_trailing_whitespace() {
        assert_eq!(safe_filename("Ends badly?!"), "Ends badly");
    }

    #[test]
    fn test_truncate_title_short_unchanged() {
        assert_eq!(truncate_title("Short title"), "Short title");
    }

    #[test]
    fn test_truncate_title_long_gets_ellipsis() {
        let long = "a".repeat(80);
        let truncated = truncate_title(&long);
        assert_eq!(truncated.chars().count(), 50);
        assert!(truncated.ends_with("..."));
        assert_eq!(&truncated[..47], &long[..47]);
    }

    #[test]
    fn test_episode_filename_format() {
        let name = episode_filename("Hacker News", "Rust 2.0 released?", "2024-06-01");
        assert_eq!(name, "Hacker News - Rust 2.0 released - 2024-06-01.mp3");
    }

    #[test]
    fn test_episode_tags() {
        let tags = EpisodeTags::for_episode("My Title", "My Feed");
        assert_eq!(tags.artist, "Feedcast");
        assert_eq!(tags.album, "My Feed");
        assert_eq!(tags.title, "My Title");
    }
}
