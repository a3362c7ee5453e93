//! Audio rendering and stitching.
//!
//! Each dialogue turn becomes one clip in the per-entry workspace, named
//! `{index:04}_{SPEAKER}.mp3` so lexicographic order reconstructs playback
//! order. A turn whose retries are exhausted aborts the whole render:
//! partial audio for an episode is not acceptable.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::error;

use crate::adapters::{AudioStitcher, SpeechSynthesizer};
use crate::config::AudioSettings;
use crate::domain::{DialogueTurn, EpisodeTags, Speaker};

use super::retry::{run_with_retry, RetryPolicy};

/// Clip filename for one turn: zero-padded index plus speaker tag.
fn clip_filename(index: usize, speaker: Speaker) -> String {
    format!("{:04}_{}.mp3", index, speaker.tag())
}

/// Render every non-empty turn to a clip file in `workspace`.
///
/// Turn order is preserved in the returned paths. Each synthesis call is
/// individually retried; exhaustion propagates so the caller abandons the
/// episode rather than publishing it truncated.
pub async fn render_turns(
    speech: &dyn SpeechSynthesizer,
    policy: &RetryPolicy,
    turns: &[DialogueTurn],
    audio: &AudioSettings,
    workspace: &Path,
) -> Result<Vec<PathBuf>> {
    let mut clips = Vec::with_capacity(turns.len());

    for (index, turn) in turns.iter().enumerate() {
        if turn.text.is_empty() {
            continue;
        }

        let voice = match turn.speaker {
            Speaker::HostA => &audio.host_a_voice,
            Speaker::HostB => &audio.host_b_voice,
        };
        let clip_path = workspace.join(clip_filename(index, turn.speaker));

        let label = format!("synthesize turn {}", index);
        run_with_retry(policy, &label, || {
            speech.synthesize(&audio.tts_model, voice, &turn.text, &clip_path)
        })
        .await?;

        clips.push(clip_path);
    }

    Ok(clips)
}

/// Concatenate rendered clips into the final episode file.
///
/// This is the boundary where audio failures become a uniform boolean for
/// the orchestrator: any error is logged and folded into `false`.
pub async fn stitch_episode(
    stitcher: &dyn AudioStitcher,
    clips: &[PathBuf],
    output: &Path,
    tags: &EpisodeTags,
) -> bool {
    match stitcher.stitch(clips, output, tags).await {
        Ok(()) => true,
        Err(e) => {
            error!(error = %e, output = %output.display(), "failed to stitch episode audio");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[test]
    fn test_clip_filenames_sort_in_turn_order() {
        let names = vec![
            clip_filename(0, Speaker::HostA),
            clip_filename(1, Speaker::HostB),
            clip_filename(10, Speaker::HostA),
        ];
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names[0], "0000_HOST_A.mp3");
        assert_eq!(names[2], "0010_HOST_A.mp3");
    }

    struct RecordingSynth {
        calls: Mutex<Vec<(String, String)>>,
    }

    #[async_trait::async_trait]
    impl SpeechSynthesizer for RecordingSynth {
        async fn synthesize(
            &self,
            _model: &str,
            voice: &str,
            text: &str,
            out_path: &Path,
        ) -> Result<()> {
            tokio::fs::write(out_path, b"clip").await?;
            self.calls
                .lock()
                .unwrap()
                .push((voice.to_string(), text.to_string()));
            Ok(())
        }
    }

    struct FailingSynth {
        attempts: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl SpeechSynthesizer for FailingSynth {
        async fn synthesize(
            &self,
            _model: &str,
            _voice: &str,
            _text: &str,
            _out_path: &Path,
        ) -> Result<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("synthesis unavailable")
        }
    }

    fn test_audio_settings() -> AudioSettings {
        AudioSettings {
            tts_model: "tts-1".to_string(),
            host_a_voice: "voice-a".to_string(),
            host_b_voice: "voice-b".to_string(),
        }
    }

    #[tokio::test]
    async fn test_render_selects_voice_and_skips_empty_turns() {
        let temp = tempfile::TempDir::new().unwrap();
        let synth = RecordingSynth {
            calls: Mutex::new(Vec::new()),
        };
        let turns = vec![
            DialogueTurn::new(Speaker::HostA, "First"),
            DialogueTurn::new(Speaker::HostB, ""),
            DialogueTurn::new(Speaker::HostB, "Third"),
        ];

        let clips = render_turns(
            &synth,
            &RetryPolicy::immediate(3),
            &turns,
            &test_audio_settings(),
            temp.path(),
        )
        .await
        .unwrap();

        // Empty turn skipped; indices keep their original positions
        assert_eq!(clips.len(), 2);
        assert!(clips[0].ends_with("0000_HOST_A.mp3"));
        assert!(clips[1].ends_with("0002_HOST_B.mp3"));

        let calls = synth.calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![
                ("voice-a".to_string(), "First".to_string()),
                ("voice-b".to_string(), "Third".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_render_aborts_on_exhausted_turn() {
        let temp = tempfile::TempDir::new().unwrap();
        let synth = FailingSynth {
            attempts: AtomicUsize::new(0),
        };
        let turns = vec![DialogueTurn::new(Speaker::HostA, "Doomed")];

        let result = render_turns(
            &synth,
            &RetryPolicy::immediate(3),
            &turns,
            &test_audio_settings(),
            temp.path(),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(synth.attempts.load(Ordering::SeqCst), 3);
    }

    struct RejectingStitcher;

    #[async_trait::async_trait]
    impl AudioStitcher for RejectingStitcher {
        async fn stitch(
            &self,
            _clips: &[PathBuf],
            _output: &Path,
            _tags: &EpisodeTags,
        ) -> Result<()> {
            anyhow::bail!("codec error")
        }
    }

    #[tokio::test]
    async fn test_stitch_failure_becomes_false() {
        let tags = EpisodeTags::for_episode("t", "f");
        let ok = stitch_episode(
            &RejectingStitcher,
            &[PathBuf::from("a.mp3")],
            Path::new("/tmp/out.mp3"),
            &tags,
        )
        .await;
        assert!(!ok);
    }
}
