use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Client, ClientResult, TrackId};

/// A single line of synchronized lyrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricLine {
    /// The timestamp in milliseconds when this line should be displayed.
    pub time: f64,
    /// The lyric text for this line.
    pub text: String,
}

/// Lyrics parsed from an LRC file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncedLyrics {
    /// LRC header tags such as `ar` or `ti`.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// The timed lines, sorted by time.
    #[serde(default)]
    pub lines: Vec<LyricLine>,
}

/// Lyrics for a track, as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Lyrics {
    /// Unsynchronized text, usually embedded in the audio file's tags.
    Plain {
        /// Where the backend found the lyrics.
        #[serde(default)]
        source: String,
        /// The lyric text.
        content: String,
    },
    /// Timed lyrics.
    Synchronized {
        /// Where the backend found the lyrics.
        #[serde(default)]
        source: String,
        /// The parsed lines.
        content: SyncedLyrics,
    },
}
impl Lyrics {
    /// Whether the lyrics carry timing information.
    pub fn is_synced(&self) -> bool {
        matches!(self, Lyrics::Synchronized { .. })
    }

    /// Find the index of the current line based on the playback position in
    /// milliseconds. Returns 0 for unsynced lyrics or if no line matches.
    pub fn current_line(&self, position_ms: f64) -> usize {
        let Lyrics::Synchronized { content, .. } = self else {
            return 0;
        };
        content
            .lines
            .iter()
            .enumerate()
            .rev()
            .find(|(_, line)| line.time <= position_ms)
            .map(|(idx, _)| idx)
            .unwrap_or(0)
    }

    /// The lyrics as lines of text, without timing.
    pub fn lines(&self) -> Vec<&str> {
        match self {
            Lyrics::Plain { content, .. } => content.lines().collect(),
            Lyrics::Synchronized { content, .. } => {
                content.lines.iter().map(|l| l.text.as_str()).collect()
            }
        }
    }
}

/// Lyrics endpoints.
impl Client {
    /// Get the lyrics for a track. Returns `Ok(None)` if the backend has none.
    pub async fn get_lyrics(&self, track_id: &TrackId) -> ClientResult<Option<Lyrics>> {
        self.get_optional(&format!("lyrics/{track_id}")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_lyrics() {
        let lyrics: Lyrics = serde_json::from_str(
            r#"{"type": "plain", "source": "embedded", "content": "first\nsecond"}"#,
        )
        .unwrap();
        assert!(!lyrics.is_synced());
        assert_eq!(lyrics.lines(), vec!["first", "second"]);
        assert_eq!(lyrics.current_line(90_000.0), 0);
    }

    #[test]
    fn test_synced_lyrics_current_line() {
        let lyrics: Lyrics = serde_json::from_str(
            r#"{
                "type": "synchronized",
                "source": "lrc_file",
                "content": {
                    "metadata": {"ar": "Someone"},
                    "lines": [
                        {"time": 1000, "text": "one"},
                        {"time": 5000, "text": "two"},
                        {"time": 9000.5, "text": "three"}
                    ]
                }
            }"#,
        )
        .unwrap();
        assert!(lyrics.is_synced());
        assert_eq!(lyrics.current_line(0.0), 0);
        assert_eq!(lyrics.current_line(4999.0), 0);
        assert_eq!(lyrics.current_line(5000.0), 1);
        assert_eq!(lyrics.current_line(60_000.0), 2);
        assert_eq!(lyrics.lines(), vec!["one", "two", "three"]);
    }
}
