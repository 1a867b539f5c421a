use serde::{Deserialize, Deserializer, Serialize};

use crate::{Client, ClientResult, Track};

/// A snapshot of the backend's playback state at the moment it was produced.
///
/// Two statuses are equal when they name the same track (by
/// [`Track::identity`]) and agree on whether it is playing. Everything else
/// (position, volume, other track fields) is carried along but ignored by
/// equality.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlayerStatus {
    /// The loaded track, if any.
    pub track: Option<Track>,
    /// Whether the track is playing.
    pub is_playing: bool,
    /// The playback position in seconds, if reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<f64>,
    /// The duration of the loaded track in seconds, if reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// The volume (0-100), if reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<u8>,
}
impl PlayerStatus {
    /// The status before anything has been fetched: no track, not playing.
    pub fn idle() -> Self {
        Self::default()
    }

    /// A status with only the fields that take part in equality.
    pub fn new(track: Option<Track>, is_playing: bool) -> Self {
        Self {
            track,
            is_playing,
            ..Self::default()
        }
    }

    /// The identity of the loaded track, if any.
    pub fn track_identity(&self) -> Option<&str> {
        self.track.as_ref().map(Track::identity)
    }
}
impl PartialEq for PlayerStatus {
    fn eq(&self, other: &Self) -> bool {
        (self.track_identity(), self.is_playing) == (other.track_identity(), other.is_playing)
    }
}
impl Eq for PlayerStatus {}

impl<'de> Deserialize<'de> for PlayerStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // The backend family reports status in two shapes: the compact
        // `{track, is_playing}` and the player's own
        // `{current_track, state, position, duration, volume}`.
        #[derive(Deserialize)]
        struct RawStatus {
            #[serde(default, alias = "current_track")]
            track: Option<Track>,
            #[serde(default, alias = "isPlaying")]
            is_playing: Option<bool>,
            #[serde(default)]
            state: Option<String>,
            #[serde(default)]
            position: Option<f64>,
            #[serde(default)]
            duration: Option<f64>,
            #[serde(default)]
            volume: Option<i64>,
        }

        let raw = RawStatus::deserialize(deserializer)?;
        let is_playing = raw.is_playing.unwrap_or_else(|| {
            raw.state
                .as_deref()
                .is_some_and(|state| state.to_ascii_lowercase().contains("playing"))
        });
        Ok(PlayerStatus {
            track: raw.track,
            is_playing,
            position: raw.position,
            duration: raw.duration,
            volume: raw.volume.map(|v| v.clamp(0, 100) as u8),
        })
    }
}

/// Player endpoints. Every mutating call returns the status the backend
/// reported when the call completed.
impl Client {
    /// Get the current player status.
    pub async fn get_status(&self) -> ClientResult<PlayerStatus> {
        self.get("player/status", &[]).await
    }

    /// Play the track at `path`.
    pub async fn play(&self, path: &str) -> ClientResult<PlayerStatus> {
        #[derive(Serialize)]
        struct PlayRequest<'a> {
            path: &'a str,
        }
        self.post_json("player/play", &PlayRequest { path }).await
    }

    /// Pause playback.
    pub async fn pause(&self) -> ClientResult<PlayerStatus> {
        self.post("player/pause").await
    }

    /// Resume paused playback.
    pub async fn resume(&self) -> ClientResult<PlayerStatus> {
        self.post("player/resume").await
    }

    /// Stop playback.
    pub async fn stop(&self) -> ClientResult<PlayerStatus> {
        self.post("player/stop").await
    }

    /// Skip to the next track.
    pub async fn next(&self) -> ClientResult<PlayerStatus> {
        self.post("player/next").await
    }

    /// Go back to the previous track.
    pub async fn previous(&self) -> ClientResult<PlayerStatus> {
        self.post("player/previous").await
    }

    /// Seek to `position_ms` milliseconds into the loaded track.
    pub async fn seek(&self, position_ms: u64) -> ClientResult<PlayerStatus> {
        #[derive(Serialize)]
        struct SeekRequest {
            position: u64,
        }
        self.post_json(
            "player/seek",
            &SeekRequest {
                position: position_ms,
            },
        )
        .await
    }

    /// Set the volume. Levels above 100 are clamped.
    pub async fn set_volume(&self, level: u8) -> ClientResult<PlayerStatus> {
        #[derive(Serialize)]
        struct VolumeRequest {
            level: u8,
        }
        if level > 100 {
            tracing::warn!("volume {level} out of range, clamping to 100");
        }
        self.post_json(
            "player/volume",
            &VolumeRequest {
                level: level.min(100),
            },
        )
        .await
    }

    /// Get the play queue, in next-to-play order.
    pub async fn get_queue(&self) -> ClientResult<Vec<Track>> {
        self.get("player/queue", &[]).await
    }
}
