use serde::{Deserialize, Deserializer, Serialize};

use crate::{Client, ClientError, ClientResult, Track, TrackId, track::deserialize_id};

/// A playlist ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PlaylistId(pub String);
impl std::fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl<'de> Deserialize<'de> for PlaylistId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_id(deserializer).map(PlaylistId)
    }
}

/// A playlist, without its tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    /// The playlist ID
    pub id: PlaylistId,
    /// The playlist name
    #[serde(default)]
    pub name: String,
    /// The number of tracks in the playlist
    #[serde(default)]
    pub track_count: u32,
}

/// Playlist endpoints.
impl Client {
    /// Get all playlists.
    pub async fn get_playlists(&self) -> ClientResult<Vec<Playlist>> {
        self.get("playlists", &[]).await
    }

    /// Create a new, empty playlist.
    pub async fn create_playlist(&self, name: &str) -> ClientResult<Playlist> {
        #[derive(Serialize)]
        struct CreateRequest<'a> {
            name: &'a str,
        }
        if name.trim().is_empty() {
            return Err(ClientError::InvalidArgument(
                "playlist name must not be empty".to_string(),
            ));
        }
        self.post_json("playlists", &CreateRequest { name }).await
    }

    /// Delete a playlist.
    pub async fn delete_playlist(&self, id: &PlaylistId) -> ClientResult<()> {
        self.delete(&format!("playlists/{id}")).await
    }

    /// Get the tracks in a playlist, in order.
    pub async fn get_playlist_tracks(&self, id: &PlaylistId) -> ClientResult<Vec<Track>> {
        self.get(&format!("playlists/{id}/tracks"), &[]).await
    }

    /// Append a track to a playlist.
    pub async fn add_track_to_playlist(
        &self,
        id: &PlaylistId,
        track_id: &TrackId,
    ) -> ClientResult<()> {
        #[derive(Serialize)]
        struct AddRequest<'a> {
            track_id: &'a str,
        }
        self.post_json::<_, serde_json::Value>(
            &format!("playlists/{id}/tracks"),
            &AddRequest {
                track_id: &track_id.0,
            },
        )
        .await?;
        Ok(())
    }

    /// Remove the track at `index` from a playlist.
    pub async fn remove_track_from_playlist(
        &self,
        id: &PlaylistId,
        index: usize,
    ) -> ClientResult<()> {
        self.delete(&format!("playlists/{id}/tracks/{index}")).await
    }
}
