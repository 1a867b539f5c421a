use serde::{Deserialize, Serialize};

use crate::{Client, ClientError, ClientResult, Track, TrackId, TrackSort};

/// The outcome of a library scan.
///
/// The backend's answer is loosely specified, so every field is optional and
/// the raw body is kept around.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanResult {
    /// A human-readable summary.
    pub message: Option<String>,
    /// How many tracks were added.
    pub tracks_added: u32,
    /// How many existing tracks were updated.
    pub tracks_updated: u32,
    /// The unparsed response body.
    #[serde(skip)]
    pub raw: serde_json::Value,
}

#[derive(Deserialize)]
struct ThumbnailResponse {
    thumbnail: String,
}

/// Library endpoints.
impl Client {
    /// Get the tracks in the library, sorted by `sort` and, if `filter` is
    /// non-empty, restricted to those matching it.
    pub async fn get_tracks(&self, sort: TrackSort, filter: &str) -> ClientResult<Vec<Track>> {
        let mut parameters = vec![("sort_by", sort.as_str().to_string())];
        if !filter.is_empty() {
            parameters.push(("filter", filter.to_string()));
        }
        self.get("library/tracks", &parameters).await
    }

    /// Search the library for tracks matching `query`.
    ///
    /// # Errors
    ///
    /// An empty query is rejected without making a request, as the backend
    /// would refuse it anyway.
    pub async fn search_tracks(&self, query: &str) -> ClientResult<Vec<Track>> {
        if query.trim().is_empty() {
            return Err(ClientError::InvalidArgument(
                "search query must not be empty".to_string(),
            ));
        }
        self.get("library/search", &[("query", query.to_string())])
            .await
    }

    /// Ask the backend to scan the directory at `path` (on the backend's
    /// machine) for audio files.
    pub async fn scan_directory(&self, path: &str) -> ClientResult<ScanResult> {
        #[derive(Serialize)]
        struct ScanRequest<'a> {
            path: &'a str,
        }
        let raw: serde_json::Value = self
            .post_json("library/scan", &ScanRequest { path })
            .await?;
        let mut result = ScanResult::deserialize(&raw).unwrap_or_default();
        result.raw = raw;
        Ok(result)
    }

    /// The URL the backend serves the album art for `track_id` from.
    pub fn album_art_url(&self, track_id: &TrackId) -> String {
        self.url(&format!("library/art/{track_id}"))
    }

    /// Get the embedded album art thumbnail for a track as a base64 `data:`
    /// URL, or `None` if the track has none.
    pub async fn get_track_thumbnail(&self, track_id: &TrackId) -> ClientResult<Option<String>> {
        Ok(self
            .get_optional::<ThumbnailResponse>(&format!("library/tracks/{track_id}/thumbnail"))
            .await?
            .map(|response| response.thumbnail))
    }
}
