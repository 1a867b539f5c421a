use serde::{Deserialize, Deserializer, Serialize};

/// A track ID
///
/// The backend hands these out as integers; they are kept as strings so
/// that the client never has to interpret them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TrackId(pub String);
impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl From<&str> for TrackId {
    fn from(id: &str) -> Self {
        TrackId(id.to_string())
    }
}
impl<'de> Deserialize<'de> for TrackId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_id(deserializer).map(TrackId)
    }
}

/// Accepts either a JSON string or a JSON number as an identifier.
pub(crate) fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        String(String),
        Integer(i64),
        Float(f64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::String(id) => id,
        RawId::Integer(id) => id.to_string(),
        RawId::Float(id) => id.to_string(),
    })
}

/// Accepts a JSON string or `null`, the latter becoming an empty string.
/// Untagged files are stored without a title or artist.
pub(crate) fn deserialize_nullable_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A track in the backend's library.
///
/// Tracks are never mutated by the client, only replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// The track ID. Absent for tracks the backend only knows by path.
    #[serde(default)]
    pub id: Option<TrackId>,
    /// The track title; empty if the file is untagged.
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub title: String,
    /// The track artist; empty if the file is untagged.
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub artist: String,
    /// The album name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    /// The playable locator handed back to the backend; opaque to the client.
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub path: String,
    /// The duration in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// The track number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_num: Option<u32>,
    /// The release year
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// The genre
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    /// The path to the album art on the backend's disk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_art_path: Option<String>,
    /// Whether the backend has an embedded thumbnail for this track
    #[serde(default)]
    pub has_thumbnail: bool,
}
impl Track {
    /// The identity used to decide whether two tracks are "the same track":
    /// the ID when the backend gave one, the path otherwise.
    pub fn identity(&self) -> &str {
        match &self.id {
            Some(id) => &id.0,
            None => &self.path,
        }
    }

    /// A short human-readable description, e.g. `Artist - Title`.
    pub fn display_name(&self) -> String {
        match (self.artist.is_empty(), self.title.is_empty()) {
            (false, false) => format!("{} - {}", self.artist, self.title),
            (true, false) => self.title.clone(),
            _ => self.path.clone(),
        }
    }
}

/// The field the library listing is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackSort {
    /// Sort by title.
    #[default]
    Title,
    /// Sort by artist.
    Artist,
    /// Sort by album.
    Album,
}
impl TrackSort {
    /// The value the backend expects in its `sort_by` parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackSort::Title => "title",
            TrackSort::Artist => "artist",
            TrackSort::Album => "album",
        }
    }
}
