use serde::{Deserialize, Deserializer, Serialize};

use crate::{Client, ClientResult, track::deserialize_id};

/// An album ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AlbumId(pub String);
impl std::fmt::Display for AlbumId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl<'de> Deserialize<'de> for AlbumId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_id(deserializer).map(AlbumId)
    }
}

/// An album. Purely descriptive; carries no playback state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    /// The album ID
    pub id: AlbumId,
    /// The album title
    #[serde(default)]
    pub title: String,
    /// The album artist
    #[serde(default)]
    pub artist: String,
    /// A reference to the album art, if there is one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub art: Option<String>,
}

/// Album-related endpoints.
impl Client {
    /// Get every album in the library.
    pub async fn get_albums(&self) -> ClientResult<Vec<Album>> {
        self.get("library/albums", &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_album_without_art() {
        let albums: Vec<Album> = serde_json::from_str(
            r#"[{"id": 1, "title": "Blue", "artist": "Joni Mitchell"},
                {"id": 2, "title": "Hejira", "artist": "Joni Mitchell", "art": "/art/2.jpg"}]"#,
        )
        .unwrap();
        assert_eq!(albums.len(), 2);
        assert_eq!(albums[0].id, AlbumId("1".to_string()));
        assert_eq!(albums[0].art, None);
        assert_eq!(albums[1].art.as_deref(), Some("/art/2.jpg"));
    }
}
