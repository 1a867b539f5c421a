use acoustic_core::{
    PlaybackPhase,
    api::{Album, Lyrics, PlayerStatus, Playlist, ScanResult, Track},
    util::{progress_string, seconds_to_hms_string},
};

fn phase_str(phase: PlaybackPhase) -> &'static str {
    match phase {
        PlaybackPhase::Idle => "Idle",
        PlaybackPhase::Playing => "Playing",
        PlaybackPhase::Paused => "Paused",
    }
}

/// One line summarising the player, e.g. `Playing: Artist - Title [1:05 / 3:33] vol 80`.
pub fn describe_status(status: &PlayerStatus, phase: PlaybackPhase) -> String {
    let mut out = phase_str(phase).to_string();
    if let Some(track) = &status.track {
        out += &format!(": {}", track.display_name());
        let duration = status.duration.or(track.duration);
        match status.position {
            Some(position) => out += &format!(" [{}]", progress_string(position, duration)),
            None => {
                if let Some(duration) = duration {
                    out += &format!(" [{}]", seconds_to_hms_string(duration));
                }
            }
        }
    }
    if let Some(volume) = status.volume {
        out += &format!(" vol {volume}");
    }
    out
}

pub fn describe_track(track: &Track) -> String {
    let mut out = track.display_name();
    if let Some(album) = track.album.as_deref().filter(|album| !album.is_empty()) {
        out += &format!(" ({album})");
    }
    if let Some(duration) = track.duration {
        out += &format!(" {}", seconds_to_hms_string(duration));
    }
    if let Some(id) = &track.id {
        out += &format!(" #{id}");
    }
    out
}

pub fn describe_album(album: &Album) -> String {
    format!("{} - {} #{}", album.artist, album.title, album.id)
}

pub fn describe_playlist(playlist: &Playlist) -> String {
    format!(
        "{} ({} track{}) #{}",
        playlist.name,
        playlist.track_count,
        if playlist.track_count == 1 { "" } else { "s" },
        playlist.id
    )
}

pub fn describe_scan(scan: &ScanResult) -> String {
    let counts = format!(
        "{} added, {} updated",
        scan.tracks_added, scan.tracks_updated
    );
    match &scan.message {
        Some(message) => format!("{message} ({counts})"),
        None => counts,
    }
}

/// The lyrics as printable lines. With a position, synced lyrics mark the
/// current line with `>`.
pub fn render_lyrics(lyrics: &Lyrics, position_secs: Option<f64>) -> Vec<String> {
    let current = match position_secs {
        Some(position) if lyrics.is_synced() => Some(lyrics.current_line(position * 1000.0)),
        _ => None,
    };
    lyrics
        .lines()
        .into_iter()
        .enumerate()
        .map(|(idx, line)| {
            if Some(idx) == current {
                format!("> {line}")
            } else {
                format!("  {line}")
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use acoustic_core::api::{AlbumId, LyricLine, PlaylistId, SyncedLyrics, TrackId};

    fn track() -> Track {
        Track {
            id: Some(TrackId::from("7")),
            title: "Blackbird".to_string(),
            artist: "The Beatles".to_string(),
            album: Some("The White Album".to_string()),
            path: "/music/blackbird.mp3".to_string(),
            duration: Some(138.0),
            track_num: Some(11),
            year: None,
            genre: None,
            album_art_path: None,
            has_thumbnail: false,
        }
    }

    #[test]
    fn test_describe_status() {
        assert_eq!(
            describe_status(&PlayerStatus::idle(), PlaybackPhase::Idle),
            "Idle"
        );

        let mut status = PlayerStatus::new(Some(track()), true);
        assert_eq!(
            describe_status(&status, PlaybackPhase::Playing),
            "Playing: The Beatles - Blackbird [2:18]"
        );

        status.position = Some(65.0);
        status.volume = Some(80);
        assert_eq!(
            describe_status(&status, PlaybackPhase::Playing),
            "Playing: The Beatles - Blackbird [1:05 / 2:18] vol 80"
        );
    }

    #[test]
    fn test_describe_listings() {
        assert_eq!(
            describe_track(&track()),
            "The Beatles - Blackbird (The White Album) 2:18 #7"
        );
        assert_eq!(
            describe_album(&Album {
                id: AlbumId("3".to_string()),
                title: "Abbey Road".to_string(),
                artist: "The Beatles".to_string(),
                art: None,
            }),
            "The Beatles - Abbey Road #3"
        );
        assert_eq!(
            describe_playlist(&Playlist {
                id: PlaylistId("1".to_string()),
                name: "Road trip".to_string(),
                track_count: 1,
            }),
            "Road trip (1 track) #1"
        );
        assert_eq!(
            describe_scan(&ScanResult {
                message: Some("Scan complete".to_string()),
                tracks_added: 3,
                ..ScanResult::default()
            }),
            "Scan complete (3 added, 0 updated)"
        );
    }

    #[test]
    fn test_describe_track_known_only_by_path() {
        let track = Track {
            id: None,
            title: "blackbird.mp3".to_string(),
            artist: String::new(),
            album: Some(String::new()),
            duration: None,
            ..track()
        };
        assert_eq!(describe_track(&track), "blackbird.mp3");
    }

    #[test]
    fn test_render_synced_lyrics_marks_current_line() {
        let lyrics = Lyrics::Synchronized {
            source: "lrc".to_string(),
            content: SyncedLyrics {
                metadata: Default::default(),
                lines: vec![
                    LyricLine {
                        time: 0.0,
                        text: "first".to_string(),
                    },
                    LyricLine {
                        time: 5000.0,
                        text: "second".to_string(),
                    },
                ],
            },
        };
        assert_eq!(
            render_lyrics(&lyrics, Some(6.0)),
            vec!["  first".to_string(), "> second".to_string()]
        );
        assert_eq!(
            render_lyrics(&lyrics, None),
            vec!["  first".to_string(), "  second".to_string()]
        );
    }
}
