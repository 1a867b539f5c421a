mod display;
mod watch;

use std::{path::PathBuf, sync::Arc};

use acoustic_core::{
    Config, Reconciler, Session, StatusStore,
    api::{Client, PlaylistId, TrackId, TrackSort},
};
use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file to read server and push settings from
    #[arg(long, default_value = Config::FILENAME)]
    config: PathBuf,

    /// Override the API base URL, e.g. http://localhost:5000/api
    #[arg(long)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show what is playing
    Status,
    /// Play a track by its path on the backend
    Play { path: String },
    Pause,
    Resume,
    /// Pause if playing, resume otherwise
    Toggle,
    Stop,
    Next,
    Previous,
    /// Seek within the current track
    Seek { position_ms: u64 },
    /// Set the volume (0-100)
    Volume { level: u8 },
    /// List the play queue
    Queue,
    /// List albums in the library
    Albums,
    /// List tracks in the library
    Tracks {
        #[arg(long, value_enum, default_value_t = SortBy::Title)]
        sort: SortBy,
        /// Only show tracks matching this filter
        #[arg(long, default_value = "")]
        filter: String,
    },
    /// Search the library
    Search { query: String },
    /// Scan a directory on the backend for new music
    Scan { path: String },
    /// List playlists
    Playlists,
    /// List the tracks of a playlist
    PlaylistTracks { playlist_id: String },
    CreatePlaylist { name: String },
    DeletePlaylist { playlist_id: String },
    /// Append a track to a playlist
    AddToPlaylist { playlist_id: String, track_id: String },
    /// Remove the track at an index from a playlist
    RemoveFromPlaylist { playlist_id: String, index: usize },
    /// Show the lyrics of a track
    Lyrics { track_id: String },
    /// Follow the player live, reading commands from stdin
    Watch,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortBy {
    Title,
    Artist,
    Album,
}
impl From<SortBy> for TrackSort {
    fn from(sort: SortBy) -> Self {
        match sort {
            SortBy::Title => TrackSort::Title,
            SortBy::Artist => TrackSort::Artist,
            SortBy::Album => TrackSort::Album,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // stdout belongs to the command output, so logs go to a file.
    let log_file = std::fs::File::create("acoustic.log")?;
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::sync::Mutex::new(log_file))
        .with_ansi(false);
    tracing_subscriber::registry()
        .with(file_layer)
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("acoustic=info")),
        )
        .init();

    let mut config = Config::load_from(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(base_url) = args.base_url {
        config.server.base_url = base_url;
    }

    run(&config, args.command).await
}

async fn run(config: &Config, command: Command) -> anyhow::Result<()> {
    let client = Arc::new(Client::with_timeout(
        &config.server.base_url,
        config.request_timeout(),
    )?);
    let reconciler = Reconciler::new(client.clone(), StatusStore::new());

    match command {
        Command::Status => reconciler.refresh().await.map(drop)?,
        Command::Play { path } => reconciler.play(&path).await.map(drop)?,
        Command::Pause => reconciler.pause().await.map(drop)?,
        Command::Resume => reconciler.resume().await.map(drop)?,
        Command::Toggle => {
            reconciler.refresh().await?;
            reconciler.toggle().await.map(drop)?
        }
        Command::Stop => reconciler.stop().await.map(drop)?,
        Command::Next => reconciler.next().await.map(drop)?,
        Command::Previous => reconciler.previous().await.map(drop)?,
        Command::Seek { position_ms } => reconciler.seek(position_ms).await.map(drop)?,
        Command::Volume { level } => reconciler.set_volume(level).await.map(drop)?,

        Command::Queue => {
            let queue = reconciler.queue().await?;
            if queue.is_empty() {
                println!("The queue is empty.");
            }
            for (idx, track) in queue.iter().enumerate() {
                println!("{:>3}. {}", idx + 1, display::describe_track(track));
            }
            return Ok(());
        }
        Command::Albums => {
            for album in reconciler.albums().await? {
                println!("{}", display::describe_album(&album));
            }
            return Ok(());
        }
        Command::Tracks { sort, filter } => {
            for track in client.get_tracks(sort.into(), &filter).await? {
                println!("{}", display::describe_track(&track));
            }
            return Ok(());
        }
        Command::Search { query } => {
            let results = reconciler.search(&query).await?;
            println!("{} result(s) for `{query}`", results.len());
            for track in results {
                println!("{}", display::describe_track(&track));
            }
            return Ok(());
        }
        Command::Scan { path } => {
            let scan = reconciler.scan(&path).await?;
            println!("{}", display::describe_scan(&scan));
            return Ok(());
        }

        Command::Playlists => {
            for playlist in client.get_playlists().await? {
                println!("{}", display::describe_playlist(&playlist));
            }
            return Ok(());
        }
        Command::PlaylistTracks { playlist_id } => {
            let tracks = client
                .get_playlist_tracks(&PlaylistId(playlist_id))
                .await?;
            for (idx, track) in tracks.iter().enumerate() {
                println!("{idx:>3}. {}", display::describe_track(track));
            }
            return Ok(());
        }
        Command::CreatePlaylist { name } => {
            let playlist = client.create_playlist(&name).await?;
            println!("Created {}", display::describe_playlist(&playlist));
            return Ok(());
        }
        Command::DeletePlaylist { playlist_id } => {
            client.delete_playlist(&PlaylistId(playlist_id)).await?;
            return Ok(());
        }
        Command::AddToPlaylist {
            playlist_id,
            track_id,
        } => {
            client
                .add_track_to_playlist(&PlaylistId(playlist_id), &TrackId(track_id))
                .await?;
            return Ok(());
        }
        Command::RemoveFromPlaylist { playlist_id, index } => {
            client
                .remove_track_from_playlist(&PlaylistId(playlist_id), index)
                .await?;
            return Ok(());
        }

        Command::Lyrics { track_id } => {
            let track_id = TrackId(track_id);
            let Some(lyrics) = client.get_lyrics(&track_id).await? else {
                println!("No lyrics found for track {track_id}.");
                return Ok(());
            };
            // Only mark a line if this track is the one playing.
            let status = client.get_status().await?;
            let position = status
                .track
                .as_ref()
                .filter(|track| track.id.as_ref() == Some(&track_id))
                .and(status.position);
            for line in display::render_lyrics(&lyrics, position) {
                println!("{line}");
            }
            return Ok(());
        }

        Command::Watch => return watch::run(Session::from_config(config)?).await,
    }

    let store = reconciler.store();
    println!(
        "{}",
        display::describe_status(&store.current(), store.phase())
    );
    Ok(())
}
