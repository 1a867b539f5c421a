use std::sync::Arc;

use acoustic_core::{
    Invalidation, Session,
    api::{Client, ClientResult},
};
use tokio::io::{AsyncBufReadExt as _, BufReader};

use crate::display;

/// A line typed at the `watch` prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchCommand {
    Play(String),
    Pause,
    Resume,
    Toggle,
    Stop,
    Next,
    Previous,
    Seek(u64),
    Volume(u8),
    Status,
    Queue,
    Help,
    Quit,
}
impl WatchCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let number = |what: &str| {
            rest.parse::<u64>()
                .map_err(|_| format!("`{word}` expects {what}, got `{rest}`"))
        };

        Ok(match word {
            "play" if rest.is_empty() => return Err("`play` expects a path".to_string()),
            "play" => WatchCommand::Play(rest.to_string()),
            "pause" => WatchCommand::Pause,
            "resume" => WatchCommand::Resume,
            "toggle" | "t" => WatchCommand::Toggle,
            "stop" => WatchCommand::Stop,
            "next" | "n" => WatchCommand::Next,
            "previous" | "prev" | "p" => WatchCommand::Previous,
            "seek" => WatchCommand::Seek(number("milliseconds")?),
            "volume" | "vol" => WatchCommand::Volume(number("a level")?.min(100) as u8),
            "status" | "s" => WatchCommand::Status,
            "queue" | "q" => WatchCommand::Queue,
            "help" | "?" => WatchCommand::Help,
            "quit" | "exit" => WatchCommand::Quit,
            _ => return Err(format!("unknown command `{word}`, try `help`")),
        })
    }
}

const HELP: &str = "commands: play <path>, pause, resume, toggle, stop, next, prev, \
                    seek <ms>, volume <0-100>, status, queue, quit";

/// Follow the player until stdin closes or `quit` is entered.
pub async fn run(session: Session<Client>) -> anyhow::Result<()> {
    let session = Arc::new(session);

    // The callback holds a handle to the store it is registered on, so it
    // must be unsubscribed before leaving.
    let store = session.store().clone();
    let subscription = session.store().subscribe(move |update| {
        println!(
            "[{}] {} ({})",
            update.revision,
            display::describe_status(&update.status, store.phase()),
            update.source
        );
    });

    let invalidation_task = tokio::spawn({
        let session = session.clone();
        async move { follow_invalidations(&session).await }
    });

    if let Err(e) = session.start().await {
        // Keep going; the next push event fills the store in.
        eprintln!("Error: {e}");
    }
    println!("{HELP}");

    let result = read_commands(&session).await;

    session.store().unsubscribe(subscription);
    invalidation_task.abort();
    session.shutdown();
    result
}

async fn read_commands(session: &Session<Client>) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match WatchCommand::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };
        if command == WatchCommand::Quit {
            break;
        }
        if let Err(e) = execute(session, command).await {
            eprintln!("Error: {e}");
        }
        if let Some(error) = session.last_error() {
            eprintln!("{}: {}", error.display_name(), error.display_message());
            session.clear_error();
        }
    }
    Ok(())
}

async fn execute(session: &Session<Client>, command: WatchCommand) -> ClientResult<()> {
    let reconciler = session.reconciler();
    let outcome = match command {
        WatchCommand::Play(path) => reconciler.play(&path).await?,
        WatchCommand::Pause => reconciler.pause().await?,
        WatchCommand::Resume => reconciler.resume().await?,
        WatchCommand::Toggle => reconciler.toggle().await?,
        WatchCommand::Stop => reconciler.stop().await?,
        WatchCommand::Next => reconciler.next().await?,
        WatchCommand::Previous => reconciler.previous().await?,
        WatchCommand::Seek(position_ms) => reconciler.seek(position_ms).await?,
        WatchCommand::Volume(level) => reconciler.set_volume(level).await?,
        WatchCommand::Status => {
            let (status, revision) = session.store().snapshot();
            println!(
                "[{revision}] {}",
                display::describe_status(&status, session.store().phase())
            );
            return Ok(());
        }
        WatchCommand::Queue => {
            for (idx, track) in reconciler.queue().await?.iter().enumerate() {
                println!("{:>3}. {}", idx + 1, display::describe_track(track));
            }
            return Ok(());
        }
        WatchCommand::Help => {
            println!("{HELP}");
            return Ok(());
        }
        WatchCommand::Quit => return Ok(()),
    };
    if !outcome.is_accepted() {
        println!("(no change)");
    }
    Ok(())
}

async fn follow_invalidations(session: &Session<Client>) {
    let mut invalidations = session.subscribe_invalidations();
    loop {
        match invalidations.recv().await {
            Ok(Invalidation::Library) => match session.reconciler().albums().await {
                Ok(albums) => println!("library changed: {} albums", albums.len()),
                Err(e) => eprintln!("Error: failed to refetch albums: {e}"),
            },
            Ok(Invalidation::Playlist(change)) => println!("playlist changed: {change}"),
            Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("skipped {skipped} invalidations");
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
        }
    }
}
