use std::future::Future;

use acoustic_api::{Album, Client, ClientResult, PlayerStatus, ScanResult, Track};

/// The backend operations the reconciler drives.
///
/// Mutating calls resolve to the status the backend reported when the call
/// completed. Implementations never touch the status store themselves.
pub trait Gateway: Send + Sync + 'static {
    fn get_status(&self) -> impl Future<Output = ClientResult<PlayerStatus>> + Send;
    fn play(&self, path: &str) -> impl Future<Output = ClientResult<PlayerStatus>> + Send;
    fn pause(&self) -> impl Future<Output = ClientResult<PlayerStatus>> + Send;
    fn resume(&self) -> impl Future<Output = ClientResult<PlayerStatus>> + Send;
    fn stop(&self) -> impl Future<Output = ClientResult<PlayerStatus>> + Send;
    fn next(&self) -> impl Future<Output = ClientResult<PlayerStatus>> + Send;
    fn previous(&self) -> impl Future<Output = ClientResult<PlayerStatus>> + Send;
    fn seek(&self, position_ms: u64) -> impl Future<Output = ClientResult<PlayerStatus>> + Send;
    fn set_volume(&self, level: u8) -> impl Future<Output = ClientResult<PlayerStatus>> + Send;

    fn get_queue(&self) -> impl Future<Output = ClientResult<Vec<Track>>> + Send;
    fn get_albums(&self) -> impl Future<Output = ClientResult<Vec<Album>>> + Send;
    fn search_tracks(&self, query: &str) -> impl Future<Output = ClientResult<Vec<Track>>> + Send;
    fn scan_directory(&self, path: &str) -> impl Future<Output = ClientResult<ScanResult>> + Send;
}

impl Gateway for Client {
    fn get_status(&self) -> impl Future<Output = ClientResult<PlayerStatus>> + Send {
        Client::get_status(self)
    }
    fn play(&self, path: &str) -> impl Future<Output = ClientResult<PlayerStatus>> + Send {
        Client::play(self, path)
    }
    fn pause(&self) -> impl Future<Output = ClientResult<PlayerStatus>> + Send {
        Client::pause(self)
    }
    fn resume(&self) -> impl Future<Output = ClientResult<PlayerStatus>> + Send {
        Client::resume(self)
    }
    fn stop(&self) -> impl Future<Output = ClientResult<PlayerStatus>> + Send {
        Client::stop(self)
    }
    fn next(&self) -> impl Future<Output = ClientResult<PlayerStatus>> + Send {
        Client::next(self)
    }
    fn previous(&self) -> impl Future<Output = ClientResult<PlayerStatus>> + Send {
        Client::previous(self)
    }
    fn seek(&self, position_ms: u64) -> impl Future<Output = ClientResult<PlayerStatus>> + Send {
        Client::seek(self, position_ms)
    }
    fn set_volume(&self, level: u8) -> impl Future<Output = ClientResult<PlayerStatus>> + Send {
        Client::set_volume(self, level)
    }

    fn get_queue(&self) -> impl Future<Output = ClientResult<Vec<Track>>> + Send {
        Client::get_queue(self)
    }
    fn get_albums(&self) -> impl Future<Output = ClientResult<Vec<Album>>> + Send {
        Client::get_albums(self)
    }
    fn search_tracks(&self, query: &str) -> impl Future<Output = ClientResult<Vec<Track>>> + Send {
        Client::search_tracks(self, query)
    }
    fn scan_directory(&self, path: &str) -> impl Future<Output = ClientResult<ScanResult>> + Send {
        Client::scan_directory(self, path)
    }
}
