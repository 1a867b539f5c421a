use std::{future::Future, sync::Arc};

use acoustic_api::{Album, ClientResult, PlayerStatus, ScanResult, Track};
use serde_json::Value;

use crate::{
    Gateway, PushEvent,
    status_store::{Action, ApplyOutcome, StatusSource, StatusStore},
};

/// A signal that some data shown by the UI is stale and should be refetched.
/// Acting on it is the UI's job.
#[derive(Debug, Clone, PartialEq)]
pub enum Invalidation {
    /// Albums and tracks changed.
    Library,
    /// A playlist changed; carries the backend's description of the change.
    Playlist(Value),
}

/// Merges transport-call results and push events into the [`StatusStore`].
///
/// There is no ordering between the two sources: whichever status arrives
/// last wins. The backend attaches no sequence number to its statuses, so a
/// push computed before an action but delivered after its response will
/// overwrite the response until the next push or refresh corrects it.
pub struct Reconciler<G> {
    gateway: Arc<G>,
    store: StatusStore,
}
impl<G> Clone for Reconciler<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            store: self.store.clone(),
        }
    }
}

impl<G: Gateway> Reconciler<G> {
    pub fn new(gateway: Arc<G>, store: StatusStore) -> Self {
        Self { gateway, store }
    }

    pub fn store(&self) -> &StatusStore {
        &self.store
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    pub async fn refresh(&self) -> ClientResult<ApplyOutcome> {
        self.reconcile(Action::Refresh, self.gateway.get_status())
            .await
    }

    pub async fn play(&self, path: &str) -> ClientResult<ApplyOutcome> {
        self.reconcile(Action::Play, self.gateway.play(path)).await
    }

    pub async fn pause(&self) -> ClientResult<ApplyOutcome> {
        self.reconcile(Action::Pause, self.gateway.pause()).await
    }

    pub async fn resume(&self) -> ClientResult<ApplyOutcome> {
        self.reconcile(Action::Resume, self.gateway.resume()).await
    }

    /// Pause if playing, resume otherwise.
    pub async fn toggle(&self) -> ClientResult<ApplyOutcome> {
        if self.store.current().is_playing {
            self.pause().await
        } else {
            self.resume().await
        }
    }

    pub async fn stop(&self) -> ClientResult<ApplyOutcome> {
        self.reconcile(Action::Stop, self.gateway.stop()).await
    }

    pub async fn next(&self) -> ClientResult<ApplyOutcome> {
        self.reconcile(Action::Next, self.gateway.next()).await
    }

    pub async fn previous(&self) -> ClientResult<ApplyOutcome> {
        self.reconcile(Action::Previous, self.gateway.previous())
            .await
    }

    pub async fn seek(&self, position_ms: u64) -> ClientResult<ApplyOutcome> {
        self.reconcile(Action::Seek, self.gateway.seek(position_ms))
            .await
    }

    pub async fn set_volume(&self, level: u8) -> ClientResult<ApplyOutcome> {
        self.reconcile(Action::SetVolume, self.gateway.set_volume(level))
            .await
    }

    /// Route a push event. Status changes go to the store; everything the UI
    /// has to refetch is handed back as an [`Invalidation`].
    pub fn handle_push(&self, event: PushEvent) -> Option<Invalidation> {
        match event {
            PushEvent::StatusChanged(status) => {
                self.store.apply(status, StatusSource::Push);
                None
            }
            PushEvent::LibraryUpdated => Some(Invalidation::Library),
            PushEvent::PlaylistChanged(payload) => Some(Invalidation::Playlist(payload)),
            PushEvent::Connected | PushEvent::Disconnected => None,
        }
    }

    pub async fn queue(&self) -> ClientResult<Vec<Track>> {
        self.gateway.get_queue().await
    }

    pub async fn albums(&self) -> ClientResult<Vec<Album>> {
        self.gateway.get_albums().await
    }

    pub async fn search(&self, query: &str) -> ClientResult<Vec<Track>> {
        self.gateway.search_tracks(query).await
    }

    /// Scan a directory on the backend. The library change arrives later as
    /// a push event.
    pub async fn scan(&self, path: &str) -> ClientResult<ScanResult> {
        self.gateway.scan_directory(path).await
    }

    async fn reconcile(
        &self,
        action: Action,
        call: impl Future<Output = ClientResult<PlayerStatus>>,
    ) -> ClientResult<ApplyOutcome> {
        match call.await {
            Ok(status) => Ok(self.store.apply(status, StatusSource::Request(action))),
            Err(e) => {
                tracing::warn!("{action} failed: {e}");
                Err(e)
            }
        }
    }
}
