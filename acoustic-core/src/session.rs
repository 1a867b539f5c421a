use std::sync::{Arc, Mutex, RwLock};

use acoustic_api::{Client, ClientResult};
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
};

use crate::{
    Config, Gateway, PushChannel, PushConfig, PushEvent,
    reconciler::{Invalidation, Reconciler},
    status_store::{ApplyOutcome, StatusStore},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    InitialFetchFailed { error: String },
    ResyncFailed { error: String },
}
impl SessionError {
    /// Should be paired with [`Self::display_message`]
    pub fn display_name(&self) -> &'static str {
        match self {
            SessionError::InitialFetchFailed { .. } => "Failed to fetch player status",
            SessionError::ResyncFailed { .. } => "Failed to resync after reconnecting",
        }
    }

    /// Should be paired with [`Self::display_name`]
    pub fn display_message(&self) -> String {
        match self {
            SessionError::InitialFetchFailed { error } => error.clone(),
            SessionError::ResyncFailed { error } => {
                format!("The player status may be stale: {error}")
            }
        }
    }
}
impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.display_name(), self.display_message())
    }
}
impl std::error::Error for SessionError {}

/// Everything a UI needs to show and drive playback: the status store, the
/// reconciler feeding it, and the push channel feeding the reconciler.
///
/// Invalidations are fanned out over a broadcast channel; the session never
/// refetches library data itself.
pub struct Session<G: Gateway> {
    reconciler: Reconciler<G>,
    push: PushChannel,
    events_tx: mpsc::UnboundedSender<PushEvent>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<PushEvent>>>,
    invalidations: broadcast::Sender<Invalidation>,
    router: Mutex<Option<JoinHandle<()>>>,
    error: Arc<RwLock<Option<SessionError>>>,
}

impl Session<Client> {
    pub fn from_config(config: &Config) -> ClientResult<Self> {
        let client = Client::with_timeout(&config.server.base_url, config.request_timeout())?;
        Ok(Self::new(Arc::new(client), config.push_config()))
    }
}

impl<G: Gateway> Session<G> {
    pub fn new(gateway: Arc<G>, push_config: PushConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (invalidations, _) = broadcast::channel(100);
        Self {
            reconciler: Reconciler::new(gateway, StatusStore::new()),
            push: PushChannel::new(push_config),
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
            invalidations,
            router: Mutex::new(None),
            error: Arc::new(RwLock::new(None)),
        }
    }

    /// Open the push channel, start routing its events, and fetch the
    /// initial status. The push channel is opened first so that no change
    /// after the fetch can be missed.
    ///
    /// Must be called from within a tokio runtime. Calling it again only
    /// repeats the fetch.
    pub async fn start(&self) -> ClientResult<ApplyOutcome> {
        if let Some(events_rx) = self.events_rx.lock().unwrap().take() {
            *self.router.lock().unwrap() = Some(tokio::spawn(route(
                self.reconciler.clone(),
                events_rx,
                self.invalidations.clone(),
                self.error.clone(),
            )));
        }
        self.push.connect(self.events_tx.clone());

        match self.reconciler.refresh().await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                tracing::error!("initial status fetch failed: {e}");
                *self.error.write().unwrap() = Some(SessionError::InitialFetchFailed {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Tear down the push channel and stop routing events.
    pub fn shutdown(&self) {
        self.push.disconnect();
        if let Some(router) = self.router.lock().unwrap().take() {
            router.abort();
        }
    }

    pub fn reconciler(&self) -> &Reconciler<G> {
        &self.reconciler
    }

    pub fn store(&self) -> &StatusStore {
        self.reconciler.store()
    }

    pub fn push(&self) -> &PushChannel {
        &self.push
    }

    pub fn subscribe_invalidations(&self) -> broadcast::Receiver<Invalidation> {
        self.invalidations.subscribe()
    }

    pub fn last_error(&self) -> Option<SessionError> {
        self.error.read().unwrap().clone()
    }

    pub fn clear_error(&self) {
        *self.error.write().unwrap() = None;
    }
}
impl<G: Gateway> Drop for Session<G> {
    fn drop(&mut self) {
        if let Some(router) = self.router.get_mut().ok().and_then(|r| r.take()) {
            router.abort();
        }
    }
}

async fn route<G: Gateway>(
    reconciler: Reconciler<G>,
    mut events: mpsc::UnboundedReceiver<PushEvent>,
    invalidations: broadcast::Sender<Invalidation>,
    error: Arc<RwLock<Option<SessionError>>>,
) {
    let mut disconnected = false;
    while let Some(event) = events.recv().await {
        match &event {
            PushEvent::Disconnected => {
                tracing::warn!("push channel lost; status may go stale until it reconnects");
                disconnected = true;
            }
            PushEvent::Connected if disconnected => {
                disconnected = false;
                // Anything pushed while we were away is gone.
                tracing::info!("push channel reconnected, resyncing");
                let _ = invalidations.send(Invalidation::Library);
                tokio::spawn(resync(reconciler.clone(), error.clone()));
            }
            PushEvent::Connected => tracing::info!("push channel connected"),
            _ => {}
        }

        if let Some(invalidation) = reconciler.handle_push(event) {
            tracing::debug!("invalidating {invalidation:?}");
            // No receivers just means no UI is interested yet.
            let _ = invalidations.send(invalidation);
        }
    }
}

async fn resync<G: Gateway>(reconciler: Reconciler<G>, error: Arc<RwLock<Option<SessionError>>>) {
    if let Err(e) = reconciler.refresh().await {
        *error.write().unwrap() = Some(SessionError::ResyncFailed {
            error: e.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::atomic::Ordering, time::Duration};

    use super::*;
    use crate::{
        reconciler::tests::{FakeGateway, status, transport_error},
        status_store::{PlaybackPhase, Revision},
    };
    use acoustic_api::PlayerStatus;

    fn session() -> (Arc<FakeGateway>, Session<FakeGateway>) {
        let gateway = Arc::new(FakeGateway::default());
        let mut push_config = PushConfig::new("http://127.0.0.1:9");
        push_config.reconnect = false;
        (gateway.clone(), Session::new(gateway, push_config))
    }

    async fn next_invalidation(rx: &mut broadcast::Receiver<Invalidation>) -> Invalidation {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for invalidation")
            .unwrap()
    }

    async fn wait_for(mut condition: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("timed out waiting for condition");
    }

    #[tokio::test]
    async fn test_start_fetches_initial_status() {
        let (gateway, session) = session();
        gateway.respond(Ok(status("1", true)));

        let outcome = session.start().await.unwrap();
        assert_eq!(outcome, ApplyOutcome::Accepted(Revision(1)));
        assert_eq!(session.store().phase(), PlaybackPhase::Playing);
        assert_eq!(session.last_error(), None);
        session.shutdown();
        assert!(!session.push().is_active());
    }

    #[tokio::test]
    async fn test_initial_fetch_failure_is_recorded() {
        let (gateway, session) = session();
        gateway.respond(Err(transport_error()));

        assert!(session.start().await.is_err());
        assert_eq!(session.store().current(), PlayerStatus::idle());
        assert_eq!(session.store().phase(), PlaybackPhase::Idle);
        let error = session.last_error().unwrap();
        assert!(matches!(error, SessionError::InitialFetchFailed { .. }));
        assert_eq!(error.display_name(), "Failed to fetch player status");

        session.clear_error();
        assert_eq!(session.last_error(), None);
    }

    #[tokio::test]
    async fn test_scan_then_library_update_invalidates_once() {
        let (gateway, session) = session();
        gateway.respond(Ok(PlayerStatus::idle()));
        session.start().await.unwrap();
        let mut invalidations = session.subscribe_invalidations();

        session.reconciler().scan("/music").await.unwrap();
        session.events_tx.send(PushEvent::LibraryUpdated).unwrap();

        assert_eq!(
            next_invalidation(&mut invalidations).await,
            Invalidation::Library
        );
        // The UI decides to refetch.
        session.reconciler().albums().await.unwrap();
        assert_eq!(gateway.album_fetches.load(Ordering::SeqCst), 1);
        assert!(invalidations.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_push_status_reaches_store() {
        let (gateway, session) = session();
        gateway.respond(Ok(PlayerStatus::idle()));
        session.start().await.unwrap();

        session
            .events_tx
            .send(PushEvent::StatusChanged(status("4", true)))
            .unwrap();
        wait_for(|| session.store().current() == status("4", true)).await;
        assert_eq!(session.store().revision(), Revision(1));
    }

    #[tokio::test]
    async fn test_reconnect_resyncs_status() {
        let (gateway, session) = session();
        gateway.respond(Ok(status("1", true)));
        session.start().await.unwrap();
        let mut invalidations = session.subscribe_invalidations();

        // A first connect is not a reconnect.
        session.events_tx.send(PushEvent::Connected).unwrap();
        session.events_tx.send(PushEvent::Disconnected).unwrap();
        gateway.respond(Ok(status("2", false)));
        session.events_tx.send(PushEvent::Connected).unwrap();

        assert_eq!(
            next_invalidation(&mut invalidations).await,
            Invalidation::Library
        );
        wait_for(|| session.store().current() == status("2", false)).await;
        assert_eq!(gateway.calls(), vec!["get_status", "get_status"]);
    }

    #[tokio::test]
    async fn test_failed_resync_is_recorded() {
        let (gateway, session) = session();
        gateway.respond(Ok(status("1", true)));
        session.start().await.unwrap();

        session.events_tx.send(PushEvent::Disconnected).unwrap();
        gateway.respond(Err(transport_error()));
        session.events_tx.send(PushEvent::Connected).unwrap();

        wait_for(|| session.last_error().is_some()).await;
        assert!(matches!(
            session.last_error(),
            Some(SessionError::ResyncFailed { .. })
        ));
        assert_eq!(session.store().current(), status("1", true));
    }
}
