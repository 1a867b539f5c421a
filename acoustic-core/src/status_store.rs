use std::sync::{
    Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard,
    atomic::{AtomicU64, Ordering},
};

use acoustic_api::PlayerStatus;

/// A counter bumped on every accepted status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Revision(pub u64);
impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// A user-initiated transport call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Play,
    Pause,
    Resume,
    Stop,
    Next,
    Previous,
    Seek,
    SetVolume,
    Refresh,
}
impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Play => "play",
            Action::Pause => "pause",
            Action::Resume => "resume",
            Action::Stop => "stop",
            Action::Next => "next",
            Action::Previous => "previous",
            Action::Seek => "seek",
            Action::SetVolume => "set volume",
            Action::Refresh => "refresh",
        }
    }
}
impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a candidate status came from. Informational only: it never changes
/// whether the candidate is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusSource {
    /// The result of a transport call.
    Request(Action),
    /// An unsolicited push event.
    Push,
}
impl std::fmt::Display for StatusSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusSource::Request(action) => write!(f, "{action} response"),
            StatusSource::Push => write!(f, "push"),
        }
    }
}

/// What subscribers receive after an accepted update.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub status: PlayerStatus,
    pub revision: Revision,
    pub source: StatusSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The candidate replaced the current status.
    Accepted(Revision),
    /// The candidate was structurally equal to the current status.
    Unchanged,
}
impl ApplyOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ApplyOutcome::Accepted(_))
    }
}

/// The client-side view of the playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackPhase {
    /// No track has ever been loaded.
    Idle,
    Playing,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Arc<dyn Fn(&StatusUpdate) + Send + Sync>;

/// The single source of truth for "what is currently playing".
///
/// Cloning gives another handle to the same store. Updates are
/// last-writer-wins by arrival: whichever candidate reaches [`Self::apply`]
/// last is current, unless it is structurally equal to what is already
/// there, in which case nothing happens.
#[derive(Clone)]
pub struct StatusStore {
    inner: Arc<Inner>,
}

struct Inner {
    state: RwLock<StoreState>,
    subscribers: Mutex<Vec<(SubscriptionId, Subscriber)>>,
    // Held across store + notify so deliveries never interleave.
    delivery: Mutex<()>,
    next_subscription_id: AtomicU64,
}

struct StoreState {
    status: PlayerStatus,
    revision: Revision,
    has_loaded_track: bool,
}

impl Default for StatusStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(StoreState {
                    status: PlayerStatus::idle(),
                    revision: Revision::default(),
                    has_loaded_track: false,
                }),
                subscribers: Mutex::new(vec![]),
                delivery: Mutex::new(()),
                next_subscription_id: AtomicU64::new(0),
            }),
        }
    }

    pub fn current(&self) -> PlayerStatus {
        self.read_state().status.clone()
    }

    pub fn revision(&self) -> Revision {
        self.read_state().revision
    }

    /// The current status and its revision, read together.
    pub fn snapshot(&self) -> (PlayerStatus, Revision) {
        let state = self.read_state();
        (state.status.clone(), state.revision)
    }

    pub fn phase(&self) -> PlaybackPhase {
        let state = self.read_state();
        if !state.has_loaded_track {
            PlaybackPhase::Idle
        } else if state.status.is_playing {
            PlaybackPhase::Playing
        } else {
            PlaybackPhase::Paused
        }
    }

    /// Offer a candidate status.
    ///
    /// Subscribers are called synchronously, on the calling thread, after
    /// the new value is visible through [`Self::current`]. They must not
    /// call `apply` themselves.
    pub fn apply(&self, candidate: PlayerStatus, source: StatusSource) -> ApplyOutcome {
        let _delivery = self.inner.delivery.lock().unwrap();

        let update = {
            let mut state = self.write_state();
            if state.status == candidate {
                tracing::debug!(
                    "ignoring {source}: status unchanged at {}",
                    state.revision
                );
                return ApplyOutcome::Unchanged;
            }

            state.revision = Revision(state.revision.0 + 1);
            state.has_loaded_track |= candidate.track.is_some();
            state.status = candidate.clone();
            StatusUpdate {
                status: candidate,
                revision: state.revision,
                source,
            }
        };
        tracing::debug!(
            "accepted {source} at {}: track={:?} playing={}",
            update.revision,
            update.status.track_identity(),
            update.status.is_playing
        );

        // Snapshot the subscriber list so callbacks may (un)subscribe.
        let subscribers: Vec<Subscriber> = self
            .inner
            .subscribers
            .lock()
            .unwrap()
            .iter()
            .map(|(_, subscriber)| subscriber.clone())
            .collect();
        for subscriber in subscribers {
            subscriber(&update);
        }

        ApplyOutcome::Accepted(update.revision)
    }

    pub fn subscribe(
        &self,
        callback: impl Fn(&StatusUpdate) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(
            self.inner
                .next_subscription_id
                .fetch_add(1, Ordering::Relaxed),
        );
        self.inner
            .subscribers
            .lock()
            .unwrap()
            .push((id, Arc::new(callback)));
        id
    }

    /// Returns `false` if `id` was not subscribed (e.g. already removed).
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.inner.subscribers.lock().unwrap();
        let before = subscribers.len();
        subscribers.retain(|(subscription_id, _)| *subscription_id != id);
        subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().unwrap().len()
    }
}
impl StatusStore {
    fn read_state(&self) -> RwLockReadGuard<'_, StoreState> {
        self.inner.state.read().unwrap()
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.inner.state.write().unwrap()
    }
}
