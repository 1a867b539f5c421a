pub mod config;
pub mod push;
pub mod util;

mod gateway;
pub use gateway::Gateway;

mod status_store;
pub use status_store::{
    Action, ApplyOutcome, PlaybackPhase, Revision, StatusSource, StatusStore, StatusUpdate,
    SubscriptionId,
};

mod reconciler;
pub use reconciler::{Invalidation, Reconciler};

mod session;
pub use session::{Session, SessionError};

pub use acoustic_api as api;
pub use config::Config;
pub use push::{PushChannel, PushConfig, PushEvent};
