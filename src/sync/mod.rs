// ABOUTME: Client-side polling and synchronization engine
// ABOUTME: Change detection, polling config, page signals and the synchronizer itself

pub mod binding;
pub mod config;
pub mod detect;
pub mod signals;
pub mod state;
pub mod synchronizer;

pub use binding::KeyedSynchronizer;
pub use config::{PollingConfig, SyncConfigError};
pub use detect::{ChangeDetector, FieldRules, JsonChangeDetector, DEFAULT_TOLERANCE};
pub use signals::PageSignals;
pub use state::SyncState;
pub use synchronizer::{CycleOutcome, SkipReason, Synchronizer, Trigger};
