mod context;
mod orchestrator;
mod scheduler;
mod state;

pub use context::{default_state_path, SyncContext};
pub use orchestrator::{SyncMode, SyncOrchestrator, SyncOutcome, SyncPhase, SyncReport};
pub use scheduler::{Scheduler, STARTUP_DELAY, SYNC_INTERVAL};
pub use state::{SyncState, SyncStateStore};
