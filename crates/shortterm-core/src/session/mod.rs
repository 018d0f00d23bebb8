//! Session lifecycle: persistence, recurring refresh and push delivery.

mod coordinator;
mod manager;
mod refresh;
mod state;

pub use coordinator::Coordinator;
pub use manager::{RestoreOutcome, STORAGE_KEY, SessionManager};
pub use refresh::{RefreshJob, RefreshTimer, spawn_push_forwarder};
pub use state::{Event, Generation, InboxState, InboxUpdate, Notice, NoticeLevel};
