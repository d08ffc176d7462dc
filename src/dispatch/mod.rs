// Public API - what other modules can use
pub use actions::{Action, ActionOutcome};
pub use dedup::{DedupCache, DedupConfig, DedupStatus, DispatchResult};
pub use dispatcher::MessageDispatcher;
pub use errors::DispatchError;

// Internal modules
mod actions;
mod dedup;
mod dispatcher;
mod errors;
