//! Core pipeline logic: retries, the idempotency ledger, script
//! generation/parsing, audio rendering and the orchestrator that drives
//! them.

pub mod audio;
pub mod ledger;
pub mod orchestrator;
pub mod retry;
pub mod script;

pub use ledger::{migrate_legacy_file, Ledger, LedgerError, LedgerRecord, LEGACY_SHOW_ID};
pub use orchestrator::{Collaborators, Orchestrator};
pub use retry::{run_with_retry, RetryPolicy};
