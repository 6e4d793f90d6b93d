//! Periodic housekeeping for sessions and throttling state.

pub mod cleanup;

pub use cleanup::{CleanupReport, SessionCleanup};
