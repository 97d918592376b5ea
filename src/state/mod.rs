//! State module for tracking lookup progress
//!
//! # Components
//!
//! - `WorkerState`: Tracks where a detail worker is (fetching, parsing, emitting, done)
//! - `WorkerOutcome`: Records how a detail worker ended

mod worker_state;

// Re-export main types
pub use worker_state::{WorkerOutcome, WorkerState};
