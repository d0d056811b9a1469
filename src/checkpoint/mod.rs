//! Crash-recovery checkpoints
//!
//! Progress is saved after every category so an interrupted run resumes at
//! the first unfinished category without re-accumulating records.

pub mod manager;
pub mod types;

pub use manager::{CheckpointError, CheckpointManager};
pub use types::Checkpoint;
