//! Differential snapshot engine
//!
//! Compares the records acquired in the current run with the baseline left
//! by the previous successful run and classifies every canonical key.

pub mod diff;
pub mod report;
pub mod store;
pub mod types;

pub use diff::{changed_fields, diff};
pub use report::{DeltaReport, DeltaSummary, Differences, UpdatedEntry};
pub use store::{BaselineStore, SnapshotError};
pub use types::{DiffResult, Snapshot, SnapshotEntry, UpdatedRecord};
