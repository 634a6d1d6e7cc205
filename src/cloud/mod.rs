// ABOUTME: Cloud service boundary: capability traits and an in-memory backend.
// ABOUTME: Handlers receive these explicitly; nothing here is a process-wide client.

mod memory;
pub mod traits;

pub use memory::{
    Bucket, JobReport, MemoryCloud, StackState, StoredVersion, TargetGroupState, World,
};
pub use traits::*;
