// ABOUTME: Composable capability traits for the cloud service boundary.
// ABOUTME: Defines FleetOps, HealthOps, ObjectStore, ParameterStore, StackOps, and friends.

mod credentials;
mod fleet;
mod health;
mod images;
mod parameters;
mod pipeline;
mod shared_types;
mod stack;
mod storage;

pub use credentials::{CredentialBroker, CredentialError, TargetAccount};
pub use fleet::{FleetError, FleetOps};
pub use health::{HealthError, HealthOps};
pub use images::{ImageCatalog, ImageError};
pub use parameters::{ParameterError, ParameterStore};
pub use pipeline::{PipelineError, PipelineOps};
pub use shared_types::*;
pub use stack::{StackError, StackOps};
pub use storage::{ObjectStore, StorageError};
