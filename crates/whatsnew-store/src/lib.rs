//! Persisted notification state: the key-value contract, concrete stores, and
//! the upgrade tracker that reads and writes it.

mod error;
pub use error::StoreError;

mod file;
pub use file::JsonFileStore;

pub mod state;
pub use state::{MemoryStore, StateStore};

pub mod tracker;
pub use tracker::{Activation, Notification, Surface, UpgradeTracker};
