#![forbid(unsafe_code)]

pub mod document;
pub mod local;
pub mod repository;

pub use local::LocalStorage;
pub use repository::{InMemoryStorage, KeyValueStore, StorageError};
