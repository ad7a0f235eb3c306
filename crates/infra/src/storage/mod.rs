//! Local key-value storage backends for the offline queue

pub mod file_store;

pub use file_store::FileKeyValueStore;
