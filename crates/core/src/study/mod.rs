//! Study data access: the remote store port and its offline adapter

pub mod offline;
pub mod ports;

pub use offline::OfflineStudyStore;
pub use ports::StudyStore;
