//! Storage module for persisting fetched resources
//!
//! This module handles:
//! - Mapping URLs to a deterministic path under the output root
//! - Atomic, idempotent writes of fetched payloads
//! - Checking the output root is usable before a crawl starts

mod filesystem;
pub mod layout;
mod traits;

pub use filesystem::FsStorage;
pub use layout::{relative_path, INDEX_FILE};
pub use traits::{Storage, StorageError, StorageResult};
