//! Template store client.
//!
//! This module provides:
//! - The `ObjectStore` trait separating "not found" from real failures
//! - HTTP, filesystem and in-memory backends
//! - A factory selecting the backend from configuration

mod backend;
mod factory;
mod filesystem_backend;
mod http_backend;
mod memory_backend;

pub use backend::{FetchOutcome, ObjectStore, StoreError};
pub use factory::create_object_store;
pub use filesystem_backend::FilesystemObjectStore;
pub use http_backend::HttpObjectStore;
pub use memory_backend::MemoryObjectStore;
