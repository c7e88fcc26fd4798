//! Document store abstraction for notionsync.
//!
//! This module provides a trait-based interface over the vault holding the
//! markdown documents to sync: a local filesystem implementation and an
//! in-memory one for tests.
//!
//! # Design Principles
//! - Store isolation: the sync engine never touches the filesystem directly
//! - Async operations: all I/O operations are async
//! - Vault-relative paths: documents are addressed by `DocumentPath`

pub mod local;
pub mod memory;
pub mod provider;

pub use local::LocalStore;
pub use memory::MemoryStore;
pub use provider::DocumentStore;
