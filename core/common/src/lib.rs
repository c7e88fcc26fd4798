//! Common utilities and types shared across notionsync crates.
//!
//! Holds the error taxonomy used by every layer of the sync pipeline and the
//! small value types (document paths, API tokens) passed between them.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{ApiToken, DocumentPath};
