//! Remote API trait definition.

use async_trait::async_trait;

use notionsync_common::Result;

use crate::block::Block;
use crate::page::{CreatePageRequest, DatabaseInfo, Page};

/// Operations the sync engine needs from the remote document API.
///
/// Implementations own authentication and transport. None of them retry;
/// every failure is returned to the caller as-is.
#[async_trait]
pub trait NotionApi: Send + Sync {
    /// Create a page under a database.
    ///
    /// # Errors
    /// - `Error::Api` for a non-success response
    /// - `Error::Network` for transport failures
    async fn create_page(&self, request: &CreatePageRequest) -> Result<Page>;

    /// Delete (archive) a page or block by id.
    async fn delete_block(&self, block_id: &str) -> Result<()>;

    /// Append children to an existing page or block.
    ///
    /// # Preconditions
    /// - `children` holds at most the per-request block limit
    async fn append_children(&self, block_id: &str, children: &[Block]) -> Result<()>;

    /// Retrieve a database summary.
    async fn get_database(&self, database_id: &str) -> Result<DatabaseInfo>;

    /// Query a database with a raw filter body and return the raw response.
    async fn query_database(
        &self,
        database_id: &str,
        filter: serde_json::Value,
    ) -> Result<serde_json::Value>;

    /// List the full-page databases shared with the integration.
    async fn search_databases(&self) -> Result<Vec<DatabaseInfo>>;
}
