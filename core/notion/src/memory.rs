//! In-memory remote API for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use notionsync_common::{Error, Result};

use crate::api::NotionApi;
use crate::block::Block;
use crate::page::{CreatePageRequest, DatabaseInfo, Page};

/// A call observed by [`MemoryNotion`], in submission order.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    CreatePage(CreatePageRequest),
    DeleteBlock(String),
    AppendChildren { block_id: String, children: Vec<Block> },
    GetDatabase(String),
    QueryDatabase { database_id: String, filter: serde_json::Value },
    SearchDatabases,
}

/// Stored page.
#[derive(Debug, Clone)]
pub struct StoredPage {
    pub request: CreatePageRequest,
    pub children: Vec<Block>,
}

#[derive(Debug, Default)]
struct Failures {
    create: Option<u16>,
    delete: Option<u16>,
    /// Number of append calls that succeed before appends start failing.
    append_after: Option<usize>,
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<ApiCall>,
    pages: HashMap<String, StoredPage>,
    databases: Vec<DatabaseInfo>,
    appends_seen: usize,
    failures: Failures,
}

/// In-memory remote API.
///
/// Records every call and keeps created pages so tests can inspect both the
/// request order and the resulting remote state. Failures can be injected per
/// operation.
#[derive(Clone, Default)]
pub struct MemoryNotion {
    state: Arc<RwLock<State>>,
}

impl MemoryNotion {
    /// Create an empty remote.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a database returned by search and retrieve.
    pub fn with_database(self, id: impl Into<String>, title: impl Into<String>) -> Self {
        self.write().databases.push(DatabaseInfo {
            id: id.into(),
            title: title.into(),
        });
        self
    }

    /// Make every create call fail with `status`.
    pub fn fail_create(&self, status: u16) {
        self.write().failures.create = Some(status);
    }

    /// Make every delete call fail with `status`.
    pub fn fail_delete(&self, status: u16) {
        self.write().failures.delete = Some(status);
    }

    /// Let `successes` append calls through, then fail the rest.
    pub fn fail_append_after(&self, successes: usize) {
        self.write().failures.append_after = Some(successes);
    }

    /// Pre-populate a page, as if created by an earlier run.
    pub fn insert_page(&self, id: impl Into<String>, request: CreatePageRequest) {
        let children = request.children.clone();
        self.write()
            .pages
            .insert(id.into(), StoredPage { request, children });
    }

    /// All calls so far.
    pub fn calls(&self) -> Vec<ApiCall> {
        self.read().calls.clone()
    }

    /// A page by id.
    pub fn page(&self, id: &str) -> Option<StoredPage> {
        self.read().pages.get(id).cloned()
    }

    /// Number of live pages.
    pub fn page_count(&self) -> usize {
        self.read().pages.len()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn injected(status: u16) -> Error {
    Error::Api {
        status,
        message: "injected failure".to_string(),
    }
}

#[async_trait]
impl NotionApi for MemoryNotion {
    async fn create_page(&self, request: &CreatePageRequest) -> Result<Page> {
        let mut state = self.write();
        state.calls.push(ApiCall::CreatePage(request.clone()));

        if let Some(status) = state.failures.create {
            return Err(injected(status));
        }

        let id = Uuid::new_v4().to_string();
        let slug = request.title().unwrap_or("Untitled").replace(' ', "-");
        let url = format!("https://www.notion.so/{}-{}", slug, id.replace('-', ""));

        state.pages.insert(
            id.clone(),
            StoredPage {
                request: request.clone(),
                children: request.children.clone(),
            },
        );

        Ok(Page { id, url })
    }

    async fn delete_block(&self, block_id: &str) -> Result<()> {
        let mut state = self.write();
        state.calls.push(ApiCall::DeleteBlock(block_id.to_string()));

        if let Some(status) = state.failures.delete {
            return Err(injected(status));
        }

        match state.pages.remove(block_id) {
            Some(_) => Ok(()),
            None => Err(Error::NotFound(format!("Block not found: {}", block_id))),
        }
    }

    async fn append_children(&self, block_id: &str, children: &[Block]) -> Result<()> {
        let mut state = self.write();
        state.calls.push(ApiCall::AppendChildren {
            block_id: block_id.to_string(),
            children: children.to_vec(),
        });

        if let Some(successes) = state.failures.append_after {
            if state.appends_seen >= successes {
                return Err(injected(502));
            }
        }
        state.appends_seen += 1;

        match state.pages.get_mut(block_id) {
            Some(page) => {
                page.children.extend_from_slice(children);
                Ok(())
            }
            None => Err(Error::NotFound(format!("Block not found: {}", block_id))),
        }
    }

    async fn get_database(&self, database_id: &str) -> Result<DatabaseInfo> {
        let mut state = self.write();
        state.calls.push(ApiCall::GetDatabase(database_id.to_string()));
        state
            .databases
            .iter()
            .find(|db| db.id == database_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Database not found: {}", database_id)))
    }

    async fn query_database(
        &self,
        database_id: &str,
        filter: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let mut state = self.write();
        state.calls.push(ApiCall::QueryDatabase {
            database_id: database_id.to_string(),
            filter,
        });

        let results: Vec<serde_json::Value> = state
            .pages
            .iter()
            .filter(|(_, page)| page.request.parent.database_id == database_id)
            .map(|(id, page)| {
                serde_json::json!({
                    "object": "page",
                    "id": id,
                    "title": page.request.title(),
                })
            })
            .collect();

        Ok(serde_json::json!({
            "object": "list",
            "results": results,
            "has_more": false,
            "next_cursor": null
        }))
    }

    async fn search_databases(&self) -> Result<Vec<DatabaseInfo>> {
        let mut state = self.write();
        state.calls.push(ApiCall::SearchDatabases);
        Ok(state.databases.clone())
    }
}
