//! Creating and replacing remote pages.

use tracing::{debug, info, warn};

use notionsync_common::{Error, Result};
use notionsync_notion::{
    Block, CreatePageRequest, ExternalFile, NotionApi, Page, PageProperty, PropertyValue,
    TAGS_PROPERTY,
};

use crate::config::SyncConfig;
use crate::limits::{overflow_chunks, split_for_submission, validate};

/// Property whose first text segment doubles as page cover and icon.
pub const IMAGE_PROPERTY: &str = "image";

/// How an already-synced document reaches the remote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UpdateStrategy {
    /// Delete the old page, then create a new one from scratch. The page id
    /// changes on every update.
    #[default]
    ReplaceWholePage,
}

/// Everything needed to submit one document.
#[derive(Debug, Clone, Default)]
pub struct PageDraft {
    pub title: String,
    pub tags: Option<Vec<String>>,
    pub content: Vec<Block>,
    pub properties: Vec<PageProperty>,
    /// Page created by a previous sync, if any.
    pub existing_id: Option<String>,
}

/// Result of a lifecycle run. The page exists whenever an outcome is returned.
#[derive(Debug)]
pub struct PageOutcome {
    pub page: Page,
    /// Id of the page this one replaces.
    pub replaced: Option<String>,
    /// Append requests that succeeded.
    pub appended_chunks: usize,
    /// Set when the overflow did not fully arrive.
    pub append_error: Option<Error>,
}

/// Drives a draft through validate, replace, create and append.
pub struct PageLifecycle<'a> {
    api: &'a dyn NotionApi,
    config: &'a SyncConfig,
    strategy: UpdateStrategy,
}

impl<'a> PageLifecycle<'a> {
    pub fn new(api: &'a dyn NotionApi, config: &'a SyncConfig) -> Self {
        Self {
            api,
            config,
            strategy: UpdateStrategy::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: UpdateStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Submit `draft` as a page of the configured database.
    ///
    /// # Errors
    /// - `Error::StructuralLimitExceeded` before any remote call
    /// - `Error::RemoteSyncFailed` if the create call fails
    ///
    /// Append failures do not fail the call; they are reported through
    /// [`PageOutcome::append_error`] since the page already exists.
    pub async fn sync(&self, draft: PageDraft) -> Result<PageOutcome> {
        validate(&draft.content)?;

        let replaced = match draft.existing_id.as_deref() {
            Some(existing) => {
                self.retire(existing).await;
                Some(existing.to_string())
            }
            None => None,
        };

        let (head, tail) = split_for_submission(draft.content);
        let request = self.build_request(&draft.title, draft.tags.as_deref(), draft.properties, head);

        let page = self
            .api
            .create_page(&request)
            .await
            .map_err(|e| Error::RemoteSyncFailed(e.to_string()))?;
        info!("Created page {} for {}", page.id, draft.title);

        let mut appended_chunks = 0;
        let mut append_error = None;
        for chunk in overflow_chunks(&tail) {
            debug!("Appending {} overflow blocks to {}", chunk.len(), page.id);
            if let Err(e) = self.api.append_children(&page.id, chunk).await {
                warn!(
                    "Append to {} failed after {} chunks: {}",
                    page.id, appended_chunks, e
                );
                append_error = Some(Error::AppendFailed {
                    page_id: page.id.clone(),
                    reason: e.to_string(),
                });
                break;
            }
            appended_chunks += 1;
        }

        Ok(PageOutcome {
            page,
            replaced,
            appended_chunks,
            append_error,
        })
    }

    /// Take the previous page out of the way before the new one is created.
    ///
    /// A failed delete is only logged and the create still runs, which can
    /// leave the old page alive next to the new one.
    async fn retire(&self, existing: &str) {
        match self.strategy {
            UpdateStrategy::ReplaceWholePage => {
                if let Err(e) = self.api.delete_block(existing).await {
                    warn!("Could not delete previous page {}: {}", existing, e);
                }
            }
        }
    }

    fn build_request(
        &self,
        title: &str,
        tags: Option<&[String]>,
        properties: Vec<PageProperty>,
        children: Vec<Block>,
    ) -> CreatePageRequest {
        let mut request = CreatePageRequest::new(self.config.database_id.clone(), title);

        if self.config.allow_tags {
            if let Some(tags) = tags {
                request.properties.insert(
                    TAGS_PROPERTY.to_string(),
                    PropertyValue::multi_select(tags.iter().cloned()),
                );
            }
        }

        if let Some(banner) = &self.config.banner_url {
            request.cover = Some(ExternalFile::new(banner.clone()));
        }

        for property in properties {
            if property.name == IMAGE_PROPERTY {
                if let Some(url) = first_text(&property.value) {
                    request.cover = Some(ExternalFile::new(url));
                    request.icon = Some(ExternalFile::new(url));
                }
            }
            request.properties.insert(property.name, property.value);
        }

        request.children = children;
        request
    }
}

fn first_text(value: &PropertyValue) -> Option<&str> {
    match value {
        PropertyValue::RichText(segments) => segments
            .first()
            .map(|s| s.plain_text())
            .filter(|text| !text.is_empty()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notionsync_common::ApiToken;
    use notionsync_notion::{ApiCall, MemoryNotion, RichText};
    use std::time::Duration;

    fn config() -> SyncConfig {
        SyncConfig {
            token: ApiToken::new("secret"),
            database_id: "db".to_string(),
            banner_url: None,
            vanity_id: None,
            allow_tags: false,
            request_interval: Duration::ZERO,
        }
    }

    fn draft(blocks: usize) -> PageDraft {
        PageDraft {
            title: "Foo".to_string(),
            content: (0..blocks).map(|i| Block::paragraph(format!("p{}", i))).collect(),
            ..PageDraft::default()
        }
    }

    fn created(remote: &MemoryNotion) -> Vec<CreatePageRequest> {
        remote
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                ApiCall::CreatePage(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_create_new_page() {
        let remote = MemoryNotion::new();
        let config = config();
        let outcome = PageLifecycle::new(&remote, &config)
            .sync(draft(3))
            .await
            .unwrap();

        assert!(outcome.replaced.is_none());
        assert_eq!(outcome.appended_chunks, 0);
        assert!(outcome.append_error.is_none());

        let requests = created(&remote);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].title(), Some("Foo"));
        assert_eq!(requests[0].parent.database_id, "db");
        assert_eq!(requests[0].children.len(), 3);
        assert!(!requests[0].properties.contains_key(TAGS_PROPERTY));
        assert_eq!(remote.page_count(), 1);
    }

    #[tokio::test]
    async fn test_replace_deletes_before_create() {
        let remote = MemoryNotion::new();
        remote.insert_page("abc", CreatePageRequest::new("db", "Foo"));
        let config = config();

        let mut draft = draft(1);
        draft.existing_id = Some("abc".to_string());
        let outcome = PageLifecycle::new(&remote, &config)
            .sync(draft)
            .await
            .unwrap();

        assert_eq!(outcome.replaced.as_deref(), Some("abc"));
        let calls = remote.calls();
        assert_eq!(calls[0], ApiCall::DeleteBlock("abc".to_string()));
        assert!(matches!(calls[1], ApiCall::CreatePage(_)));
        assert!(remote.page("abc").is_none());
        assert_eq!(remote.page_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_delete_still_creates() {
        let remote = MemoryNotion::new();
        remote.fail_delete(500);
        let config = config();

        let mut draft = draft(1);
        draft.existing_id = Some("gone".to_string());
        let outcome = PageLifecycle::new(&remote, &config).sync(draft).await;

        assert!(outcome.is_ok());
        assert_eq!(created(&remote).len(), 1);
    }

    #[tokio::test]
    async fn test_too_deep_makes_no_calls() {
        let remote = MemoryNotion::new();
        let config = config();
        let deep = Block::bullet("a").with_children(vec![Block::bullet("b").with_children(vec![
            Block::bullet("c").with_children(vec![Block::bullet("d")]),
        ])]);

        let draft = PageDraft {
            title: "Deep".to_string(),
            content: vec![deep],
            existing_id: Some("abc".to_string()),
            ..PageDraft::default()
        };
        let err = PageLifecycle::new(&remote, &config)
            .sync(draft)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::StructuralLimitExceeded { depth: 3, limit: 2 }));
        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn test_overflow_appended_in_chunks() {
        let remote = MemoryNotion::new();
        let config = config();
        let outcome = PageLifecycle::new(&remote, &config)
            .sync(draft(250))
            .await
            .unwrap();

        assert_eq!(outcome.appended_chunks, 2);
        let calls = remote.calls();
        assert_eq!(calls.len(), 3);
        let sizes: Vec<usize> = calls
            .iter()
            .map(|c| match c {
                ApiCall::CreatePage(r) => r.children.len(),
                ApiCall::AppendChildren { block_id, children } => {
                    assert_eq!(block_id, &outcome.page.id);
                    children.len()
                }
                other => panic!("unexpected call {other:?}"),
            })
            .collect();
        assert_eq!(sizes, vec![99, 99, 52]);
        assert_eq!(remote.page(&outcome.page.id).unwrap().children.len(), 250);
    }

    #[tokio::test]
    async fn test_append_failure_stops_chain() {
        let remote = MemoryNotion::new();
        remote.fail_append_after(1);
        let config = config();

        let outcome = PageLifecycle::new(&remote, &config)
            .sync(draft(300))
            .await
            .unwrap();

        assert_eq!(outcome.appended_chunks, 1);
        match outcome.append_error {
            Some(Error::AppendFailed { ref page_id, .. }) => assert_eq!(page_id, &outcome.page.id),
            ref other => panic!("unexpected append result {other:?}"),
        }
        // create + one good append + the failing one; the fourth chunk is never sent.
        assert_eq!(remote.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_create_failure() {
        let remote = MemoryNotion::new();
        remote.fail_create(400);
        let config = config();

        let err = PageLifecycle::new(&remote, &config)
            .sync(draft(200))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RemoteSyncFailed(_)));
        assert_eq!(remote.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_tags_only_when_allowed() {
        let remote = MemoryNotion::new();
        let mut draft = draft(1);
        draft.tags = Some(vec!["rust".to_string(), "sync".to_string()]);

        let config = config();
        PageLifecycle::new(&remote, &config)
            .sync(draft.clone())
            .await
            .unwrap();

        let mut allowed = config.clone();
        allowed.allow_tags = true;
        PageLifecycle::new(&remote, &allowed)
            .sync(draft)
            .await
            .unwrap();

        let requests = created(&remote);
        assert!(!requests[0].properties.contains_key(TAGS_PROPERTY));
        assert_eq!(
            requests[1].properties.get(TAGS_PROPERTY),
            Some(&PropertyValue::multi_select(["rust", "sync"]))
        );
    }

    #[tokio::test]
    async fn test_banner_and_image_property() {
        let remote = MemoryNotion::new();
        let mut config = config();
        config.banner_url = Some("https://img/banner.png".to_string());

        PageLifecycle::new(&remote, &config)
            .sync(draft(1))
            .await
            .unwrap();

        let mut with_image = draft(1);
        with_image.properties = vec![
            PageProperty::new("author", PropertyValue::RichText(vec![RichText::plain("Ann")])),
            PageProperty::new(
                IMAGE_PROPERTY,
                PropertyValue::RichText(vec![RichText::plain("https://img/own.png")]),
            ),
        ];
        PageLifecycle::new(&remote, &config)
            .sync(with_image)
            .await
            .unwrap();

        let requests = created(&remote);
        assert_eq!(requests[0].cover.as_ref().unwrap().url(), "https://img/banner.png");
        assert!(requests[0].icon.is_none());

        assert_eq!(requests[1].cover.as_ref().unwrap().url(), "https://img/own.png");
        assert_eq!(requests[1].icon.as_ref().unwrap().url(), "https://img/own.png");
        assert!(requests[1].properties.contains_key("author"));
        assert!(requests[1].properties.contains_key(IMAGE_PROPERTY));
    }
}
