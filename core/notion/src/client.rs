//! Notion REST API client.

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use notionsync_common::{ApiToken, Error, Result};

use crate::api::NotionApi;
use crate::block::Block;
use crate::page::{
    AppendChildrenRequest, CreatePageRequest, DatabaseInfo, DatabaseObject, Page, SearchResponse,
};

/// Notion API base URL.
pub const NOTION_API_BASE: &str = "https://api.notion.com/v1";
/// API version pinned for every request.
pub const NOTION_VERSION: &str = "2022-06-28";

/// Error body returned by the API on failure.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// HTTP implementation of [`NotionApi`].
pub struct HttpNotionClient {
    http: Client,
    token: ApiToken,
    base_url: String,
}

impl HttpNotionClient {
    /// Create a new client authenticated with `token`.
    pub fn new(token: ApiToken) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("notionsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            token,
            base_url: NOTION_API_BASE.to_string(),
        })
    }

    /// Send requests to another base URL, e.g. a forwarding proxy.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, self.url(path))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token.expose()))
            .header("Notion-Version", NOTION_VERSION)
    }

    /// Handle API response with error checking.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| Error::Network(format!("Failed to parse response: {}", e)))
        } else {
            Err(self.error_from(response).await)
        }
    }

    /// Check status only, discarding the body on success.
    async fn handle_empty(&self, response: reqwest::Response) -> Result<()> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(self.error_from(response).await)
        }
    }

    async fn error_from(&self, response: reqwest::Response) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ApiErrorBody>(&body) {
            Ok(parsed) if !parsed.message.is_empty() => {
                format!("{}: {}", parsed.code, parsed.message)
            }
            _ => body,
        };

        if status == StatusCode::NOT_FOUND {
            Error::NotFound(message)
        } else {
            Error::Api {
                status: status.as_u16(),
                message,
            }
        }
    }
}

#[async_trait]
impl NotionApi for HttpNotionClient {
    async fn create_page(&self, request: &CreatePageRequest) -> Result<Page> {
        debug!(
            "Creating page {:?} with {} children",
            request.title(),
            request.children.len()
        );

        let response = self
            .request(reqwest::Method::POST, "pages")
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to create page: {}", e)))?;

        self.handle_response(response).await
    }

    async fn delete_block(&self, block_id: &str) -> Result<()> {
        let response = self
            .request(reqwest::Method::DELETE, &format!("blocks/{}", block_id))
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to delete block: {}", e)))?;

        self.handle_empty(response).await
    }

    async fn append_children(&self, block_id: &str, children: &[Block]) -> Result<()> {
        debug!("Appending {} children to {}", children.len(), block_id);

        let response = self
            .request(reqwest::Method::PATCH, &format!("blocks/{}/children", block_id))
            .json(&AppendChildrenRequest { children })
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to append children: {}", e)))?;

        self.handle_empty(response).await
    }

    async fn get_database(&self, database_id: &str) -> Result<DatabaseInfo> {
        let response = self
            .request(reqwest::Method::GET, &format!("databases/{}", database_id))
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to get database: {}", e)))?;

        let database: DatabaseObject = self.handle_response(response).await?;
        Ok(database.into_info())
    }

    async fn query_database(
        &self,
        database_id: &str,
        filter: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let response = self
            .request(
                reqwest::Method::POST,
                &format!("databases/{}/query", database_id),
            )
            .json(&filter)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to query database: {}", e)))?;

        self.handle_response(response).await
    }

    async fn search_databases(&self) -> Result<Vec<DatabaseInfo>> {
        let mut databases = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut body = serde_json::json!({
                "filter": {
                    "value": "database",
                    "property": "object"
                }
            });
            if let Some(start) = &cursor {
                body["start_cursor"] = serde_json::json!(start);
            }

            let response = self
                .request(reqwest::Method::POST, "search")
                .json(&body)
                .send()
                .await
                .map_err(|e| Error::Network(format!("Failed to search databases: {}", e)))?;

            let page: SearchResponse = self.handle_response(response).await?;
            let next = if page.has_more {
                page.next_cursor.clone()
            } else {
                None
            };
            databases.extend(page.into_databases());

            match next {
                Some(token) => cursor = Some(token),
                None => break,
            }
        }

        Ok(databases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_building() {
        let client = HttpNotionClient::new(ApiToken::new("secret"))
            .unwrap()
            .with_base_url("http://localhost:8080/v1/");
        assert_eq!(client.url("pages"), "http://localhost:8080/v1/pages");
        assert_eq!(client.url("/blocks/x/children"), "http://localhost:8080/v1/blocks/x/children");
    }

    #[test]
    fn test_default_base_url() {
        let client = HttpNotionClient::new(ApiToken::new("secret")).unwrap();
        assert_eq!(client.url("search"), "https://api.notion.com/v1/search");
    }

    #[test]
    fn test_request_carries_auth_and_version_headers() {
        let client = HttpNotionClient::new(ApiToken::new("secret")).unwrap();
        let request = client
            .request(reqwest::Method::DELETE, "blocks/abc")
            .build()
            .unwrap();

        assert_eq!(request.method(), reqwest::Method::DELETE);
        assert_eq!(request.url().as_str(), "https://api.notion.com/v1/blocks/abc");
        assert_eq!(
            request.headers().get(header::AUTHORIZATION).unwrap(),
            "Bearer secret"
        );
        assert_eq!(request.headers().get("Notion-Version").unwrap(), NOTION_VERSION);
    }
}
