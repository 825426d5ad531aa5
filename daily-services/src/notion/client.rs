//! Notion REST client: database queries and block reads/writes.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{ServiceError, ServiceResult};

const API_BASE: &str = "https://api.notion.com/v1";
const NOTION_VERSION: &str = "2022-06-28";

/// The workspace operations the fetcher and publisher rely on.
#[allow(async_fn_in_trait)]
pub trait WorkspaceApi {
    /// `POST /databases/{id}/query`; returns the `results` rows.
    async fn query_database(&self, database_id: &str, body: &Value) -> ServiceResult<Vec<Value>>;

    /// `GET /blocks/{id}/children`, all pages; returns the raw blocks.
    async fn list_children(&self, block_id: &str) -> ServiceResult<Vec<Value>>;

    /// `PATCH /blocks/{id}`
    async fn update_block(&self, block_id: &str, body: &Value) -> ServiceResult<()>;

    /// `PATCH /blocks/{id}/children`
    async fn append_children(&self, block_id: &str, body: &Value) -> ServiceResult<()>;
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    results: Vec<Value>,
    #[serde(default)]
    has_more: bool,
    next_cursor: Option<String>,
}

pub struct NotionClient {
    http: reqwest::Client,
    token: String,
}

impl NotionClient {
    pub fn new(http: reqwest::Client, token: impl Into<String>) -> Self {
        Self {
            http,
            token: token.into(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{}", API_BASE, path))
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> ServiceResult<reqwest::Response> {
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(ServiceError::from_response("Notion", response).await);
        }
        Ok(response)
    }
}

impl WorkspaceApi for NotionClient {
    async fn query_database(&self, database_id: &str, body: &Value) -> ServiceResult<Vec<Value>> {
        let request = self
            .request(reqwest::Method::POST, &format!("/databases/{}/query", database_id))
            .json(body);

        let page: ListResponse = self.send(request).await?.json().await?;
        Ok(page.results)
    }

    async fn list_children(&self, block_id: &str) -> ServiceResult<Vec<Value>> {
        let mut blocks = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut request = self
                .request(reqwest::Method::GET, &format!("/blocks/{}/children", block_id))
                .query(&[("page_size", "100")]);
            if let Some(ref c) = cursor {
                request = request.query(&[("start_cursor", c.as_str())]);
            }

            let page: ListResponse = self.send(request).await?.json().await?;
            blocks.extend(page.results);

            match page.next_cursor {
                Some(next) if page.has_more => cursor = Some(next),
                _ => break,
            }
        }

        Ok(blocks)
    }

    async fn update_block(&self, block_id: &str, body: &Value) -> ServiceResult<()> {
        let request = self
            .request(reqwest::Method::PATCH, &format!("/blocks/{}", block_id))
            .json(body);
        self.send(request).await?;
        Ok(())
    }

    async fn append_children(&self, block_id: &str, body: &Value) -> ServiceResult<()> {
        let request = self
            .request(reqwest::Method::PATCH, &format!("/blocks/{}/children", block_id))
            .json(body);
        self.send(request).await?;
        Ok(())
    }
}

