use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::error::HostError;
use crate::models::{AskOptions, AskRequest, AskResponse, CreatedItem, NewItemSpec, PageDetail};

/// Guide structure storage owned by the host IDE.
#[async_trait]
pub trait GuideStructure: Send + Sync {
    async fn get_structure(&self) -> Result<serde_json::Value, HostError>;

    async fn get(&self, page_id: &str) -> Result<PageDetail, HostError>;

    /// Adds `item` under `parent_id` at `index` among its children.
    async fn add(
        &self,
        item: &NewItemSpec,
        parent_id: Option<&str>,
        index: Option<usize>,
    ) -> Result<CreatedItem, HostError>;
}

#[async_trait]
pub trait FileStore: Send + Sync {
    async fn get_content(&self, path: &str) -> Result<String, HostError>;

    async fn save(&self, path: &str, content: &str) -> Result<(), HostError>;
}

/// Coach chat panel.
#[async_trait]
pub trait ChatSurface: Send + Sync {
    async fn write(&self, message: &str) -> Result<(), HostError>;

    async fn show_menu(&self) -> Result<(), HostError>;
}

/// Anything that can answer a chat prompt.
#[async_trait]
pub trait Assistant: Send + Sync {
    async fn ask(&self, request: &AskRequest, options: AskOptions) -> anyhow::Result<AskResponse>;
}

/// The set of host capabilities a translation run needs.
pub struct Host<'a> {
    pub structure: &'a dyn GuideStructure,
    pub files: &'a dyn FileStore,
    pub chat: &'a dyn ChatSurface,
    pub assistant: &'a dyn Assistant,
}

/// HTTP bridge to the host IDE.
pub struct HostClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HostClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        HostClient {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, HostError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "(no body)".to_string());
            return Err(HostError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, HostError> {
        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| HostError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl GuideStructure for HostClient {
    async fn get_structure(&self) -> Result<serde_json::Value, HostError> {
        self.send_json(self.client.get(self.url("/guides/structure")))
            .await
    }

    async fn get(&self, page_id: &str) -> Result<PageDetail, HostError> {
        self.send_json(self.client.get(self.url(&format!("/guides/items/{page_id}"))))
            .await
    }

    async fn add(
        &self,
        item: &NewItemSpec,
        parent_id: Option<&str>,
        index: Option<usize>,
    ) -> Result<CreatedItem, HostError> {
        let body = json!({
            "item": item,
            "parentId": parent_id,
            "index": index,
        });
        self.send_json(self.client.post(self.url("/guides/items")).json(&body))
            .await
    }
}

#[async_trait]
impl FileStore for HostClient {
    async fn get_content(&self, path: &str) -> Result<String, HostError> {
        let response = self
            .send(self.client.get(self.url("/files")).query(&[("path", path)]))
            .await?;
        Ok(response.text().await?)
    }

    async fn save(&self, path: &str, content: &str) -> Result<(), HostError> {
        self.send(
            self.client
                .put(self.url("/files"))
                .query(&[("path", path)])
                .body(content.to_string()),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ChatSurface for HostClient {
    async fn write(&self, message: &str) -> Result<(), HostError> {
        self.send(
            self.client
                .post(self.url("/coach/messages"))
                .json(&json!({ "message": message })),
        )
        .await?;
        Ok(())
    }

    async fn show_menu(&self) -> Result<(), HostError> {
        self.send(self.client.post(self.url("/coach/menu"))).await?;
        Ok(())
    }
}

#[async_trait]
impl Assistant for HostClient {
    async fn ask(&self, request: &AskRequest, options: AskOptions) -> anyhow::Result<AskResponse> {
        let body = json!({ "request": request, "options": options });
        let response = self
            .send_json(self.client.post(self.url("/coach/ask")).json(&body))
            .await?;
        Ok(response)
    }
}
