//! Gateway service — CRUD against the remote page store.
//!
//! DESIGN
//! ======
//! `PageGateway` is the seam the sync service talks to; `HttpPageGateway`
//! is the production implementation over `reqwest`. Pages live under
//! `{base_url}/{tenant}/custom-objects/{key}` and travel wrapped in a
//! `{ "value": Page }` envelope.
//!
//! ERROR HANDLING
//! ==============
//! A non-success status maps to a fixed message per operation; that
//! message is the error's `Display` and is what ends up in the
//! controller's `error` field. Transport and decode failures keep the
//! underlying cause.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::grid::Page;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// ERRORS
// =============================================================================

/// Which gateway operation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayOp {
    FetchAll,
    FetchOne { key: String },
    Create,
    Update { key: String },
    Delete { key: String },
}

impl std::fmt::Display for GatewayOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FetchAll => write!(f, "Failed to fetch pages"),
            Self::FetchOne { key } => write!(f, "Failed to fetch page with key: {key}"),
            Self::Create => write!(f, "Failed to create page"),
            Self::Update { key } => write!(f, "Failed to update page with key: {key}"),
            Self::Delete { key } => write!(f, "Failed to delete page with key: {key}"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The store answered with a non-success status.
    #[error("{op}")]
    Status { op: GatewayOp, status: u16 },
    /// The request never produced a response.
    #[error("{op}: {source}")]
    Transport {
        op: GatewayOp,
        #[source]
        source: reqwest::Error,
    },
    /// The response body was not the expected envelope.
    #[error("{op}: invalid response body: {source}")]
    Decode {
        op: GatewayOp,
        #[source]
        source: reqwest::Error,
    },
    #[error("HTTP client build failed: {0}")]
    ClientBuild(reqwest::Error),
}

impl GatewayError {
    /// The operation-level message, without transport detail.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Status { op, .. } | Self::Transport { op, .. } | Self::Decode { op, .. } => op.to_string(),
            Self::ClientBuild(_) => self.to_string(),
        }
    }
}

// =============================================================================
// TRAIT
// =============================================================================

/// Remote page store operations, each page addressed by its key.
#[async_trait::async_trait]
pub trait PageGateway: Send + Sync {
    async fn fetch_pages(&self) -> Result<Vec<Page>, GatewayError>;
    async fn fetch_page(&self, key: &str) -> Result<Page, GatewayError>;
    async fn create_page(&self, page: &Page) -> Result<Page, GatewayError>;
    async fn update_page(&self, page: &Page) -> Result<Page, GatewayError>;
    async fn delete_page(&self, key: &str) -> Result<(), GatewayError>;
}

/// `{ "value": Page }` wrapper used by the store in both directions.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub value: T,
}

// =============================================================================
// HTTP
// =============================================================================

pub struct HttpPageGateway {
    http: reqwest::Client,
    base_url: String,
}

impl HttpPageGateway {
    /// Build a gateway rooted at `{base_url}/{tenant}`.
    ///
    /// # Errors
    ///
    /// Returns `ClientBuild` if the HTTP client cannot be constructed.
    pub fn new(base_url: &str, tenant: &str, request_timeout: Duration, connect_timeout: Duration) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(GatewayError::ClientBuild)?;
        let base_url = format!("{}/{}", base_url.trim_end_matches('/'), tenant);
        Ok(Self { http, base_url })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self) -> String {
        format!("{}/custom-objects", self.base_url)
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/custom-objects/{key}", self.base_url)
    }

    async fn send(&self, request: reqwest::RequestBuilder, op: &GatewayOp) -> Result<reqwest::Response, GatewayError> {
        let response = request
            .send()
            .await
            .map_err(|source| GatewayError::Transport { op: op.clone(), source })?;
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status { op: op.clone(), status: status.as_u16() });
        }
        Ok(response)
    }

    async fn send_page(&self, request: reqwest::RequestBuilder, op: GatewayOp) -> Result<Page, GatewayError> {
        let response = self.send(request, &op).await?;
        let body: Envelope<Page> = response
            .json()
            .await
            .map_err(|source| GatewayError::Decode { op, source })?;
        Ok(body.value)
    }
}

#[async_trait::async_trait]
impl PageGateway for HttpPageGateway {
    async fn fetch_pages(&self) -> Result<Vec<Page>, GatewayError> {
        let op = GatewayOp::FetchAll;
        let response = self
            .send(self.http.get(self.collection_url()), &op)
            .await?;
        let body: Vec<Envelope<Page>> = response
            .json()
            .await
            .map_err(|source| GatewayError::Decode { op, source })?;
        Ok(body.into_iter().map(|item| item.value).collect())
    }

    async fn fetch_page(&self, key: &str) -> Result<Page, GatewayError> {
        let request = self.http.get(self.object_url(key));
        self.send_page(request, GatewayOp::FetchOne { key: key.to_owned() })
            .await
    }

    async fn create_page(&self, page: &Page) -> Result<Page, GatewayError> {
        let request = self
            .http
            .post(self.object_url(&page.key))
            .json(&Envelope { value: page });
        self.send_page(request, GatewayOp::Create).await
    }

    async fn update_page(&self, page: &Page) -> Result<Page, GatewayError> {
        let request = self
            .http
            .put(self.object_url(&page.key))
            .json(&Envelope { value: page });
        self.send_page(request, GatewayOp::Update { key: page.key.clone() })
            .await
    }

    async fn delete_page(&self, key: &str) -> Result<(), GatewayError> {
        let op = GatewayOp::Delete { key: key.to_owned() };
        self.send(self.http.delete(self.object_url(key)), &op)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "gateway_test.rs"]
mod tests;
