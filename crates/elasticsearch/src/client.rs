//! Search engine client.
//!
//! [`SearchClient`] is the seam between the scaler and the cluster; the
//! scaler only ever sees raw response bytes or an error. [`HttpSearchClient`]
//! implements it over the REST API with reqwest.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use tracing::debug;

use esscale_core::ScalerError;

use crate::metadata::ElasticsearchMetadata;

/// Longest slice of an error response body carried into an error message.
const MAX_ERROR_BODY: usize = 1024;

/// Abstraction over the search engine connection.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Verify the cluster is reachable and accepts our credentials.
    async fn ping(&self) -> Result<(), ScalerError>;

    /// Run a templated search against `indexes` and return the full body.
    ///
    /// Non-success statuses (template or index not found, auth rejected)
    /// are errors. Nothing is retried.
    async fn search_template(&self, indexes: &[String], query: &Value)
        -> Result<Bytes, ScalerError>;
}

/// REST client for one cluster.
///
/// Requests rotate round-robin over the configured addresses. A failed
/// request is reported as is, not replayed on the next node.
pub struct HttpSearchClient {
    client: reqwest::Client,
    addresses: Vec<String>,
    next: AtomicUsize,
    username: Option<String>,
    password: Option<String>,
}

impl HttpSearchClient {
    pub fn new(meta: &ElasticsearchMetadata) -> Result<Self, ScalerError> {
        if meta.addresses.is_empty() || meta.addresses.iter().any(|a| a.trim().is_empty()) {
            return Err(ScalerError::config("addresses", "no usable address given"));
        }

        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(meta.unsafe_ssl)
            .build()
            .map_err(|e| ScalerError::Connection(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            addresses: meta
                .addresses
                .iter()
                .map(|a| a.trim_end_matches('/').to_string())
                .collect(),
            next: AtomicUsize::new(0),
            username: meta.username.clone(),
            password: meta.password.clone(),
        })
    }

    fn next_address(&self) -> &str {
        let i = self.next.fetch_add(1, Ordering::Relaxed) % self.addresses.len();
        &self.addresses[i]
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.username {
            Some(user) => request.basic_auth(user, self.password.as_ref()),
            None => request,
        }
    }

    /// Send `request`, drain the body and turn a non-2xx status into an error.
    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<Bytes, ScalerError> {
        let response = self.authorize(request).send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport_error)?;

        if !status.is_success() {
            let text = String::from_utf8_lossy(&body);
            let text: String = text.chars().take(MAX_ERROR_BODY).collect();
            return Err(ScalerError::Connection(format!("{what} returned {status}: {text}")));
        }

        debug!(%status, bytes = body.len(), "{what} succeeded");
        Ok(body)
    }
}

#[async_trait]
impl SearchClient for HttpSearchClient {
    async fn ping(&self) -> Result<(), ScalerError> {
        let url = format!("{}/", self.next_address());
        self.execute(self.client.get(&url), "ping").await?;
        Ok(())
    }

    async fn search_template(
        &self,
        indexes: &[String],
        query: &Value,
    ) -> Result<Bytes, ScalerError> {
        let target = indexes
            .iter()
            .filter(|i| !i.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}/{}/_search/template", self.next_address(), target);

        debug!(url = %url, "running templated search");
        self.execute(self.client.post(&url).json(query), "search template")
            .await
    }
}

fn transport_error(e: reqwest::Error) -> ScalerError {
    if e.is_timeout() {
        ScalerError::Cancelled(e.to_string())
    } else {
        ScalerError::Connection(e.to_string())
    }
}
