//! The Elasticsearch scaler: resolved metadata + one search client,
//! exposed to the host through [`Scaler`].

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, info, Instrument, Span};

use esscale_core::text::{metric_name, metric_name_with_index};
use esscale_core::{
    ExternalMetricValue, MetricSpec, MetricTargetType, Scaler, ScalerConfig, ScalerError,
};

use crate::client::{HttpSearchClient, SearchClient};
use crate::extract::value_from_search;
use crate::metadata::ElasticsearchMetadata;
use crate::query::build_query;

const METRIC_PREFIX: &str = "elasticsearch";

/// Scales on an integer read from a search-template response.
///
/// `is_active` and `current_value` each run the query on their own; a host
/// calling both in one poll pays for two round trips.
pub struct ElasticsearchScaler {
    metadata: ElasticsearchMetadata,
    /// `None` once closed.
    client: RwLock<Option<Arc<dyn SearchClient>>>,
    /// Deadline per round trip; zero disables it.
    timeout: Duration,
    span: Span,
}

impl ElasticsearchScaler {
    /// Build a scaler over an existing client. The client is pinged first.
    pub async fn with_client(
        config: &ScalerConfig,
        client: Arc<dyn SearchClient>,
        span: Span,
    ) -> Result<Self, ScalerError> {
        let metadata = parse_metadata(config, &span)?;
        Self::from_parts(metadata, client, config.global_http_timeout, span).await
    }

    async fn from_parts(
        metadata: ElasticsearchMetadata,
        client: Arc<dyn SearchClient>,
        timeout: Duration,
        span: Span,
    ) -> Result<Self, ScalerError> {
        async {
            if let Err(e) = with_deadline(timeout, "ping", client.ping()).await {
                error!(error = %e, "found error when pinging search engine");
                return Err(e);
            }
            info!(
                addresses = ?metadata.addresses,
                indexes = ?metadata.indexes,
                template = %metadata.search_template_name,
                "elasticsearch scaler ready"
            );
            Ok(())
        }
        .instrument(span.clone())
        .await?;

        Ok(Self {
            metadata,
            client: RwLock::new(Some(client)),
            timeout,
            span,
        })
    }

    pub fn metadata(&self) -> &ElasticsearchMetadata {
        &self.metadata
    }

    fn client(&self) -> Result<Arc<dyn SearchClient>, ScalerError> {
        let guard = self.client.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard
            .clone()
            .ok_or_else(|| ScalerError::Connection("scaler is closed".to_string()))
    }

    /// Build the query, run it and extract the value. One round trip.
    async fn query_result(&self) -> Result<i64, ScalerError> {
        let client = self.client()?;
        let query = build_query(&self.metadata.search_template_name, &self.metadata.parameters)?;
        let body = with_deadline(
            self.timeout,
            "search template",
            client.search_template(&self.metadata.indexes, &query),
        )
        .await?;
        let value = value_from_search(&body, &self.metadata.value_location)?;
        debug!(value, location = %self.metadata.value_location, "extracted query result");
        Ok(value)
    }

    async fn inspect(&self) -> Result<i64, ScalerError> {
        self.query_result()
            .instrument(self.span.clone())
            .await
            .inspect_err(|e| {
                self.span.in_scope(|| error!(error = %e, "error inspecting elasticsearch"));
            })
    }
}

#[async_trait]
impl Scaler for ElasticsearchScaler {
    async fn connect(config: ScalerConfig, span: Span) -> Result<Self, ScalerError> {
        let metadata = parse_metadata(&config, &span)?;
        let client = HttpSearchClient::new(&metadata).inspect_err(|e| {
            span.in_scope(|| error!(error = %e, "found error when creating client"));
        })?;
        Self::from_parts(metadata, Arc::new(client), config.global_http_timeout, span).await
    }

    async fn is_active(&self) -> Result<bool, ScalerError> {
        Ok(self.inspect().await? > 0)
    }

    fn metric_spec(&self) -> MetricSpec {
        let name = metric_name(METRIC_PREFIX, &self.metadata.search_template_name);
        MetricSpec {
            name: metric_name_with_index(self.metadata.target_value, &name),
            target_type: MetricTargetType::AverageValue,
            target: self.metadata.target_value,
        }
    }

    async fn current_value(&self) -> Result<ExternalMetricValue, ScalerError> {
        let value = self.inspect().await?;
        Ok(ExternalMetricValue::now(self.metric_spec().name, value))
    }

    async fn close(&self) -> Result<(), ScalerError> {
        let mut guard = self.client.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        if guard.take().is_some() {
            self.span.in_scope(|| info!("elasticsearch scaler closed"));
        }
        Ok(())
    }
}

fn parse_metadata(
    config: &ScalerConfig,
    span: &Span,
) -> Result<ElasticsearchMetadata, ScalerError> {
    ElasticsearchMetadata::parse(config).inspect_err(|e| {
        span.in_scope(|| error!(error = %e, "error parsing elasticsearch metadata"));
    })
}

/// Run `fut` under `timeout`; elapsing is a cancellation, never a value.
async fn with_deadline<T, F>(timeout: Duration, what: &str, fut: F) -> Result<T, ScalerError>
where
    F: std::future::Future<Output = Result<T, ScalerError>>,
{
    if timeout.is_zero() {
        return fut.await;
    }
    tokio::time::timeout(timeout, fut).await.map_err(|_| {
        ScalerError::Cancelled(format!("{what} exceeded {}ms", timeout.as_millis()))
    })?
}
