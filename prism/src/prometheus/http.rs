use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{PrismError, PrismResult};
use crate::prometheus::base::{MetricsQuerier, RangeQueryOptions};
use crate::prometheus::types::{
    ApiResponse, InstantData, InstantSample, Matrix, RangeData, TimeSeries, Vector,
};

const QUERY_RANGE_PATH: &str = "/api/v1/query_range";
const QUERY_PATH: &str = "/api/v1/query";
const STATUS_SUCCESS: &str = "success";

/// [`MetricsQuerier`] implementation backed by the Prometheus HTTP API.
#[derive(Debug, Clone)]
pub struct HttpPromClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPromClient {
    /// Creates a new client against `base_url`, applying `request_timeout`
    /// to each individual request.
    ///
    /// The per-request timeout is a transport-level safety net; callers
    /// bound whole fan-outs with the batch executor's deadline.
    pub fn new(base_url: &str, request_timeout: Duration) -> PrismResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_data<T>(&self, path: &str, params: &[(&str, String)]) -> PrismResult<T>
    where
        T: DeserializeOwned + Default,
    {
        let response = self
            .client
            .get(format!("{}{path}", self.base_url))
            .query(params)
            .send()
            .await?;

        let envelope: ApiResponse<T> = response.json().await?;
        if envelope.status != STATUS_SUCCESS {
            return Err(PrismError::QueryRejected {
                error_type: envelope.error_type.unwrap_or_default(),
                message: envelope.error.unwrap_or_default(),
            });
        }

        envelope.data.ok_or_else(|| PrismError::Sample {
            detail: "successful response carried no data".to_string(),
        })
    }
}

#[async_trait]
impl MetricsQuerier for HttpPromClient {
    async fn range_query(&self, query: &str, options: RangeQueryOptions) -> PrismResult<Matrix> {
        debug!(query, start = options.start_ts, end = options.end_ts, step = options.step_secs, "range query");

        let params = [
            ("query", query.to_string()),
            ("start", options.start_ts.to_string()),
            ("end", options.end_ts.to_string()),
            ("step", format!("{}s", options.step_secs)),
        ];

        let data: RangeData = self.get_data(QUERY_RANGE_PATH, &params).await?;
        data.result.into_iter().map(TimeSeries::try_from).collect()
    }

    async fn instant_query(&self, query: &str, at_ts: i64) -> PrismResult<Vector> {
        debug!(query, at = at_ts, "instant query");

        let params = [("query", query.to_string()), ("time", at_ts.to_string())];

        let data: InstantData = self.get_data(QUERY_PATH, &params).await?;
        data.result
            .into_iter()
            .map(InstantSample::try_from)
            .collect()
    }
}
