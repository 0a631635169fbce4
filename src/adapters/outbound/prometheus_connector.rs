//! Prometheus Connector
//!
//! Per-backend client for the Prometheus HTTP API. Every request carries the
//! backend's extra query parameters and resolved headers; a 401 triggers at
//! most one token refresh and one retry.

use crate::domain::entities::{
    BackendConfig, BackendKind, MetricSample, OperationalFlags, SamplePoint,
};
use crate::domain::errors::{ConnectorError, RequestError};
use crate::domain::ports::{AuthHeaders, Authorizer};
use crate::domain::value_objects::{Capability, FlagsService};
use crate::infrastructure::{merge_params, parse_flags, QueryParams, SigV4Signer};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub const API_QUERY: &str = "/api/v1/query";
pub const API_QUERY_RANGE: &str = "/api/v1/query_range";
pub const API_LABELS: &str = "/api/v1/labels";
pub const API_FLAGS: &str = "/api/v1/status/flags";
pub const VM_FLAGS: &str = "/flags";

/// Metric name that exists nowhere; a valid query with an empty result.
pub const CONNECTION_CHECK_QUERY: &str = "example";

/// Standard Prometheus response envelope.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse<T> {
    status: String,
    data: Option<T>,
    error_type: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryData {
    result_type: String,
    result: serde_json::Value,
}

impl QueryData {
    fn into_samples(self) -> Result<Vec<MetricSample>, RequestError> {
        match self.result_type.as_str() {
            "vector" | "matrix" => serde_json::from_value(self.result).map_err(|e| {
                RequestError::Decode(format!("invalid {} result: {}", self.result_type, e))
            }),
            "scalar" | "string" => {
                let point: SamplePoint = serde_json::from_value(self.result).map_err(|e| {
                    RequestError::Decode(format!("invalid {} result: {}", self.result_type, e))
                })?;
                Ok(vec![MetricSample {
                    value: Some(point),
                    ..Default::default()
                }])
            }
            other => Err(RequestError::Decode(format!("unknown result type {:?}", other))),
        }
    }
}

/// Client bound to one backend configuration.
///
/// Built by `ConnectorFactory`. Safe to share across tasks; headers are
/// cached behind a mutex that is never held across an await point.
pub struct PrometheusConnector {
    config: BackendConfig,
    authorizer: Arc<dyn Authorizer>,
    client: reqwest::Client,
    base_params: QueryParams,
    /// Merged request headers, resolved on first use
    headers: Mutex<Option<AuthHeaders>>,
    signer: Option<SigV4Signer>,
}

impl PrometheusConnector {
    pub fn new(
        config: BackendConfig,
        authorizer: Arc<dyn Authorizer>,
        client: reqwest::Client,
        base_params: QueryParams,
        signer: Option<SigV4Signer>,
    ) -> Self {
        Self {
            config,
            authorizer,
            client,
            base_params,
            headers: Mutex::new(None),
            signer,
        }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub fn url(&self) -> &str {
        self.config.url()
    }

    /// Check that the backend is reachable and accepts our credentials.
    ///
    /// AWS backends run the canonical query and return its error as is.
    /// Everything else is reported as `BackendUnreachable`.
    pub async fn check_connection(&self, params: &[(&str, &str)]) -> Result<(), ConnectorError> {
        if let BackendKind::Aws(_) = self.config.kind() {
            self.query(CONNECTION_CHECK_QUERY, params).await?;
            return Ok(());
        }

        let mut call = vec![("query", CONNECTION_CHECK_QUERY)];
        call.extend_from_slice(params);
        let params = merge_params(&self.base_params, &call);

        let result = match self.get_with_auth_retry(API_QUERY, &params).await {
            Ok(response) => ensure_success(response).map(|_| ()),
            Err(e) => Err(e),
        };

        result.map_err(|cause| {
            tracing::warn!("prometheus at {} is unreachable: {}", self.url(), cause);
            ConnectorError::BackendUnreachable {
                url: self.url().to_string(),
                cause,
            }
        })
    }

    /// Run an instant query.
    pub async fn query(
        &self,
        promql: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<MetricSample>, ConnectorError> {
        self.require(Capability::Query)?;

        let mut call = vec![("query", promql)];
        call.extend_from_slice(params);
        let params = merge_params(&self.base_params, &call);

        let data: QueryData = self.fetch_data(API_QUERY, &params).await?;
        data.into_samples().map_err(|source| self.request_error(API_QUERY, source))
    }

    /// Run a range query over `[start, end]` at `step` resolution.
    pub async fn query_range(
        &self,
        promql: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        step: Duration,
        params: &[(&str, &str)],
    ) -> Result<Vec<MetricSample>, ConnectorError> {
        self.require(Capability::QueryRange)?;

        let start = start.timestamp().to_string();
        let end = end.timestamp().to_string();
        let step = format_step(step);
        let mut call = vec![
            ("query", promql),
            ("start", start.as_str()),
            ("end", end.as_str()),
            ("step", step.as_str()),
        ];
        call.extend_from_slice(params);
        let params = merge_params(&self.base_params, &call);

        let data: QueryData = self.fetch_data(API_QUERY_RANGE, &params).await?;
        data.into_samples()
            .map_err(|source| self.request_error(API_QUERY_RANGE, source))
    }

    /// List label names known to the backend.
    pub async fn label_names(
        &self,
        params: &[(&str, &str)],
    ) -> Result<Vec<String>, ConnectorError> {
        self.require(Capability::Labels)?;
        let params = merge_params(&self.base_params, params);
        self.fetch_data(API_LABELS, &params).await
    }

    /// Fetch the backend's runtime flags.
    ///
    /// Returns `Ok(None)` without any network call when the backend declares
    /// neither flags capability.
    pub async fn get_operational_flags(&self) -> Result<Option<OperationalFlags>, ConnectorError> {
        let (service, result) = if self.config.supports(Capability::Flags) {
            (FlagsService::Prometheus, self.fetch_prometheus_flags().await)
        } else if self.config.supports(Capability::VmFlags) {
            (
                FlagsService::VictoriaMetrics,
                self.fetch_victoria_metrics_flags().await,
            )
        } else {
            return Ok(None);
        };

        result.map(Some).map_err(|source| ConnectorError::FlagsUnavailable {
            service,
            url: self.url().to_string(),
            source: Box::new(source),
        })
    }

    async fn fetch_prometheus_flags(&self) -> Result<OperationalFlags, ConnectorError> {
        let response = self
            .get_with_auth_retry(API_FLAGS, &self.base_params)
            .await
            .map_err(|source| self.request_error(API_FLAGS, source))?;

        let data: Option<HashMap<String, serde_json::Value>> = decode_envelope(response)
            .await
            .map_err(|source| self.request_error(API_FLAGS, source))?;

        Ok(data
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| {
                let v = match v {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, v)
            })
            .collect())
    }

    async fn fetch_victoria_metrics_flags(&self) -> Result<OperationalFlags, ConnectorError> {
        let text = async {
            let response = self.get_with_auth_retry(VM_FLAGS, &self.base_params).await?;
            Ok::<_, RequestError>(ensure_success(response)?.text().await?)
        }
        .await
        .map_err(|source| self.request_error(VM_FLAGS, source))?;

        Ok(parse_flags(&text)?)
    }

    async fn fetch_data<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        params: &QueryParams,
    ) -> Result<T, ConnectorError> {
        let result = async {
            let response = self.get_with_auth_retry(endpoint, params).await?;
            decode_envelope::<T>(response)
                .await?
                .ok_or_else(|| RequestError::Decode("response has no data".to_string()))
        }
        .await;

        result.map_err(|source| self.request_error(endpoint, source))
    }

    /// GET `endpoint`, retrying once after a successful token refresh if the
    /// first attempt is rejected with 401.
    async fn get_with_auth_retry(
        &self,
        endpoint: &str,
        params: &QueryParams,
    ) -> Result<Response, RequestError> {
        let response = self.send(endpoint, params).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::warn!("{}{} rejected credentials", self.url(), endpoint);
        if !self.authorizer.refresh_token(&self.config).await {
            return Ok(response);
        }

        self.reload_headers();
        tracing::debug!("retrying {}{} with refreshed token", self.url(), endpoint);
        self.send(endpoint, params).await
    }

    async fn send(&self, endpoint: &str, params: &QueryParams) -> Result<Response, RequestError> {
        let url = format!("{}{}", self.url(), endpoint);
        let mut builder = self.client.get(&url).query(params);
        for (name, value) in self.headers() {
            builder = builder.header(name, value);
        }

        let mut request = builder.build()?;
        if let Some(signer) = &self.signer {
            signer.sign(&mut request)?;
        }

        tracing::debug!("GET {}", request.url());
        Ok(self.client.execute(request).await?)
    }

    fn headers(&self) -> AuthHeaders {
        self.headers
            .lock()
            .get_or_insert_with(|| self.build_headers())
            .clone()
    }

    fn reload_headers(&self) {
        let headers = self.build_headers();
        *self.headers.lock() = Some(headers);
    }

    /// Additional headers first; an auth header replaces any additional
    /// header whose name matches ignoring case.
    fn build_headers(&self) -> AuthHeaders {
        let auth = self.authorizer.resolve_headers(&self.config);
        let mut headers: AuthHeaders = self
            .config
            .headers()
            .iter()
            .filter(|(name, _)| !auth.keys().any(|key| key.eq_ignore_ascii_case(name)))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        headers.extend(auth);
        headers
    }

    fn require(&self, capability: Capability) -> Result<(), ConnectorError> {
        if self.config.supports(capability) {
            Ok(())
        } else {
            Err(ConnectorError::UnsupportedCapability {
                backend: self.config.kind().name(),
                capability,
            })
        }
    }

    fn request_error(&self, endpoint: &'static str, source: RequestError) -> ConnectorError {
        ConnectorError::Request {
            url: self.url().to_string(),
            endpoint,
            source,
        }
    }
}

/// Prometheus duration in seconds, keeping sub-second precision.
fn format_step(step: Duration) -> String {
    format!("{}s", step.as_secs_f64())
}

fn ensure_success(response: Response) -> Result<Response, RequestError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(RequestError::HttpStatus {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("unknown").to_string(),
        })
    }
}

/// Decode the JSON envelope. API errors (`status: "error"`) win over the
/// bare HTTP status because they carry the backend's explanation.
async fn decode_envelope<T: DeserializeOwned>(
    response: Response,
) -> Result<Option<T>, RequestError> {
    let status = response.status();
    let body = response.text().await?;

    match serde_json::from_str::<ApiResponse<T>>(&body) {
        Ok(envelope) if envelope.status == "error" => Err(RequestError::Api {
            error_type: envelope.error_type.unwrap_or_default(),
            error: envelope.error.unwrap_or_default(),
        }),
        _ if !status.is_success() => Err(RequestError::HttpStatus {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("unknown").to_string(),
        }),
        Ok(envelope) => Ok(envelope.data),
        Err(e) => Err(RequestError::Decode(format!("invalid response body: {}", e))),
    }
}
