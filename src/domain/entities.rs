//! Domain Entities - Backend descriptions and query results
//!
//! A `BackendConfig` describes how to reach one Prometheus-compatible
//! backend. The variant (`BackendKind`) is the single source of truth for
//! which capabilities the backend exposes.

use crate::domain::errors::ConnectorError;
use crate::domain::value_objects::{Capability, CapabilitySet};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const AZURE_CLIENT_ID_ENV: &str = "AZURE_CLIENT_ID";
pub const AZURE_CLIENT_SECRET_ENV: &str = "AZURE_CLIENT_SECRET";

/// Default signing service name for Amazon Managed Service for Prometheus.
pub const AWS_DEFAULT_SERVICE_NAME: &str = "aps";

/// Connection parameters for one metrics backend.
///
/// Built with [`BackendConfig::new`] and the chained setters below. There is
/// no setter for capabilities; they follow from the variant.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    url: String,
    disable_ssl: bool,
    additional_headers: HashMap<String, String>,
    static_auth_token: Option<SecretString>,
    url_query_string: Option<String>,
    additional_labels: HashMap<String, String>,
    kind: BackendKind,
}

impl BackendConfig {
    /// Create a config for `url`. Fails when the URL is blank.
    pub fn new(url: impl Into<String>, kind: BackendKind) -> Result<Self, ConnectorError> {
        let url = url.into();
        let url = url.trim().trim_end_matches('/').to_string();
        if url.is_empty() {
            return Err(ConnectorError::Configuration(
                "backend url must not be empty".to_string(),
            ));
        }

        Ok(Self {
            url,
            disable_ssl: false,
            additional_headers: HashMap::new(),
            static_auth_token: None,
            url_query_string: None,
            additional_labels: HashMap::new(),
            kind,
        })
    }

    pub fn disable_ssl(mut self, disable: bool) -> Self {
        self.disable_ssl = disable;
        self
    }

    pub fn additional_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.additional_headers = headers;
        self
    }

    /// Raw `Authorization` header value. Wins over ambient Azure auth.
    pub fn static_auth_token(mut self, token: impl Into<String>) -> Self {
        self.static_auth_token = Some(SecretString::from(token.into()));
        self
    }

    /// Extra query parameters (`a=b&c=d`) appended to every request.
    pub fn url_query_string(mut self, query: impl Into<String>) -> Self {
        let query = query.into();
        self.url_query_string = if query.trim().is_empty() {
            None
        } else {
            Some(query)
        };
        self
    }

    pub fn additional_labels(mut self, labels: HashMap<String, String>) -> Self {
        self.additional_labels = labels;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_ssl_disabled(&self) -> bool {
        self.disable_ssl
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.additional_headers
    }

    pub fn auth_token(&self) -> Option<&SecretString> {
        self.static_auth_token.as_ref()
    }

    pub fn query_string(&self) -> Option<&str> {
        self.url_query_string.as_deref()
    }

    /// Caller-side metadata. Never sent to the backend.
    pub fn labels(&self) -> &HashMap<String, String> {
        &self.additional_labels
    }

    pub fn kind(&self) -> &BackendKind {
        &self.kind
    }

    pub fn capabilities(&self) -> CapabilitySet {
        self.kind.capabilities()
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities().contains(capability)
    }
}

/// Backend variant with its variant-specific settings.
#[derive(Debug, Clone)]
pub enum BackendKind {
    /// Vanilla Prometheus
    Generic,
    /// Amazon Managed Service for Prometheus (SigV4 signed)
    Aws(AwsSettings),
    /// Coralogix, authenticated through a `token` header
    Coralogix { api_token: SecretString },
    /// VictoriaMetrics, optionally behind a bearer token
    VictoriaMetrics { api_token: Option<SecretString> },
    /// Prometheus fronted by Azure Monitor (OAuth2 bearer tokens)
    Azure(AzureSettings),
}

impl BackendKind {
    pub fn capabilities(&self) -> CapabilitySet {
        match self {
            Self::Generic | Self::Azure(_) => CapabilitySet::PROMETHEUS,
            Self::Aws(_) | Self::Coralogix { .. } => CapabilitySet::QUERY_ONLY,
            Self::VictoriaMetrics { .. } => CapabilitySet::VICTORIA_METRICS,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Generic => "prometheus",
            Self::Aws(_) => "aws",
            Self::Coralogix { .. } => "coralogix",
            Self::VictoriaMetrics { .. } => "victoria-metrics",
            Self::Azure(_) => "azure",
        }
    }
}

/// Credentials for signing requests to AWS-managed Prometheus.
#[derive(Debug, Clone)]
pub struct AwsSettings {
    pub access_key: String,
    pub secret_key: SecretString,
    pub service_name: String,
    pub region: String,
}

impl AwsSettings {
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: SecretString::from(secret_key.into()),
            service_name: AWS_DEFAULT_SERVICE_NAME.to_string(),
            region: region.into(),
        }
    }

    pub fn service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = service_name.into();
        self
    }
}

/// Azure AD settings for acquiring bearer tokens.
///
/// Client id and secret fall back to `AZURE_CLIENT_ID` / `AZURE_CLIENT_SECRET`
/// at the time a token is requested. Missing credentials are not rejected
/// here; they show up as a failed token refresh.
#[derive(Debug, Clone, Default)]
pub struct AzureSettings {
    pub resource: String,
    pub metadata_endpoint: String,
    pub token_endpoint: String,
    pub use_managed_identity: bool,
    pub client_id: Option<String>,
    pub client_secret: Option<SecretString>,
}

impl AzureSettings {
    pub fn client_id(&self) -> Option<String> {
        non_empty(self.client_id.clone()).or_else(|| env_non_empty(AZURE_CLIENT_ID_ENV))
    }

    pub fn client_secret(&self) -> Option<SecretString> {
        match &self.client_secret {
            Some(secret) if !secret.expose_secret().is_empty() => Some(secret.clone()),
            _ => env_non_empty(AZURE_CLIENT_SECRET_ENV).map(SecretString::from),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn env_non_empty(key: &str) -> Option<String> {
    non_empty(std::env::var(key).ok())
}

/// A `[timestamp, "value"]` pair as returned by the Prometheus API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplePoint(pub f64, pub String);

impl SamplePoint {
    pub fn timestamp(&self) -> f64 {
        self.0
    }

    pub fn value(&self) -> &str {
        &self.1
    }

    /// Numeric value; Prometheus encodes `NaN` and `+Inf` as strings too.
    pub fn as_f64(&self) -> Option<f64> {
        self.1.parse().ok()
    }
}

/// One series of a query result.
///
/// Instant queries fill `value`; range queries fill `values`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricSample {
    #[serde(default)]
    pub metric: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<SamplePoint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<SamplePoint>,
}

/// Uniform view of a backend's runtime flags.
pub type OperationalFlags = HashMap<String, String>;
