use crate::domain::entities::{AwsSettings, AzureSettings, BackendConfig, BackendKind};
use crate::domain::errors::ConnectorError;
use secrecy::SecretString;
use std::collections::HashMap;

pub const AZURE_CLIENT_ID: &str = "AZURE_CLIENT_ID";
pub const AZURE_TENANT_ID: &str = "AZURE_TENANT_ID";
pub const AZURE_CLIENT_SECRET: &str = "AZURE_CLIENT_SECRET";
pub const AZURE_USE_MANAGED_ID: &str = "AZURE_USE_MANAGED_ID";

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_AZURE_RESOURCE: &str = "https://prometheus.monitor.azure.com";
pub const DEFAULT_AZURE_METADATA_ENDPOINT: &str =
    "http://169.254.169.254/metadata/identity/oauth2/token";

/// Which Azure identity settings are present in the environment.
///
/// Azure authorization is enabled when a client id and tenant id are set
/// together with either a client secret or the managed identity flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AzureAuthEnv {
    pub client_id: Option<String>,
    pub tenant_id: Option<String>,
    pub has_client_secret: bool,
    pub use_managed_identity: bool,
}

impl AzureAuthEnv {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        Self {
            client_id: get(AZURE_CLIENT_ID),
            tenant_id: get(AZURE_TENANT_ID),
            has_client_secret: get(AZURE_CLIENT_SECRET).is_some(),
            use_managed_identity: get(AZURE_USE_MANAGED_ID).is_some(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.client_id.is_some()
            && self.tenant_id.is_some()
            && (self.has_client_secret || self.use_managed_identity)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendConfig,
    pub azure: AzureAuthEnv,
    pub request_timeout_secs: u64,
    pub debug: bool,
}

pub fn load_config() -> Result<Config, ConnectorError> {
    load_config_from(|key| std::env::var(key).ok())
}

pub fn load_config_from<F>(lookup: F) -> Result<Config, ConnectorError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    let flag = |key: &str| {
        get(key)
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false)
    };
    let require = |key: &str| {
        get(key).ok_or_else(|| ConnectorError::Configuration(format!("{} is not set", key)))
    };

    let url = require("PROMETHEUS_URL")?;
    let azure = AzureAuthEnv::from_lookup(&lookup);

    let backend = get("PROMETHEUS_BACKEND").unwrap_or_else(|| "generic".to_string());
    let kind = match backend.to_lowercase().as_str() {
        "generic" | "prometheus" => BackendKind::Generic,
        "aws" => BackendKind::Aws(
            AwsSettings::new(
                require("AWS_ACCESS_KEY")?,
                require("AWS_SECRET_ACCESS_KEY")?,
                require("AWS_REGION")?,
            )
            .service_name(get("AWS_SERVICE_NAME").unwrap_or_else(|| "aps".to_string())),
        ),
        "coralogix" => BackendKind::Coralogix {
            api_token: SecretString::from(require("CORALOGIX_PROMETHEUS_TOKEN")?),
        },
        "victoria-metrics" | "victoria_metrics" | "vm" => BackendKind::VictoriaMetrics {
            api_token: get("VICTORIA_METRICS_TOKEN").map(SecretString::from),
        },
        "azure" => {
            let token_endpoint = match get("AZURE_TOKEN_ENDPOINT") {
                Some(endpoint) => endpoint,
                None => format!(
                    "https://login.microsoftonline.com/{}/oauth2/token",
                    azure.tenant_id.clone().unwrap_or_default()
                ),
            };
            BackendKind::Azure(AzureSettings {
                resource: get("AZURE_PROMETHEUS_RESOURCE")
                    .unwrap_or_else(|| DEFAULT_AZURE_RESOURCE.to_string()),
                metadata_endpoint: get("AZURE_METADATA_ENDPOINT")
                    .unwrap_or_else(|| DEFAULT_AZURE_METADATA_ENDPOINT.to_string()),
                token_endpoint,
                use_managed_identity: azure.use_managed_identity,
                client_id: None,
                client_secret: None,
            })
        }
        other => {
            return Err(ConnectorError::Configuration(format!(
                "unknown PROMETHEUS_BACKEND {:?}",
                other
            )))
        }
    };

    let mut config = BackendConfig::new(url, kind)?
        .disable_ssl(flag("PROMETHEUS_DISABLE_SSL"))
        .additional_headers(parse_pairs(get("PROMETHEUS_ADDITIONAL_HEADERS")))
        .additional_labels(parse_pairs(get("PROMETHEUS_ADDITIONAL_LABELS")));
    if let Some(auth) = get("PROMETHEUS_AUTH") {
        config = config.static_auth_token(auth);
    }
    if let Some(query) = get("PROMETHEUS_URL_QUERY_STRING") {
        config = config.url_query_string(query);
    }

    let request_timeout_secs = get("PROMETHEUS_REQUEST_TIMEOUT_SECONDS")
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

    let debug = get("DEBUG").is_some();

    Ok(Config {
        backend: config,
        azure,
        request_timeout_secs,
        debug,
    })
}

/// Parse `k1=v1,k2=v2`. Entries without `=` are ignored.
fn parse_pairs(raw: Option<String>) -> HashMap<String, String> {
    raw.map(|raw| {
        raw.split(',')
            .filter_map(|pair| pair.split_once('='))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .filter(|(k, _)| !k.is_empty())
            .collect()
    })
    .unwrap_or_default()
}
