//! Connector Factory
//!
//! Builds a `PrometheusConnector` for a `BackendConfig`: parses the extra
//! query string, honours `disable_ssl`, resolves initial headers through the
//! shared `Authorizer` and attaches a SigV4 signer for AWS backends.

use crate::adapters::outbound::PrometheusConnector;
use crate::domain::entities::{BackendConfig, BackendKind};
use crate::domain::errors::ConnectorError;
use crate::domain::ports::Authorizer;
use crate::infrastructure::{parse_query_string, SigV4Signer};
use std::sync::Arc;

/// Creates connectors that share one authorizer.
#[derive(Clone)]
pub struct ConnectorFactory {
    authorizer: Arc<dyn Authorizer>,
}

impl ConnectorFactory {
    /// Create a new factory.
    pub fn new(authorizer: Arc<dyn Authorizer>) -> Self {
        Self { authorizer }
    }

    pub fn authorizer(&self) -> Arc<dyn Authorizer> {
        self.authorizer.clone()
    }

    /// Build a connector bound to `config`.
    pub fn connect(&self, config: BackendConfig) -> Result<PrometheusConnector, ConnectorError> {
        let base_params = match config.query_string() {
            Some(query) => parse_query_string(query)?,
            None => Vec::new(),
        };

        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.is_ssl_disabled())
            .build()
            .map_err(ConnectorError::Client)?;

        let signer = match config.kind() {
            BackendKind::Aws(settings) => Some(SigV4Signer::new(settings)),
            _ => None,
        };

        tracing::debug!(
            "connecting to {} backend at {} (capabilities: {:?})",
            config.kind().name(),
            config.url(),
            config.capabilities()
        );

        Ok(PrometheusConnector::new(
            config,
            self.authorizer.clone(),
            client,
            base_params,
            signer,
        ))
    }
}
