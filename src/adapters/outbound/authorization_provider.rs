//! Authorization Provider
//!
//! Implements the `Authorizer` port. Static tokens are served straight from
//! the backend config; Azure-fronted backends get a bearer token from Azure
//! AD (client credentials) or the instance metadata service (managed
//! identity), cached in a single process-wide `TokenCell`.

use crate::domain::entities::{AzureSettings, BackendConfig, BackendKind};
use crate::domain::errors::TokenRefreshError;
use crate::domain::ports::{AuthHeaders, Authorizer};
use crate::infrastructure::TokenCell;
use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::sync::Arc;

pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const CORALOGIX_TOKEN_HEADER: &str = "token";

const MANAGED_IDENTITY_API_VERSION: &str = "2018-02-01";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// Resolves auth headers and refreshes Azure bearer tokens.
///
/// One instance is shared (via `Arc`) by every connector in the process.
pub struct AuthorizationProvider {
    azure_enabled: bool,
    token: TokenCell,
    client: reqwest::Client,
}

impl AuthorizationProvider {
    /// Create a provider. `azure_enabled` is decided once at startup.
    pub fn new(azure_enabled: bool) -> Self {
        Self::with_client(azure_enabled, reqwest::Client::new())
    }

    /// Create a provider using an existing HTTP client for token requests.
    pub fn with_client(azure_enabled: bool, client: reqwest::Client) -> Self {
        Self {
            azure_enabled,
            token: TokenCell::new(),
            client,
        }
    }

    pub fn azure_enabled(&self) -> bool {
        self.azure_enabled
    }

    /// Currently cached bearer token (empty before the first refresh).
    pub fn cached_token(&self) -> Arc<str> {
        self.token.get()
    }

    async fn request_token(&self, settings: &AzureSettings) -> Result<String, TokenRefreshError> {
        let client_id = settings.client_id();

        let response = if settings.use_managed_identity {
            let mut params = vec![
                ("api-version", MANAGED_IDENTITY_API_VERSION.to_string()),
                ("resource", settings.resource.clone()),
            ];
            if let Some(id) = client_id {
                params.push(("client_id", id));
            }

            self.client
                .get(&settings.metadata_endpoint)
                .header("Metadata", "true")
                .query(&params)
                .send()
                .await?
        } else {
            let client_id = client_id.ok_or(TokenRefreshError::MissingClientId)?;
            let client_secret = settings
                .client_secret()
                .ok_or(TokenRefreshError::MissingClientSecret)?;

            self.client
                .post(&settings.token_endpoint)
                .form(&[
                    ("grant_type", "client_credentials"),
                    ("client_id", client_id.as_str()),
                    ("client_secret", client_secret.expose_secret()),
                    ("resource", settings.resource.as_str()),
                ])
                .send()
                .await?
        };

        let status = response.status();
        if !status.is_success() {
            return Err(TokenRefreshError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }

        let body: TokenResponse = response.json().await?;
        body.access_token
            .filter(|t| !t.is_empty())
            .ok_or(TokenRefreshError::MissingAccessToken)
    }
}

#[async_trait]
impl Authorizer for AuthorizationProvider {
    fn resolve_headers(&self, config: &BackendConfig) -> AuthHeaders {
        let mut headers = AuthHeaders::new();

        // Backend-specific tokens, then the explicit secret, then ambient
        // Azure mode. This order must not change.
        match config.kind() {
            BackendKind::Coralogix { api_token } => {
                headers.insert(
                    CORALOGIX_TOKEN_HEADER.to_string(),
                    api_token.expose_secret().to_string(),
                );
                return headers;
            }
            BackendKind::VictoriaMetrics {
                api_token: Some(api_token),
            } => {
                headers.insert(
                    AUTHORIZATION_HEADER.to_string(),
                    format!("Bearer {}", api_token.expose_secret()),
                );
                return headers;
            }
            _ => {}
        }

        if let Some(secret) = config.auth_token() {
            headers.insert(
                AUTHORIZATION_HEADER.to_string(),
                secret.expose_secret().to_string(),
            );
        } else if self.azure_enabled {
            headers.insert(
                AUTHORIZATION_HEADER.to_string(),
                format!("Bearer {}", self.token.get()),
            );
        }

        headers
    }

    async fn refresh_token(&self, config: &BackendConfig) -> bool {
        let settings = match config.kind() {
            BackendKind::Azure(settings) if self.azure_enabled => settings,
            _ => return false,
        };

        match self.request_token(settings).await {
            Ok(token) => {
                let generation = self.token.store(&token);
                tracing::info!(
                    "generated new azure access token for {} (generation {})",
                    config.url(),
                    generation
                );
                true
            }
            Err(e) => {
                tracing::error!("could not generate an azure access token: {}", e);
                false
            }
        }
    }
}
