//! Authorizer Port
//!
//! Defines how connectors obtain and refresh authentication headers.

use crate::domain::entities::BackendConfig;
use async_trait::async_trait;
use std::collections::HashMap;

/// Header name to value.
pub type AuthHeaders = HashMap<String, String>;

/// Resolves authentication headers for a backend.
///
/// This is an outbound port shared by every connector in the process. The
/// implementation owns any cached credentials; connectors hold an
/// `Arc<dyn Authorizer>` and never cache tokens themselves.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Headers to attach to a request for `config`. May be empty.
    fn resolve_headers(&self, config: &BackendConfig) -> AuthHeaders;

    /// Try to obtain a fresh credential after the backend rejected one.
    ///
    /// Returns `true` only when a new credential was stored and a retry is
    /// worth attempting.
    async fn refresh_token(&self, config: &BackendConfig) -> bool;
}
