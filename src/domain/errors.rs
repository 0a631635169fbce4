//! Connector error taxonomy.

use crate::domain::value_objects::{Capability, FlagsService};
use crate::infrastructure::sigv4::SigningError;

/// Errors surfaced to callers of a connector.
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    /// No usable backend URL or configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Health check failed after the single permitted auth retry.
    #[error(
        "couldn't connect to Prometheus found under {url}: caused by {}: {cause}",
        .cause.kind()
    )]
    BackendUnreachable {
        url: String,
        #[source]
        cause: RequestError,
    },

    /// A query, range query or label request failed.
    #[error("request to {url}{endpoint} failed: {}: {source}", .source.kind())]
    Request {
        url: String,
        endpoint: &'static str,
        #[source]
        source: RequestError,
    },

    /// Operational flags could not be fetched or normalized.
    #[error("couldn't connect to the url: {url} ({service}): {source}")]
    FlagsUnavailable {
        service: FlagsService,
        url: String,
        #[source]
        source: Box<ConnectorError>,
    },

    /// Malformed `key="value"` flags text.
    #[error(transparent)]
    FlagsParse(#[from] FlagsParseError),

    /// The backend variant does not declare the capability.
    #[error("{backend} backend does not support {capability}")]
    UnsupportedCapability {
        backend: &'static str,
        capability: Capability,
    },

    /// The HTTP client could not be built.
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Why a single round trip to a backend failed.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("{status} {reason}")]
    HttpStatus { status: u16, reason: String },

    #[error("{error_type}: {error}")]
    Api { error_type: String, error: String },

    #[error("{0}")]
    Decode(String),

    #[error("{0}")]
    Signing(#[from] SigningError),
}

impl RequestError {
    /// Failure class name, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(e) if e.is_timeout() => "Timeout",
            Self::Transport(e) if e.is_connect() => "ConnectionError",
            Self::Transport(e) if e.is_decode() => "DecodeError",
            Self::Transport(_) => "TransportError",
            Self::HttpStatus { .. } => "HTTPError",
            Self::Api { .. } => "ApiError",
            Self::Decode(_) => "DecodeError",
            Self::Signing(_) => "SigningError",
        }
    }

    /// HTTP status code, when the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// A flags line that is not `key="value"`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed flags line {line_number}: {line:?} ({reason})")]
pub struct FlagsParseError {
    pub line_number: usize,
    pub line: String,
    pub reason: &'static str,
}

/// Why an Azure token refresh failed. Logged, never returned to callers.
#[derive(Debug, thiserror::Error)]
pub enum TokenRefreshError {
    #[error("no azure client id configured")]
    MissingClientId,

    #[error("no azure client secret configured")]
    MissingClientSecret,

    #[error("token request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("token endpoint returned {status} {reason}")]
    Status { status: u16, reason: String },

    #[error("token response has no access_token")]
    MissingAccessToken,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_kind() {
        let err = RequestError::HttpStatus {
            status: 401,
            reason: "Unauthorized".to_string(),
        };
        assert_eq!(err.kind(), "HTTPError");
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.to_string(), "401 Unauthorized");
    }

    #[test]
    fn test_backend_unreachable_message() {
        let err = ConnectorError::BackendUnreachable {
            url: "http://prom:9090".to_string(),
            cause: RequestError::HttpStatus {
                status: 503,
                reason: "Service Unavailable".to_string(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("http://prom:9090"));
        assert!(msg.contains("HTTPError"));
        assert!(msg.contains("503 Service Unavailable"));
    }

    #[test]
    fn test_flags_unavailable_names_service() {
        let parse = FlagsParseError {
            line_number: 2,
            line: "broken".to_string(),
            reason: "missing '='",
        };
        let err = ConnectorError::FlagsUnavailable {
            service: FlagsService::VictoriaMetrics,
            url: "http://vm:8428".to_string(),
            source: Box::new(parse.into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("Victoria Metrics"));
        assert!(msg.contains("http://vm:8428"));
        assert!(msg.contains("broken"));
    }

    #[test]
    fn test_api_error_kind() {
        let err = RequestError::Api {
            error_type: "bad_data".to_string(),
            error: "parse error".to_string(),
        };
        assert_eq!(err.kind(), "ApiError");
        assert!(err.status().is_none());
    }

    #[test]
    fn test_unsupported_capability_message() {
        let err = ConnectorError::UnsupportedCapability {
            backend: "coralogix",
            capability: Capability::Flags,
        };
        assert_eq!(err.to_string(), "coralogix backend does not support FLAGS");
    }
}
