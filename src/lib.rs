//! prometheus-connector Library
//!
//! Unified client for Prometheus-compatible metrics backends (Prometheus,
//! AWS-managed Prometheus, Coralogix, VictoriaMetrics and Azure Monitor
//! fronted Prometheus): authentication, capability-aware diagnostics and a
//! single retry after re-authenticating on 401.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types
pub use adapters::outbound::{AuthorizationProvider, PrometheusConnector};
pub use application::ConnectorFactory;
pub use config::{load_config, AzureAuthEnv, Config};
pub use domain::entities::{
    AwsSettings, AzureSettings, BackendConfig, BackendKind, MetricSample, OperationalFlags,
    SamplePoint,
};
pub use domain::errors::{ConnectorError, FlagsParseError, RequestError};
pub use domain::ports::{AuthHeaders, Authorizer};
pub use domain::value_objects::{Capability, CapabilitySet, FlagsService};
pub use infrastructure::parse_flags;
