mod authorization_provider;
mod prometheus_connector;

pub use authorization_provider::{
    AuthorizationProvider, AUTHORIZATION_HEADER, CORALOGIX_TOKEN_HEADER,
};
pub use prometheus_connector::{
    PrometheusConnector, API_FLAGS, API_LABELS, API_QUERY, API_QUERY_RANGE,
    CONNECTION_CHECK_QUERY, VM_FLAGS,
};
