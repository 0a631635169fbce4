//! Query Parameter Handling
//!
//! Parses a backend's extra query string once and merges it into the
//! parameters of every outgoing request.

use crate::domain::errors::ConnectorError;

/// Ordered list of query parameters.
pub type QueryParams = Vec<(String, String)>;

/// Parse `a=b&c=d` (optionally prefixed with `?`).
pub fn parse_query_string(query: &str) -> Result<QueryParams, ConnectorError> {
    let query = query.trim().trim_start_matches('?');
    serde_urlencoded::from_str::<QueryParams>(query).map_err(|e| {
        ConnectorError::Configuration(format!("invalid url query string {:?}: {}", query, e))
    })
}

/// Merge per-call parameters over the connector's base parameters.
///
/// A per-call key replaces every base entry with the same key.
pub fn merge_params(base: &[(String, String)], call: &[(&str, &str)]) -> QueryParams {
    let mut merged: QueryParams = base
        .iter()
        .filter(|(k, _)| !call.iter().any(|(ck, _)| *ck == k.as_str()))
        .cloned()
        .collect();
    merged.extend(call.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    merged
}
