//! Integration tests for operational flags with Wiremock

use prometheus_connector::{
    AuthorizationProvider, AwsSettings, AzureSettings, BackendConfig, BackendKind,
    ConnectorError, ConnectorFactory, FlagsService,
};
use secrecy::SecretString;
use std::sync::Arc;
use wiremock::matchers::{any, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn connect(config: BackendConfig) -> prometheus_connector::PrometheusConnector {
    ConnectorFactory::new(Arc::new(AuthorizationProvider::new(false)))
        .connect(config)
        .unwrap()
}

/// Prometheus backends use the JSON flags endpoint
#[tokio::test]
async fn test_prometheus_flags() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/status/flags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "data": {
                "storage.tsdb.retention.time": "15d",
                "web.enable-lifecycle": "false"
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(path("/flags"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let connector = connect(BackendConfig::new(mock_server.uri(), BackendKind::Generic).unwrap());
    let flags = connector.get_operational_flags().await.unwrap().unwrap();

    assert_eq!(flags.len(), 2);
    assert_eq!(flags.get("storage.tsdb.retention.time").unwrap(), "15d");
}

/// VictoriaMetrics backends use the plaintext flags endpoint
#[tokio::test]
async fn test_victoria_metrics_flags() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flags"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "-retentionPeriod=\"12\"\n-search.maxQueryDuration=\"30s\"\n",
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(path("/api/v1/status/flags"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let connector = connect(
        BackendConfig::new(mock_server.uri(), BackendKind::VictoriaMetrics { api_token: None })
            .unwrap(),
    );
    let flags = connector.get_operational_flags().await.unwrap().unwrap();

    assert_eq!(flags.get("-retentionPeriod").unwrap(), "12");
    assert_eq!(flags.get("-search.maxQueryDuration").unwrap(), "30s");
}

/// Backends without a flags capability make no request
#[tokio::test]
async fn test_no_flags_capability_makes_no_request() {
    let mock_server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let coralogix = BackendConfig::new(
        mock_server.uri(),
        BackendKind::Coralogix {
            api_token: SecretString::from("cx".to_string()),
        },
    )
    .unwrap();
    assert!(connect(coralogix).get_operational_flags().await.unwrap().is_none());

    let aws = BackendConfig::new(
        mock_server.uri(),
        BackendKind::Aws(AwsSettings::new("AK", "SK", "us-east-1")),
    )
    .unwrap();
    assert!(connect(aws).get_operational_flags().await.unwrap().is_none());
}

/// Flags requests carry the connector query string
#[tokio::test]
async fn test_flags_merge_url_query_string() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/status/flags"))
        .and(query_param("foo", "bar"))
        .and(query_param("baz", "qux"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "data": {}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = BackendConfig::new(mock_server.uri(), BackendKind::Generic)
        .unwrap()
        .url_query_string("foo=bar&baz=qux");
    let flags = connect(config).get_operational_flags().await.unwrap().unwrap();
    assert!(flags.is_empty());
}

/// Malformed plaintext flags fail the whole fetch
#[tokio::test]
async fn test_victoria_metrics_malformed_flags() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flags"))
        .respond_with(ResponseTemplate::new(200).set_body_string("-a=\"1\"\nnot a flag\n"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let connector = connect(
        BackendConfig::new(mock_server.uri(), BackendKind::VictoriaMetrics { api_token: None })
            .unwrap(),
    );
    let err = connector.get_operational_flags().await.unwrap_err();

    match err {
        ConnectorError::FlagsUnavailable { service, url, source } => {
            assert_eq!(service, FlagsService::VictoriaMetrics);
            assert_eq!(url, mock_server.uri());
            assert!(matches!(*source, ConnectorError::FlagsParse(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// HTTP failures name the Prometheus service
#[tokio::test]
async fn test_prometheus_flags_http_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/status/flags"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let connector = connect(BackendConfig::new(mock_server.uri(), BackendKind::Generic).unwrap());
    let err = connector.get_operational_flags().await.unwrap_err();

    assert!(err.to_string().contains("Prometheus"));
    match err {
        ConnectorError::FlagsUnavailable { service, source, .. } => {
            assert_eq!(service, FlagsService::Prometheus);
            assert!(matches!(*source, ConnectorError::Request { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn azure_config(prometheus: &MockServer, identity: &MockServer) -> BackendConfig {
    BackendConfig::new(
        prometheus.uri(),
        BackendKind::Azure(AzureSettings {
            resource: "https://prometheus.monitor.azure.com".to_string(),
            token_endpoint: format!("{}/tenant/oauth2/token", identity.uri()),
            client_id: Some("client-id".to_string()),
            client_secret: Some(SecretString::from("client-secret".to_string())),
            ..Default::default()
        }),
    )
    .unwrap()
}

/// 401, refresh, 200: flags are fetched with the new token
#[tokio::test]
async fn test_flags_retry_once_after_refresh() {
    let prometheus = MockServer::start().await;
    let identity = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/status/flags"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .expect(1)
        .mount(&prometheus)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/status/flags"))
        .and(header("Authorization", "Bearer fresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "data": { "query.timeout": "2m" }
        })))
        .expect(1)
        .mount(&prometheus)
        .await;

    Mock::given(method("POST"))
        .and(path("/tenant/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "fresh-token"
        })))
        .expect(1)
        .mount(&identity)
        .await;

    let connector = ConnectorFactory::new(Arc::new(AuthorizationProvider::new(true)))
        .connect(azure_config(&prometheus, &identity))
        .unwrap();

    let flags = connector.get_operational_flags().await.unwrap().unwrap();
    assert_eq!(flags.get("query.timeout").unwrap(), "2m");
}

/// 401, refresh, 401: flags are unavailable after one retry
#[tokio::test]
async fn test_flags_give_up_after_one_retry() {
    let prometheus = MockServer::start().await;
    let identity = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/status/flags"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&prometheus)
        .await;

    Mock::given(method("POST"))
        .and(path("/tenant/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "still-rejected"
        })))
        .expect(1)
        .mount(&identity)
        .await;

    let connector = ConnectorFactory::new(Arc::new(AuthorizationProvider::new(true)))
        .connect(azure_config(&prometheus, &identity))
        .unwrap();

    let err = connector.get_operational_flags().await.unwrap_err();
    match err {
        ConnectorError::FlagsUnavailable { service, source, .. } => {
            assert_eq!(service, FlagsService::Prometheus);
            match *source {
                ConnectorError::Request { source, .. } => assert_eq!(source.status(), Some(401)),
                other => panic!("unexpected source: {other}"),
            }
        }
        other => panic!("unexpected error: {other}"),
    }
}
