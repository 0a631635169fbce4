//! prometheus-connector - backend connectivity probe
//!
//! Composition root: loads the backend from the environment, checks the
//! connection, prints operational flags and runs one query.

use prometheus_connector::adapters::outbound::AuthorizationProvider;
use prometheus_connector::application::ConnectorFactory;
use prometheus_connector::config::load_config;
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;

const VERSION_QUERY: &str = r#"count by (git_version, cluster, node) (label_replace(kubernetes_build_info{job!~"kube-dns|coredns"}, "git_version", "$1", "git_version", "(v[0-9]*.[0-9]*).*"))"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment
    let cfg = load_config()?;

    // Setup logging
    let log_level = if cfg.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    tracing::info!(
        "probing {} backend at {} (azure auth: {})",
        cfg.backend.kind().name(),
        cfg.backend.url(),
        cfg.azure.is_enabled()
    );

    // ===== COMPOSITION ROOT =====
    let authorizer = Arc::new(AuthorizationProvider::new(cfg.azure.is_enabled()));
    let factory = ConnectorFactory::new(authorizer);
    let connector = factory.connect(cfg.backend.clone())?;

    let timeout = cfg.request_timeout_secs.to_string();
    let params = [("timeout", timeout.as_str())];

    connector.check_connection(&params).await?;
    tracing::info!("connected to {}", connector.url());

    match connector.get_operational_flags().await {
        Ok(Some(flags)) => {
            let mut names: Vec<_> = flags.keys().collect();
            names.sort();
            tracing::info!("{} operational flags", flags.len());
            for name in names {
                tracing::debug!("{} = {}", name, flags[name]);
            }
        }
        Ok(None) => tracing::info!("backend exposes no flags endpoint"),
        Err(e) => tracing::warn!("{}", e),
    }

    let query = std::env::args()
        .nth(1)
        .unwrap_or_else(|| VERSION_QUERY.to_string());
    let samples = connector.query(&query, &params).await?;
    tracing::info!("query returned {} series", samples.len());
    for sample in &samples {
        let value = sample.value.as_ref().map(|p| p.value()).unwrap_or("-");
        println!("{:?} {}", sample.metric, value);
    }

    Ok(())
}
