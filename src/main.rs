//! geo-gate - Geolocation Request Gate
//!
//! This is the composition root that wires together all the components.

use geo_gate::adapters::inbound::GateServer;
use geo_gate::adapters::outbound::{HttpLocationResolver, MaxMindLocationResolver};
use geo_gate::application::GeoGateService;
use geo_gate::config::{load_config, load_policy};
use geo_gate::domain::policy::Policy;
use geo_gate::domain::ports::LocationResolver;
use geo_gate::domain::services::IpExtractor;
use geo_gate::infrastructure::{shutdown_signal, ShutdownController};
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;

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

    tracing::info!("starting geo-gate listen={}", cfg.listen_addr);

    // ===== COMPOSITION ROOT =====

    // 1. Location lookup (local database or remote service)
    let resolver: Arc<dyn LocationResolver> = match &cfg.geoip_path {
        Some(path) => {
            tracing::info!("using local GeoIP database {}", path);
            Arc::new(MaxMindLocationResolver::from_file(path)?)
        }
        None => {
            tracing::info!(
                "using lookup service {} (timeout {}ms)",
                cfg.lookup_url,
                cfg.lookup_timeout_ms
            );
            Arc::new(HttpLocationResolver::new(
                &cfg.lookup_url,
                cfg.lookup_timeout(),
            )?)
        }
    };

    // 2. Allow-list policy, validated once
    let policy = Policy::new(load_policy(&cfg)?)?;
    tracing::info!(
        "policy: countries={} cities={} coordinates={} geofences={}",
        policy.countries().len(),
        policy.cities().len(),
        policy.coordinates().len(),
        policy.geofences().len()
    );

    // 3. Client address extraction
    let sources: Vec<String> = cfg.ip_sources.iter().map(ToString::to_string).collect();
    tracing::info!("client address sources: {}", sources.join(","));
    let extractor = IpExtractor::new(cfg.ip_sources.clone());

    // 4. Application service
    let service = Arc::new(GeoGateService::new(extractor, resolver, Arc::new(policy)));

    // 5. Shutdown handling
    let shutdown = ShutdownController::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    // 6. Inbound adapter
    let server = GateServer::new(cfg.listen_addr.clone(), service);
    server.run(shutdown).await
}
