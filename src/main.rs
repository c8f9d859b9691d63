use axum::routing::{get, post};
use axum::Router;
use flexipay::circuit::breaker::BreakerConfig;
use flexipay::circuit::registry::BreakerRegistry;
use flexipay::config::AppConfig;
use flexipay::engine::fallback::FallbackEngine;
use flexipay::processors::{catalog, Processor};
use flexipay::stats::StatsService;
use flexipay::AppState;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env();

    let processors: Vec<Arc<dyn Processor>> = vec![
        Arc::new(catalog::vortex_pay(None)),
        Arc::new(catalog::swift_pay(None)),
        Arc::new(catalog::pix_flow(None)),
    ];

    let breaker_config = BreakerConfig {
        window_size: cfg.cb_rolling_window_size,
        window_seconds: cfg.cb_rolling_window_seconds,
        trip_threshold: cfg.cb_trip_threshold,
        cooldown_seconds: cfg.cb_cooldown_seconds,
        min_samples: cfg.cb_min_samples,
    };
    let registry = Arc::new(BreakerRegistry::new(
        processors.iter().map(|p| p.name()),
        breaker_config,
    ));
    let stats = Arc::new(StatsService::new());
    let engine = Arc::new(FallbackEngine::new(
        processors.clone(),
        registry.clone(),
        stats.clone(),
        &cfg,
    ));

    tracing::info!(
        processors = ?processors.iter().map(|p| p.name()).collect::<Vec<_>>(),
        window_size = cfg.cb_rolling_window_size,
        window_seconds = cfg.cb_rolling_window_seconds,
        trip_threshold = cfg.cb_trip_threshold,
        cooldown_seconds = cfg.cb_cooldown_seconds,
        "fallback engine starting"
    );

    let state = AppState {
        engine,
        registry,
        stats,
        processors,
    };

    let app = Router::new()
        .route("/", get(flexipay::http::handlers::transactions::root))
        .route(
            "/transactions",
            post(flexipay::http::handlers::transactions::create_transaction),
        )
        .route(
            "/processors/status",
            get(flexipay::http::handlers::processors::status),
        )
        .route(
            "/processors/:name/reset",
            post(flexipay::http::handlers::processors::reset),
        )
        .route(
            "/processors/:name/inject-failures",
            post(flexipay::http::handlers::processors::inject_failures),
        )
        .route("/stats", get(flexipay::http::handlers::stats::get_stats))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
