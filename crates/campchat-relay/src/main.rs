#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use campchat_contracts::StaticCatalog;
use campchat_relay::{RelayConfig, RelayState, build_router};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,campchat_relay=debug".into());
    let json = std::env::var("CAMPCHAT_LOG_FORMAT")
        .map(|value| value.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(true)
            .with_line_number(true)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Starting CampChat relay");

    let config = RelayConfig::load()?;
    if config.gateway_api_key.is_none() {
        tracing::warn!("CAMPCHAT_GATEWAY_API_KEY is not set; chat requests will fail until it is");
    }
    if config.client_tokens.is_empty() {
        tracing::info!("No client tokens configured; /chat accepts any caller");
    }

    let state = RelayState::new(&config, &StaticCatalog::default())?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        gateway = %config.gateway_url,
        model = %config.model,
        "CampChat relay listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("CampChat relay shutting down");
        })
        .await?;

    Ok(())
}
