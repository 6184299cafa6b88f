use rom_gateway::app::{Services, router};
use rom_gateway::config::AppConfig;
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        // .with_max_level(tracing::Level::DEBUG)
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        eprintln!("Usage: {} [--bind <addr:port>] [--library <dir>]", args[0]);
        eprintln!("Example: {} --bind 0.0.0.0:3000 --library /srv/LibraryNes", args[0]);
        std::process::exit(0);
    }

    let mut config = AppConfig::from_env()?;
    config.apply_args(&args)?;

    // 1. Shared services (window table, resolver, cascades):
    let services = Services::from_config(&config)?;
    tracing::info!("Library root: {}", services.resolver.root().display());
    tracing::info!("Library shards: {:?}", services.resolver.shards());
    tracing::info!(
        "Admission: {} requests per {}s",
        config.limits.max_requests,
        config.limits.window.as_secs()
    );

    // 2. HTTP Router:
    let app = router(&services);

    // 3. Start HTTP server:
    tracing::info!("HTTP server listening on {}", config.bind);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
