use facet::Facet;
use figue as args;
use squat_proxy::{ProxyConfig, Relay, router};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[derive(Facet, Debug)]
struct Cli {
    #[facet(flatten)]
    builtins: args::FigueBuiltins,
    /// Query the backend status once before accepting requests.
    #[facet(args::named, default)]
    probe: bool,
}

fn main() {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
        .block_on(async {
            if let Err(err) = run().await {
                eprintln!("{err}");
                std::process::exit(1);
            }
        });
}

async fn run() -> Result<(), String> {
    let cli = parse_cli()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ProxyConfig::from_env();
    let relay = Relay::new(config.clone());

    if cli.probe {
        probe_backend(relay.clone()).await;
    }

    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| format!("failed to bind HTTP on {}: {e}", config.listen_addr))?;
    info!(
        listen_addr = %config.listen_addr,
        backend_url = %config.backend_url,
        "squat-proxy ready"
    );

    axum::serve(listener, router(relay))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("HTTP server error: {e}"))
}

async fn probe_backend(relay: Relay) {
    let backend_url = relay.config().backend_url.clone();
    match tokio::task::spawn_blocking(move || relay.status()).await {
        Ok(Ok(body)) => info!(%backend_url, len = body.len(), "backend status probe succeeded"),
        Ok(Err(err)) => warn!(%backend_url, kind = err.kind(), %err, "backend status probe failed"),
        Err(err) => warn!(%backend_url, %err, "backend status probe join error"),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(%e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

fn parse_cli() -> Result<Cli, String> {
    let figue_config = args::builder::<Cli>()
        .map_err(|e| format!("failed to build CLI schema: {e}"))?
        .cli(|cli| cli.strict())
        .help(|h| {
            h.program_name("squat-proxy")
                .description("Relay between the squat detection front end and the pose backend")
                .version(option_env!("CARGO_PKG_VERSION").unwrap_or("dev"))
        })
        .build();
    let cli = args::Driver::new(figue_config)
        .run()
        .into_result()
        .map_err(|e| e.to_string())?;
    Ok(cli.value)
}
