//! DL Kernel - companion process spawned by the host to run deep learning
//! network types. Speaks line-delimited JSON on stdin/stdout.

use std::env;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dl_kernel::{
    run_command_loop, Config, HostGateway, KernelContext, NetworkTypeRegistry, StdioTransport,
    Workspace,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_version() {
    println!("dl-kernel {}", VERSION);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle --version / -V
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--version" || a == "-V") {
        print_version();
        return Ok(());
    }

    // Load configuration
    let config = Config::load().map_err(|e| {
        format!(
            "Failed to load configuration: {}. \
             Check dl-kernel.toml and DLKERNEL__* environment variables.",
            e
        )
    })?;

    // Initialize tracing. stdout carries the host protocol, so logs go to stderr.
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting dl-kernel: {}", config.kernel.name);

    // Create network type registry
    let registry = Arc::new(NetworkTypeRegistry::with_policy(
        config.registry.prefix_policy,
    ));
    tracing::info!("Network type prefix policy: {:?}", registry.policy());

    // Wire the transport to the host
    let transport = Arc::new(StdioTransport::stdout());
    let (command_tx, command_rx) = mpsc::channel(32);
    let reader_handle = transport.spawn_reader(tokio::io::stdin(), command_tx);

    let gateway = Arc::new(
        HostGateway::new(Arc::new(Workspace::new()), transport)
            .with_request_timeout(config.gateway.request_timeout()),
    );
    if let Some(limit) = gateway.request_timeout() {
        tracing::info!("Data requests time out after {:?}", limit);
    }

    let ctx = Arc::new(KernelContext::new(config, registry, gateway));
    ctx.register_declared_network_types().await?;
    ctx.announce_ready().await?;
    tracing::info!("Kernel ready, waiting for host commands");

    run_command_loop(ctx, command_rx).await?;

    reader_handle.abort();
    tracing::info!("dl-kernel stopped");
    Ok(())
}
