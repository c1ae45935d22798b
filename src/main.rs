//! API gateway binary.
//!
//! Wires the subsystems together:
//!
//! ```text
//! gateway.toml ──► config ──► ApiDefinition list
//!                                │ Deploy events
//!                                ▼
//!   transport (axum) ──► Reactor ──► RoutingTable ──► ProxyHandler ──► upstream
//!                           │
//!                           └──► instrumentation chain ──► reporters
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use api_gateway::config;
use api_gateway::event::{ApiEvent, EventBus};
use api_gateway::handler::ProxyHandlerFactory;
use api_gateway::observability;
use api_gateway::report::{FanoutReporter, MetricsReporter, Reporter, TracingReporter};
use api_gateway::{GatewayServer, Reactor, Shutdown};

#[derive(Parser)]
#[command(name = "api-gateway", about = "API gateway request-dispatch reactor")]
struct Args {
    /// Path to the gateway configuration file.
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    observability::logging::init();

    let args = Args::parse();
    let config = config::load_config(&args.config)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        apis = config.apis.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let reporter: Arc<dyn Reporter> = Arc::new(FanoutReporter::new(vec![
        Arc::new(TracingReporter),
        Arc::new(MetricsReporter),
    ]));
    let reactor = Arc::new(Reactor::new(Arc::new(ProxyHandlerFactory::new()), reporter));

    // Subscribe before publishing so the startup deployments are not lost.
    let bus = EventBus::new(32);
    reactor.start(bus.subscribe());
    for api in &config.apis {
        bus.publish(ApiEvent::Deploy(api.clone()));
    }

    let shutdown = Shutdown::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown signal received");
                shutdown.trigger();
            }
        });
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = GatewayServer::new(&config, Arc::clone(&reactor), shutdown);
    server.run(listener).await?;

    reactor.stop().await;
    tracing::info!("Shutdown complete");
    Ok(())
}
