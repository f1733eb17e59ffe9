//! Root orchestrator (C10): wires the scenario loader into the engine, then
//! the engine into the multicast publisher and/or the Axum web surface,
//! selecting headless vs. interactive mode off the CLI.
//!
//! Mirrors `uwb-simulator::main`'s shape (`clap` CLI, config load, spawn the
//! tick loop, serve Axum) more closely than `backend-rust::main`'s — this
//! binary's job is "load one scenario, run one engine", not "host a
//! multi-tenant race".

mod control;
mod fanout;
mod multicast;
mod routes;

use std::process::ExitCode;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use fanout::Fanout;
use multicast::{MulticastCounters, MulticastPublisher};
use routes::{AppState, MulticastConfig};
use traffic_sim::engine::DEFAULT_TICK_PERIOD;
use traffic_sim::{Engine, RealClock};

#[derive(Parser, Debug)]
#[command(name = "trafficsim", about = "Multi-domain traffic simulation engine")]
struct Args {
    /// Scenario configuration file.
    #[arg(long, default_value = "data/config.yaml")]
    config: String,

    /// Serve the visualisation + control surface over HTTP/WebSocket.
    #[arg(long, conflicts_with = "headless")]
    web: bool,

    /// Run headless, printing periodic status to the log (default).
    #[arg(long, conflicts_with = "web")]
    headless: bool,

    /// Visualisation + control listener port. Only meaningful with `--web`.
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Enable the CoT multicast publisher.
    #[arg(long)]
    multicast: bool,

    /// Multicast group address.
    #[arg(long, default_value = multicast::DEFAULT_MULTICAST_ADDR)]
    multicast_addr: String,

    /// Multicast group port.
    #[arg(long, default_value_t = multicast::DEFAULT_MULTICAST_PORT)]
    multicast_port: u16,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "traffic_backend=info".into()),
        )
        .init();

    let args = Args::parse();

    let raw = match std::fs::read_to_string(&args.config) {
        Ok(raw) => raw,
        Err(err) => {
            error!(config = %args.config, error = %err, "failed to read scenario config");
            return ExitCode::from(1);
        }
    };

    let doc = match traffic_sim::scenario::parse(&args.config, &raw) {
        Ok(doc) => doc,
        Err(err) => {
            error!("{err}");
            return ExitCode::from(1);
        }
    };

    let errors = traffic_sim::scenario::validate(&args.config, &doc);
    if !errors.is_empty() {
        error!("{} has {} configuration error(s):", args.config, errors.len());
        for err in &errors {
            error!("  - {err}");
        }
        return ExitCode::from(1);
    }

    info!(
        config = %args.config,
        types = doc.platform_types.len(),
        platforms = doc.platforms.len(),
        "scenario loaded"
    );

    let engine = Engine::new(Arc::new(RealClock), DEFAULT_TICK_PERIOD);
    engine.load_scenario(doc).await;
    engine.start().await;

    let shutdown = CancellationToken::new();

    // Bind the multicast socket up front, before entering either run mode,
    // so a bind failure exits 2 without ever starting the web listener.
    let multicast_counters = if args.multicast {
        match MulticastPublisher::bind(&args.multicast_addr, args.multicast_port, multicast::DEFAULT_PUBLISH_PERIOD) {
            Ok(publisher) => {
                let counters = Arc::clone(&publisher.counters);
                let engine_for_publisher = Arc::clone(&engine);
                let cancel = shutdown.clone();
                tokio::spawn(async move {
                    publisher.run(engine_for_publisher, cancel).await;
                });
                Some(counters)
            }
            Err(err) => {
                error!(addr = %args.multicast_addr, port = args.multicast_port, error = %err, "failed to bind multicast socket");
                engine.stop().await;
                return ExitCode::from(2);
            }
        }
    } else {
        None
    };

    let result = if args.web {
        run_web_mode(
            Arc::clone(&engine),
            args.port,
            multicast_counters,
            args.multicast,
            &args.multicast_addr,
            args.multicast_port,
            shutdown.clone(),
        )
        .await
    } else {
        run_headless_mode(Arc::clone(&engine), shutdown.clone()).await
    };

    engine.stop().await;
    shutdown.cancel();
    info!("shutdown complete");

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

async fn run_headless_mode(engine: Arc<Engine>, shutdown: CancellationToken) -> Result<(), u8> {
    info!("running headless — ctrl-c to stop");
    let mut status_ticker = tokio::time::interval(Duration::from_secs(5));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                break;
            }
            _ = status_ticker.tick() => {
                let status = engine.status().await;
                info!(
                    running = status.running,
                    sim_time = status.sim_time,
                    platforms = status.platform_count,
                    time_scale = status.time_scale,
                    "status"
                );
            }
        }
    }

    shutdown.cancel();
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn run_web_mode(
    engine: Arc<Engine>,
    port: u16,
    multicast_counters: Option<Arc<MulticastCounters>>,
    multicast_enabled: bool,
    multicast_addr: &str,
    multicast_port: u16,
    shutdown: CancellationToken,
) -> Result<(), u8> {
    let fanout = Fanout::new();
    let tick_counter = Arc::new(AtomicU64::new(0));

    tokio::spawn(routes::run_tick_pump(Arc::clone(&engine), fanout.clone(), Arc::clone(&tick_counter)));
    tokio::spawn(routes::run_metrics_pump(Arc::clone(&engine), fanout.clone(), Arc::clone(&tick_counter)));

    let state = AppState {
        engine,
        fanout,
        multicast_counters,
        multicast_config: MulticastConfig {
            enabled: multicast_enabled,
            group: multicast_addr.to_string(),
            port: multicast_port,
        },
    };

    let app = routes::router(state).layer(tower_http::cors::CorsLayer::new().allow_origin(tower_http::cors::Any));

    let addr = format!("0.0.0.0:{port}");
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(addr = %addr, error = %err, "failed to bind visualisation/control listener");
            return Err(2);
        }
    };

    info!(addr = %addr, "serving visualisation + control surface");

    let shutdown_signal = {
        let shutdown = shutdown.clone();
        async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = shutdown.cancelled() => {}
            }
        }
    };

    if let Err(err) = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal).await {
        warn!(error = %err, "server exited with error");
    }

    shutdown.cancel();
    Ok(())
}
