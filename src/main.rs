// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context, Result};
use clap::Parser;
use kube::Client;
use kubedns::{
    config::Config,
    constants::TOKIO_WORKER_THREADS,
    controller::{ClusterState, ControllerOptions, DnsController},
    handler::KubernetesHandler,
    listwatch::Sources,
    resolver::Resolver,
    server::{serve_health, serve_udp},
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tracing::{debug, error, info};

/// Authoritative DNS for Kubernetes services and pods.
#[derive(Debug, Parser)]
#[command(name = "kubedns", version, about)]
struct Cli {
    /// Path to the YAML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("kubedns")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cli))
}

fn init_logging() {
    // Respects RUST_LOG (default: info) and RUST_LOG_FORMAT (json|text)
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

/// Resolve on SIGINT, or SIGTERM on Unix.
async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result?,
            _ = terminate.recv() => {}
        }
    }
    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await?;
    Ok(())
}

async fn async_main(cli: Cli) -> Result<()> {
    init_logging();
    info!("Starting kubedns");

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_yaml("")?,
    };
    info!(
        zones = ?config.zones,
        multicluster_zones = ?config.multicluster_zones,
        pod_mode = ?config.pod_mode,
        "Configuration loaded"
    );

    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await?;
    debug!("Kubernetes client initialized successfully");

    let controller = Arc::new(DnsController::new(ControllerOptions::from(&config)));
    let sources = Sources::from_client(&client, &config);
    let controller_task = tokio::spawn(controller.clone().run(sources));

    let state: Arc<dyn ClusterState> = controller.clone();
    let handler = Arc::new(KubernetesHandler::new(Resolver::new(&config, state.clone())));

    let socket = UdpSocket::bind(config.listen)
        .await
        .with_context(|| format!("Failed to bind DNS listener on {}", config.listen))?;

    // Servers should never exit; a failure in either stops the process
    let outcome = tokio::select! {
        result = serve_udp(socket, handler) => {
            error!("CRITICAL: DNS server exited unexpectedly: {:?}", result);
            result
        }
        result = serve_health(config.health_listen, state) => {
            error!("CRITICAL: Health server exited unexpectedly: {:?}", result);
            result
        }
        signal = shutdown_signal() => {
            info!("Received shutdown signal");
            signal
        }
    };

    controller.stop()?;
    if let Err(e) = controller_task.await {
        error!("Controller task failed: {e}");
    }
    info!("kubedns stopped");
    outcome
}
