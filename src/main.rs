//! herakles-sysstats - version 0.1.0
//!
//! Host statistics service with per-process CPU/memory usage sampling.
//! This is the main entry point that initializes the server and handles subcommands.

mod cli;
mod commands;
mod config;
mod handlers;
mod startup_checks;
mod state;
mod telemetry;

use axum::{routing::get, Router};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{net::TcpListener, signal, sync::watch};
use tracing::level_filters::LevelFilter;
use tracing::{error, info, warn};

use cli::{Args, Commands};
use commands::{command_check, command_config, command_sample};
use config::{
    resolve_config, show_config, validate_effective_config, Config, DEFAULT_BIND_ADDR,
    DEFAULT_PORT,
};
use handlers::{
    config_handler, cpu_info_handler, cpu_usage_info_handler, disk_info_handler, health_handler,
    io_analysis_handler, load_avg_handler, memory_info_handler, metrics_handler,
    network_info_handler, os_info_handler, process_info_handler, processes_handler, root_handler,
};
use state::{build_sampler, AppState};

/// Initializes tracing logging subsystem with configured log level.
fn setup_logging(config: &Config) {
    let log_level = match config
        .log_level
        .as_deref()
        .unwrap_or("info")
        .to_ascii_lowercase()
        .as_str()
    {
        "off" => LevelFilter::OFF,
        "error" => LevelFilter::ERROR,
        "warn" => LevelFilter::WARN,
        "debug" => LevelFilter::DEBUG,
        "trace" => LevelFilter::TRACE,
        _ => LevelFilter::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return;
    }

    info!("Logging initialized with level: {}", log_level);
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Resolves once SIGINT or SIGTERM arrives, then flips the shutdown channel.
async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }

    // Abort sampling passes still waiting between snapshots
    shutdown_tx.send_replace(true);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;
        if args.check_config {
            match validate_effective_config(&config) {
                Ok(_) => {
                    println!("✅ Configuration is valid");
                    return Ok(());
                }
                Err(e) => {
                    eprintln!("❌ Configuration invalid: {}", e);
                    std::process::exit(1);
                }
            }
        }
        return show_config(&config, args.config_format, false);
    }

    if let Some(command) = &args.command {
        let config = load_validated_config(&args)?;
        setup_logging(&config);

        return match command {
            Commands::Check { proc, sample, all } => {
                command_check(*proc, *sample, *all, &config).await
            }
            Commands::Config {
                output,
                format,
                commented,
            } => command_config(output.clone(), format.clone(), *commented),
            Commands::Sample {
                process,
                iterations,
                top,
                format,
            } => {
                command_sample(process.clone(), *iterations, *top, format.clone(), &config).await
            }
        };
    }

    // Load configuration for main server mode
    let config = load_validated_config(&args)?;
    setup_logging(&config);

    info!(
        "Starting herakles-sysstats {} (built {})",
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_BUILD_TIMESTAMP")
    );

    if config.test_data_file.is_none() {
        if let Err(e) = startup_checks::validate_requirements(&config.proc_root()) {
            error!("Startup validation failed: {}", e);
            return Err(e.into());
        }
    } else {
        warn!("Test data mode: process rows come from recorded snapshots");
    }

    let sampler = build_sampler(&config)?;
    let settings = *sampler.settings();
    info!(
        "Sampling interval {} ms, baseline policy {}, timeout {} ms",
        settings.interval.as_millis(),
        settings.baseline_policy,
        config.sample_timeout().as_millis()
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let state = Arc::new(AppState::new(config.clone(), sampler, shutdown_rx)?);

    // Configure HTTP server routes
    let bind_ip_str = config.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
    let port = config.port.unwrap_or(DEFAULT_PORT);
    let addr: SocketAddr = format!("{}:{}", bind_ip_str, port).parse()?;

    let mut app = Router::new()
        .route("/", get(root_handler))
        .route("/processes", get(processes_handler))
        .route("/process_info", get(process_info_handler))
        .route("/load_avg", get(load_avg_handler))
        .route("/memory_info", get(memory_info_handler))
        .route("/cpu_usage_info", get(cpu_usage_info_handler))
        .route("/cpu_info", get(cpu_info_handler))
        .route("/os_info", get(os_info_handler))
        .route("/network_info", get(network_info_handler))
        .route("/disk_info", get(disk_info_handler))
        .route("/io_analysis", get(io_analysis_handler))
        .route("/metrics", get(metrics_handler))
        .route("/config", get(config_handler));

    if config.enable_health.unwrap_or(true) {
        app = app.route("/health", get(health_handler));
    }

    let app = app.with_state(state);

    let listener = TcpListener::bind(addr).await?;
    info!(
        "herakles-sysstats listening on http://{}:{}",
        bind_ip_str, port
    );

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await
    {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    info!("herakles-sysstats stopped gracefully");
    Ok(())
}
