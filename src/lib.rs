pub mod access;
pub mod api;
pub mod config;
pub mod db;
pub mod entities;
pub mod ledger;
pub mod scheduler;
pub mod services;

use std::sync::Arc;
use tokio::signal;

pub use config::Config;
use db::Store;
use scheduler::Scheduler;
use services::SweepService;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    match args[1].as_str() {
        "daemon" | "-d" | "--daemon" => run_daemon(config).await,

        "sweep" | "-s" | "--sweep" => run_single_sweep(config).await,

        "init" | "--init" => {
            Config::create_default_if_missing()?;
            println!("✓ Config file created. Edit config.toml and run again.");
            Ok(())
        }

        "help" | "-h" | "--help" => {
            print_help();
            Ok(())
        }

        _ => {
            println!("Unknown command: {}", args[1]);
            println!();
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!("Timewarden - Household Screen-Time Tracker");
    println!("Parents manage daily screen-time allowances for their children");
    println!();
    println!("USAGE:");
    println!("  timewarden <COMMAND>");
    println!();
    println!("COMMANDS:");
    println!("  daemon   Run the API server with the automatic reset scheduler");
    println!("  sweep    Run a single reset sweep and exit");
    println!("  init     Create default config file");
    println!("  help     Show this help message");
    println!();
    println!("CONFIG:");
    println!("  Edit config.toml to configure the database, server port, and scheduler.");
}

async fn run_daemon(config: Config) -> anyhow::Result<()> {
    info!(
        "Timewarden v{} starting in daemon mode...",
        env!("CARGO_PKG_VERSION")
    );

    let port = config.server.port;
    let scheduler_config = config.scheduler.clone();

    let api_state = api::create_app_state(config).await?;

    let scheduler = Arc::new(Scheduler::new(api_state.sweep.clone(), scheduler_config));
    let scheduler_handle = {
        let scheduler = Arc::clone(&scheduler);
        tokio::spawn(async move {
            if let Err(e) = scheduler.start().await {
                error!("Scheduler error: {}", e);
            }
        })
    };

    let app = api::router(Arc::clone(&api_state)).await;
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let server_handle = tokio::spawn(async move {
        info!("API server running at http://0.0.0.0:{}", port);
        if let Err(e) = axum::serve(listener, app).await {
            error!("Server error: {}", e);
        }
    });

    info!("Daemon running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            error!("Error listening for shutdown: {}", e);
        }
    }

    scheduler.stop().await;
    scheduler_handle.abort();
    server_handle.abort();
    info!("Daemon stopped");

    Ok(())
}

async fn run_single_sweep(config: Config) -> anyhow::Result<()> {
    info!("Running single reset sweep...");

    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let sweep = SweepService::new(store, config.scheduler.reset_after_hours);
    let scheduler = Scheduler::new(sweep, config.scheduler);

    let count = scheduler.run_once().await?;

    println!("Sweep complete: {} children reset", count);
    Ok(())
}
