use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use callback_inspector::config::{load_config, validate_config, InspectorConfig};
use callback_inspector::observability::init_logging;
use callback_inspector::{InspectorServer, Shutdown, StdoutSink};

#[derive(Parser)]
#[command(name = "callback-inspector")]
#[command(about = "Accepts any HTTP request and logs it as JSON", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, overrides the config file.
    #[arg(short, long)]
    bind: Option<String>,

    /// Log level for diagnostics, overrides the config file.
    #[arg(long)]
    log_level: Option<String>,
}

fn resolve_config(cli: &Cli) -> Result<InspectorConfig, String> {
    let mut config = match &cli.config {
        Some(path) => load_config(path).map_err(|e| e.to_string())?,
        None => InspectorConfig::default(),
    };

    if let Some(bind) = &cli.bind {
        config.listener.bind_address = bind.clone();
    }
    if let Some(level) = &cli.log_level {
        config.observability.log_level = level.clone();
    }

    validate_config(&config).map_err(|errors| {
        errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    })?;
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.observability.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_memory_bytes = config.capture.max_memory_bytes,
        include_query = config.capture.include_query,
        "Configuration loaded"
    );

    let listener = match TcpListener::bind(&config.listener.bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            println!("Server error: {}", e);
            tracing::error!(address = %config.listener.bind_address, error = %e, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    println!("Server started on http://{}", config.listener.bind_address);

    let server = InspectorServer::new(config, Arc::new(StdoutSink));
    if let Err(e) = server.run(listener, shutdown.subscribe()).await {
        println!("Server error: {}", e);
        tracing::error!(error = %e, "Server terminated");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
