//! datastore-export - queue-backed document export service

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use datastore_export::{Config, ExportService, api, init_logging, run_with_shutdown};

/// Export documents from the secure data store into a local directory
#[derive(Debug, Parser)]
#[command(name = "datastore-export", version, about)]
struct Cli {
    /// TOML configuration file (defaults plus environment when omitted)
    #[arg(short, long, env = "EXPORT_SERVICE_CONFIG")]
    config: Option<PathBuf>,

    /// Disable the REST API and only run the request worker
    #[arg(long)]
    no_api: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is normal outside development
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let _logging = match init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "datastore-export exited with an error");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: Config) -> datastore_export::Result<()> {
    let config = Arc::new(config);
    let service = ExportService::new((*config).clone()).await?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        enabled = config.export.enabled,
        output_dir = %service.output_directory().display(),
        "datastore-export starting"
    );

    // Bind before anything is spawned so an unavailable address aborts startup
    let listener = if cli.no_api {
        None
    } else {
        Some(api::bind_api_listener(&config).await?)
    };

    let worker = service.start_request_worker();

    let api_server = listener.map(|listener| {
        let service = Arc::new(service.clone());
        let config = config.clone();
        tokio::spawn(async move { api::serve_api(listener, service, config).await })
    });

    run_with_shutdown(service).await?;

    if let Err(e) = worker.await {
        tracing::error!(error = %e, "Request worker task failed");
    }

    if let Some(api_server) = api_server {
        match api_server.await {
            Ok(result) => result?,
            Err(e) => tracing::error!(error = %e, "API server task failed"),
        }
    }

    Ok(())
}
