use std::process::ExitCode;
use std::sync::Arc;

use scrape_registry::config::Settings;
use scrape_registry::engine::{EngineLauncher, ShellLauncher};
use scrape_registry::network::HttpReloader;
use scrape_registry::ops::telemetry;
use scrape_registry::persistence::FileConfigStore;
use scrape_registry::server::{start_server, RegistrationService};

#[tokio::main]
async fn main() -> ExitCode {
    // * Initialize Telemetry
    telemetry::init_tracing_with_level("scrape_registry=debug,info");

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let reloader = match HttpReloader::new(settings.engine_addr.clone(), settings.reload_timeout) {
        Ok(reloader) => reloader,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build reload client");
            return ExitCode::FAILURE;
        }
    };

    // * Composition root: the registry lives inside the service for the process lifetime
    let service = Arc::new(RegistrationService::new(
        Arc::new(FileConfigStore::new(settings.config_path.clone())),
        Arc::new(reloader),
        settings.scrape_interval.clone(),
    ));

    let server = match start_server(settings.listen_addr, service) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(addr = %settings.listen_addr, error = %e, "Failed to bind registration server");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        listen = %server.local_addr(),
        engine = %settings.engine_addr,
        config_path = %settings.config_path.display(),
        "Scrape registry initialized"
    );

    let Some(command) = settings.engine_command.clone() else {
        // * Engine supervised elsewhere; serve until the server stops
        return match server.wait().await {
            Ok(()) => ExitCode::SUCCESS,
            Err(_) => ExitCode::FAILURE,
        };
    };

    let launcher = ShellLauncher::new(command);
    let code = tokio::select! {
        launched = launcher.launch() => match launched {
            Ok(()) => {
                tracing::info!("Engine exited, shutting down");
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!(error = %e, "Engine failed");
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, shutting down");
            ExitCode::SUCCESS
        }
    };

    if let Err(e) = server.shutdown().await {
        tracing::warn!(error = %e, "Registration server did not stop cleanly");
    }
    code
}
