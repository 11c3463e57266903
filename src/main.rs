//! appcheck-routes binary: attest, exchange, compute one route, print it.

use std::process::ExitCode;

use appcheck_routes::client::{REFERENCE_DESTINATION, REFERENCE_ORIGIN};
use appcheck_routes::config::{self, split_list};
use appcheck_routes::{LatLng, RoutesDemo, TravelMode};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "appcheck-routes", version, about = "Compute a route with an App Check attested token")]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, env = "APPCHECK_ROUTES_CONFIG", default_value = "appcheck-routes.toml")]
    config: String,

    /// Origin as LAT,LNG
    #[arg(long, allow_hyphen_values = true)]
    origin: Option<LatLng>,

    /// Destination as LAT,LNG
    #[arg(long, allow_hyphen_values = true)]
    destination: Option<LatLng>,

    /// Travel mode (DRIVE, BICYCLE, WALK, TWO_WHEELER, TRANSIT)
    #[arg(long, default_value = "DRIVE")]
    mode: TravelMode,

    /// Comma-separated APIs to request a token for
    #[arg(long)]
    apis: Option<String>,

    /// Emit JSON logs
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(logging: &config::LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match config::load_config(Some(&cli.config)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if cli.log_json {
        config.logging.json = true;
    }
    if let Some(apis) = &cli.apis {
        config.backend.apis = split_list(apis);
    }

    init_tracing(&config.logging);

    let demo = match RoutesDemo::from_config(&config) {
        Ok(demo) => demo,
        Err(e) => {
            tracing::error!(error = %e, stage = ?e.stage(), "startup failed");
            return ExitCode::FAILURE;
        }
    };

    let origin = cli.origin.unwrap_or(REFERENCE_ORIGIN);
    let destination = cli.destination.unwrap_or(REFERENCE_DESTINATION);

    match demo.run(origin, destination, cli.mode).await {
        Ok(outcome) => match serde_json::to_string_pretty(&outcome.response) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to render response");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            tracing::error!(error = %e, stage = ?e.stage(), "route request failed");
            ExitCode::FAILURE
        }
    }
}
