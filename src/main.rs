use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::process::ExitCode;
use std::str::FromStr;

use orbstate::catalog::SatelliteGroup;
use orbstate::config::Config;
use orbstate::service::OrbitalStateService;

#[derive(Parser)]
#[command(name = "orbstate")]
#[command(about = "Satellite positions and predictions from catalog element sets")]
struct Cli {
    /// YAML configuration file; built-in defaults when omitted
    #[arg(long, global = true)]
    config: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Serve,
    /// Print positions of one or more satellites
    Positions {
        #[arg(required = true)]
        ids: Vec<String>,
        /// Instant to propagate to (RFC3339)
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// List element sets of a named group
    Group {
        name: String,
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
    /// Predict the ground track and next pass of a satellite
    Predict {
        id: String,
        #[arg(long)]
        hours: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path),
        None => Config::from_yaml(""),
    };
    let config = match config {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Commands::Serve = cli.command {
        return match orbstate::web::run_server(config).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Server error: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    let service = match OrbitalStateService::from_config(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Serve => ExitCode::SUCCESS,
        Commands::Positions { ids, at } => {
            let batch = match at {
                Some(at) => service.positions_at(&ids, at).await,
                None => service.current_positions(&ids).await,
            };
            let code = if batch.positions.is_empty() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
            print_json(&batch).unwrap_or(code)
        }
        Commands::Group { name, limit } => match SatelliteGroup::from_str(&name) {
            Ok(group) => print_json(&service.group_listing(group, limit).await)
                .unwrap_or(ExitCode::SUCCESS),
            Err(_) => {
                eprintln!("Unknown group: {}", name);
                ExitCode::FAILURE
            }
        },
        Commands::Predict { id, hours } => {
            let hours = hours.unwrap_or(config.prediction.default_hours);
            match service.predict(&id, hours).await {
                Ok(prediction) => print_json(&prediction).unwrap_or(ExitCode::SUCCESS),
                Err(e) => {
                    eprintln!("Prediction failed: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}

/// Pretty-prints `value` to stdout. Returns an exit code only on failure.
fn print_json<T: Serialize>(value: &T) -> Option<ExitCode> {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            None
        }
        Err(e) => {
            eprintln!("Serialization error: {}", e);
            Some(ExitCode::FAILURE)
        }
    }
}
