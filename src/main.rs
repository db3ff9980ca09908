mod cli;
mod config;
mod output;

use std::fs;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use model_pricing::Service;
use model_pricing::error::AppError;

use cli::{Cli, Commands};
use config::Config;
use output::{cost_json, print_cost_table, print_resolve_table, resolve_json};

/// Logs go to stderr so JSON on stdout stays machine-readable
fn init_tracing(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "warn" }));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn build_service(cli: &Cli) -> Result<Service, AppError> {
    if let Some(path) = &cli.pricing_file {
        let data = fs::read(path).map_err(|source| AppError::PricingFile {
            path: path.clone(),
            source,
        })?;
        return Ok(Service::from_bytes(&data)?);
    }
    // refresh fetches once itself; startup stays local
    if matches!(cli.command, Commands::Refresh) {
        return Ok(Service::load_local(cli.pricing_options()));
    }
    Ok(Service::load(cli.pricing_options()))
}

fn run(cli: &Cli) -> Result<(), AppError> {
    let service = build_service(cli)?;

    match &cli.command {
        Commands::Cost { model, usage } => {
            let usage = usage.to_snapshot();
            let cost = service.calculate_cost(model, &usage);
            if cli.json {
                println!("{}", cost_json(model, &usage, &cost));
            } else {
                print_cost_table(model, &usage, &cost);
            }
        }
        Commands::Resolve { model } => {
            let table = service.table();
            let resolved = table.resolve(model);
            if cli.json {
                println!("{}", resolve_json(model, resolved));
            } else {
                print_resolve_table(model, resolved);
            }
        }
        Commands::Refresh => {
            let models = service.refresh_now()?;
            if cli.json {
                println!("{}", serde_json::json!({ "models": models }));
            } else {
                println!("Fetched pricing for {models} models");
            }
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let config = Config::load();
    let cli = cli.with_config(&config);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
