mod config;
mod telemetry;

use clap::{Args, Parser, Subcommand};
use config::Config;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser)]
#[command(version, about = "Fetches SAP employee master data for RabbitMQ commands")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Consume the inbound queue until interrupted
    Run(ConfigArgs),
    /// Load and validate the config file, then exit
    Validate(ConfigArgs),
}

#[derive(Args)]
struct ConfigArgs {
    #[arg(long)]
    config_file_path: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        CliCommand::Run(args) => run(args),
        CliCommand::Validate(args) => match Config::load(&args.config_file_path) {
            Ok(_) => {
                println!("{} is valid", args.config_file_path.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{}: {e}", args.config_file_path.display());
                ExitCode::FAILURE
            }
        },
    }
}

fn run(args: ConfigArgs) -> ExitCode {
    let config = match Config::load(&args.config_file_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {e}", args.config_file_path.display());
            return ExitCode::FAILURE;
        }
    };

    // Sentry must be initialised before the runtime starts.
    let _sentry = match telemetry::init_logging(config.common.logging.as_ref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("could not initialise logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(metrics) = &config.common.metrics {
        if let Err(e) = telemetry::init_metrics(metrics) {
            error!(error = %e, "Metrics disabled");
        }
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "Could not start runtime");
            return ExitCode::FAILURE;
        }
    };

    info!("Starting employee-reads");
    match rt.block_on(sap_api::run(config.worker)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Worker stopped");
            ExitCode::FAILURE
        }
    }
}
