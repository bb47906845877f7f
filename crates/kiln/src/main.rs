mod cli;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::LevelFilter;

/// Kiln: plugin discovery and registration for server hosts
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Print "pong" and exit
    #[arg(long)]
    ping: bool,

    /// Log level (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long, value_name = "LEVEL", global = true)]
    log_level: Option<LevelFilter>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the greeter plugin on an in-memory host, drive it, then stop it
    Run {
        /// Configuration file (.json, .yaml or .toml)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Command line to dispatch once the plugin is active, e.g. "greet alex 2"
        #[arg(long = "invoke", value_name = "LINE")]
        invoke: Vec<String>,

        /// Event to publish, as NAME or NAME:key=value,...
        #[arg(long = "emit", value_name = "EVENT")]
        emit: Vec<String>,

        /// Dispatch as this player instead of the console
        #[arg(long = "as", value_name = "PLAYER")]
        player: Option<String>,

        /// Permission granted to the player given with --as
        #[arg(long = "grant", value_name = "PERMISSION", requires = "player")]
        grant: Vec<String>,
    },
    /// List the capabilities the greeter plugin declares
    Scan,
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if let Some(level) = args.log_level {
        logger.filter_level(level);
    }
    logger.init();

    if args.ping {
        println!("pong");
        return ExitCode::SUCCESS;
    }

    let result = match args.command {
        Some(Commands::Run {
            config,
            invoke,
            emit,
            player,
            grant,
        }) => cli::run(&cli::RunOptions {
            config,
            invoke,
            emit,
            player,
            grant,
        }),
        Some(Commands::Scan) => cli::scan(),
        None => cli::run(&cli::RunOptions::default()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
