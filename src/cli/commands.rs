use crate::default_router;
use crate::error::RouteError;
use crate::logging::{init_logging, LogConfig};
use crate::runtime_config::ServerConfig;
use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line interface for the pathmux demo server
#[derive(Parser, Debug)]
#[command(name = "pathmux", version)]
#[command(about = "First-match regex HTTP router demo", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Serve the demo routes
    Serve {
        /// Address and port to bind the server to
        #[arg(long, env = "PATHMUX_ADDR")]
        addr: Option<String>,

        /// YAML server configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the demo routing table
    Routes,
}

/// The demo handler: greets whatever the path captured.
#[must_use]
pub fn hello(val: String) -> String {
    format!("hello {val}")
}

/// Register the demo routes on the default router.
///
/// # Errors
///
/// Fails if a demo pattern does not compile.
pub fn demo_routes() -> Result<(), RouteError> {
    default_router::get("/(.*)", hello)
}

/// Parse the process arguments and run the selected command.
///
/// # Errors
///
/// See [`run`].
pub fn run_cli() -> Result<()> {
    run(Cli::parse())
}

/// Run an already parsed command line.
///
/// # Errors
///
/// Fails when logging cannot be initialised, the configuration cannot be
/// loaded, or the server cannot be started.
pub fn run(cli: Cli) -> Result<()> {
    init_logging(&LogConfig::from_env())?;
    demo_routes().context("Failed to register demo routes")?;

    match cli.command {
        Commands::Serve { addr, config } => {
            let mut server_config = match config {
                Some(path) => ServerConfig::load(&path)?,
                None => ServerConfig::from_env(),
            };
            if let Some(addr) = addr {
                server_config.addr = addr;
            }
            default_router::run_with_config(server_config)
        }
        Commands::Routes => {
            for route in default_router::snapshot().routes() {
                println!("{:<7} {}  {:?}", route.method().as_str(), route.pattern(), route.handler());
            }
            Ok(())
        }
    }
}
