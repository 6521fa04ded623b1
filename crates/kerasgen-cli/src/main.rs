//! kerasgen CLI - generate Keras model scripts and serve the generation API.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kerasgen_codegen::LiteralPolicy;
use kerasgen_ops::Config;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

mod commands;

/// kerasgen - turn JSON model descriptions into Keras scripts.
#[derive(Parser, Debug)]
#[command(
    name = "kg",
    author,
    version,
    about = "kerasgen: generate Keras model scripts from JSON descriptions",
    long_about = None
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API.
    Serve {
        /// Port to listen on (defaults to the configured port).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Generate a model script from a request file.
    ///
    /// The file holds `{"content": {...}, "config": {...}}`, the same body
    /// POST /generate accepts.
    Generate {
        /// Path to the request JSON.
        request: PathBuf,

        /// Write the script here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Literal formatting policy (legacy, strict, typed).
        #[arg(long)]
        policy: Option<LiteralPolicy>,
    },

    /// Inspect configuration.
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the resolved configuration.
    Show,

    /// Show the per-user config file path.
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let level = if cli.quiet {
        Level::ERROR
    } else if cli.verbose {
        Level::DEBUG
    } else if matches!(cli.command, Commands::Serve { .. }) {
        Level::INFO
    } else {
        Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load().context("Failed to load configuration")?;

    match cli.command {
        Commands::Serve { port } => {
            commands::serve::execute(config, port).await?;
        }

        Commands::Generate {
            request,
            output,
            policy,
        } => {
            commands::generate::execute(&config, &request, output.as_deref(), policy)?;
        }

        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show => commands::config::show(&config),
            ConfigCommands::Path => commands::config::path(),
        },
    }

    Ok(())
}
