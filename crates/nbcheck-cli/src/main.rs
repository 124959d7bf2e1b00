//! nbcheck CLI - verify and scrub notebook execution artifacts.

mod check;
mod clear;
mod colors;
mod run;
mod walk;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "nbcheck")]
#[command(about = "Verify and scrub notebook execution artifacts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run notebooks against a kernel and check each cell for errors
    Run {
        /// Notebook files to run
        #[arg(required = true)]
        notebooks: Vec<PathBuf>,

        /// Kernel executable (default: $NBCHECK_KERNEL, then PATH)
        #[arg(long)]
        kernel: Option<PathBuf>,

        /// Per-cell reply timeout in seconds
        #[arg(long, default_value_t = nbcheck_core::DEFAULT_CELL_TIMEOUT.as_secs())]
        timeout: u64,
    },

    /// Clear outputs and prompt numbers, saving over each notebook
    Clear {
        /// Notebook files to clear
        #[arg(required = true)]
        notebooks: Vec<PathBuf>,
    },

    /// Exit with 1 if any notebook has outputs or prompt numbers
    Check {
        /// Notebook files to check
        #[arg(required = true)]
        notebooks: Vec<PathBuf>,
    },

    /// Clear outputs in every .ipynb file under a directory
    ClearAll {
        /// Directory from which to search
        searchpath: PathBuf,
    },

    /// Exit with 1 if any .ipynb file under a directory has outputs
    CheckAll {
        /// Directory from which to search
        searchpath: PathBuf,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging; stdout stays free for data.
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let clean = match cli.command {
        Commands::Run {
            notebooks,
            kernel,
            timeout,
        } => run::execute(&notebooks, kernel.as_deref(), timeout)?,

        Commands::Clear { notebooks } => clear::execute(&notebooks)?,

        Commands::Check { notebooks } => check::execute(&notebooks)?,

        Commands::ClearAll { searchpath } => clear::execute(&walk::find_notebooks(&searchpath)?)?,

        Commands::CheckAll { searchpath } => check::execute(&walk::find_notebooks(&searchpath)?)?,
    };

    Ok(if clean {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
