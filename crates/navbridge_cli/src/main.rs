//! navbridge CLI
//!
//! Command-line tools for native NavMesh modules.
//!
//! # Commands
//!
//! - `swap` - Replace an installed module, escalating as needed
//! - `resume` - Complete a swap left pending by an earlier run
//! - `status` - Show the pending swap, if any
//! - `discard` - Abandon the pending swap
//! - `fingerprint` - Print the SHA-256 of a module file
//! - `build` - Build a NavMesh from a JSON mesh with a native library
//! - `path` - Query a path on a saved NavMesh

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// navbridge native module and NavMesh tools.
#[derive(Parser)]
#[command(name = "navbridge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the swap state file
    #[arg(global = true, short, long, default_value = "navbridge-state.json")]
    store: PathBuf,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace an installed module with a new build
    Swap {
        /// The new module file
        source: PathBuf,

        /// The installed module file
        dest: PathBuf,
    },

    /// Complete a pending swap
    Resume {
        /// Only resume if the pending swap targets this file
        dest: Option<PathBuf>,
    },

    /// Show the pending swap
    Status {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Abandon the pending swap without copying
    Discard,

    /// Print the SHA-256 fingerprint of a file
    Fingerprint {
        /// File to fingerprint
        file: PathBuf,
    },

    /// Build a NavMesh from a JSON mesh file
    Build {
        #[command(flatten)]
        native: commands::NativeArgs,

        /// Mesh JSON: {"vertices": [[x,y,z], ...], "triangles": [[a,b,c], ...]}
        #[arg(short, long)]
        mesh: PathBuf,

        /// Build settings JSON; missing fields take defaults
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Where to write the NavMesh
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Find a path on a saved NavMesh
    Path {
        #[command(flatten)]
        native: commands::NativeArgs,

        /// NavMesh file written by `build`
        #[arg(short, long)]
        navmesh: PathBuf,

        /// Start point as x,y,z
        #[arg(long, allow_hyphen_values = true)]
        from: String,

        /// End point as x,y,z
        #[arg(long, allow_hyphen_values = true)]
        to: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Swap { source, dest } => {
            commands::swap::run(&cli.store, &source, &dest)?;
        }
        Commands::Resume { dest } => {
            commands::resume::run(&cli.store, dest.as_deref())?;
        }
        Commands::Status { format } => {
            commands::status::run(&cli.store, &format)?;
        }
        Commands::Discard => {
            commands::status::discard(&cli.store)?;
        }
        Commands::Fingerprint { file } => {
            commands::fingerprint::run(&file)?;
        }
        Commands::Build {
            native,
            mesh,
            settings,
            out,
        } => {
            commands::build::run(&native, &mesh, settings.as_deref(), &out)?;
        }
        Commands::Path {
            native,
            navmesh,
            from,
            to,
            format,
        } => {
            commands::path::run(&native, &navmesh, &from, &to, &format)?;
        }
        Commands::Version => {
            println!("navbridge CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("navbridge Core v{}", navbridge_core::VERSION);
        }
    }

    Ok(())
}
